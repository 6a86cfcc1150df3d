//! Net income minus expenses, compared month by month across years and
//! year by year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::{
    error::StatsError,
    money::{RateCache, RateTable},
    operation::{OpType, Operation},
    stats::Reducer,
};

/// Signed amount of an income or expense in the master currency, `None` for
/// operations that move money between accounts.
fn net_amount(
    rates: &mut RateCache,
    master: &str,
    op: &Operation,
) -> Result<Option<(NaiveDate, f64)>, StatsError> {
    if !matches!(op.op_type(), OpType::Income | OpType::Expense) {
        return Ok(None);
    }

    match (op.date(), op.currency()) {
        (Some(date), Some(currency)) => {
            let amount = rates.convert(date, op.amount(), currency, master)?;
            Ok(Some((date, amount)))
        }
        _ => Ok(None),
    }
}

/// `month -> year -> amount`.
pub struct MonthlyComparison<'a> {
    master: String,
    rates: RateCache<'a>,
    months: BTreeMap<u32, BTreeMap<i32, f64>>,
}

impl<'a> MonthlyComparison<'a> {
    pub fn new<T: Into<String>>(master: T, rates: &'a dyn RateTable) -> Self {
        Self {
            master: master.into(),
            rates: RateCache::new(rates),
            months: BTreeMap::new(),
        }
    }

    pub fn months(&self) -> &BTreeMap<u32, BTreeMap<i32, f64>> {
        &self.months
    }

    pub fn get(&self, month: u32, year: i32) -> Option<f64> {
        self.months.get(&month).and_then(|years| years.get(&year)).copied()
    }
}

impl Reducer for MonthlyComparison<'_> {
    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        if let Some((date, amount)) = net_amount(&mut self.rates, &self.master, op)? {
            *self
                .months
                .entry(date.month())
                .or_default()
                .entry(date.year())
                .or_default() += amount;
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        trace!(months = self.months.len(), "monthly comparison ready");
        Ok(())
    }
}

/// `year -> amount`.
pub struct YearlyComparison<'a> {
    master: String,
    rates: RateCache<'a>,
    years: BTreeMap<i32, f64>,
}

impl<'a> YearlyComparison<'a> {
    pub fn new<T: Into<String>>(master: T, rates: &'a dyn RateTable) -> Self {
        Self {
            master: master.into(),
            rates: RateCache::new(rates),
            years: BTreeMap::new(),
        }
    }

    pub fn years(&self) -> &BTreeMap<i32, f64> {
        &self.years
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.years.get(&year).copied()
    }
}

impl Reducer for YearlyComparison<'_> {
    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        if let Some((date, amount)) = net_amount(&mut self.rates, &self.master, op)? {
            *self.years.entry(date.year()).or_default() += amount;
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        trace!(years = self.years.len(), "yearly comparison ready");
        Ok(())
    }
}
