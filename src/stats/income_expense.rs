use tracing::trace;

use crate::{
    error::StatsError,
    interval::Intervals,
    money::{RateCache, RateTable},
    operation::Operation,
    stats::{BucketedSeries, Reducer},
};

/// Income and expense totals, converted into the master currency at each
/// operation's date.
pub struct IncomeExpenseReducer<'a> {
    master: String,
    rates: RateCache<'a>,
    income: BucketedSeries,
    expense: BucketedSeries,
}

impl<'a> IncomeExpenseReducer<'a> {
    pub fn new<T: Into<String>>(master: T, rates: &'a dyn RateTable) -> Self {
        Self {
            master: master.into(),
            rates: RateCache::new(rates),
            income: BucketedSeries::new(),
            expense: BucketedSeries::new(),
        }
    }

    pub fn income(&self) -> &BucketedSeries {
        &self.income
    }

    pub fn expense(&self) -> &BucketedSeries {
        &self.expense
    }
}

impl Reducer for IncomeExpenseReducer<'_> {
    fn new_day(&mut self, intervals: &Intervals) -> Result<(), StatsError> {
        self.income.new_day(intervals);
        self.expense.new_day(intervals);
        Ok(())
    }

    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        let series = match op {
            Operation::Income(_) => &mut self.income,
            Operation::Expense(_) => &mut self.expense,
            _ => return Ok(()),
        };

        if let (Some(date), Some(currency)) = (op.date(), op.currency()) {
            let amount = self.rates.convert(date, op.amount(), currency, &self.master)?;
            series.add(amount);
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        trace!(
            income = self.income.running(),
            expense = self.expense.running(),
            currency = %self.master,
            "income and expense totals"
        );
        Ok(())
    }
}
