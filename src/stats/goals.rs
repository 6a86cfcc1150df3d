use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use tracing::trace;

use crate::{
    account::Category,
    error::StatsError,
    money::{RateCache, RateTable},
    operation::Operation,
    stats::Reducer,
};

/// Yearly spending per category with a goal, in the master currency.
pub struct GoalsReducer<'a> {
    master: String,
    rates: RateCache<'a>,
    goals: HashMap<String, f64>,
    spent: HashMap<String, BTreeMap<i32, f64>>,
}

impl<'a> GoalsReducer<'a> {
    /// Only active categories that carry a yearly goal are tracked.
    pub fn new<T: Into<String>>(categories: &[Category], master: T, rates: &'a dyn RateTable) -> Self {
        let goals = categories
            .iter()
            .filter(|c| c.is_active())
            .filter_map(|c| c.yearly_goal.map(|goal| (c.name.clone(), goal)))
            .collect();

        Self {
            master: master.into(),
            rates: RateCache::new(rates),
            goals,
            spent: HashMap::new(),
        }
    }

    pub fn goal(&self, category: &str) -> Option<f64> {
        self.goals.get(category).copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.goals.keys().map(String::as_str)
    }

    /// Signed sum of the category's splits booked in `year`.
    pub fn spent(&self, category: &str, year: i32) -> f64 {
        self.spent
            .get(category)
            .and_then(|years| years.get(&year))
            .copied()
            .unwrap_or(0.0)
    }

    /// Share of the yearly goal used up in `year`.
    pub fn progress(&self, category: &str, year: i32) -> Result<f64, StatsError> {
        let goal = self
            .goal(category)
            .ok_or_else(|| StatsError::MissingGoal(category.to_string()))?;

        Ok(self.spent(category, year).abs() / goal)
    }
}

impl Reducer for GoalsReducer<'_> {
    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        let (date, currency, categories) = match (op.date(), op.currency(), op.categories()) {
            (Some(date), Some(currency), Some(categories)) => (date, currency, categories),
            _ => return Ok(()),
        };

        for split in categories.iter().filter(|c| self.goals.contains_key(&c.name)) {
            let amount = self.rates.convert(date, split.amount, currency, &self.master)?;

            *self
                .spent
                .entry(split.name.clone())
                .or_default()
                .entry(date.year())
                .or_default() += amount;
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        trace!(goals = self.goals.len(), tracked = self.spent.len(), "category goals ready");
        Ok(())
    }
}
