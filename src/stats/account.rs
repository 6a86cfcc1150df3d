use crate::{
    error::StatsError,
    interval::Intervals,
    operation::Operation,
    stats::{BucketedSeries, Reducer},
};

/// Balance series of a single account, in that account's own currency.
pub struct AccountReducer {
    account: String,
    series: BucketedSeries,
}

impl AccountReducer {
    pub fn new<T: Into<String>>(account: T) -> Self {
        Self {
            account: account.into(),
            series: BucketedSeries::new(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn series(&self) -> &BucketedSeries {
        &self.series
    }
}

impl Reducer for AccountReducer {
    fn new_day(&mut self, intervals: &Intervals) -> Result<(), StatsError> {
        self.series.new_day(intervals);
        Ok(())
    }

    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        for side in op.account_sides().filter(|side| side.name == self.account) {
            self.series.add(side.amount);
        }
        Ok(())
    }
}
