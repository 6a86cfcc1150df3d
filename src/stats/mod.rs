//! Day-by-day statistics sweep over the operation log.
//!
//! A [`Sweep`] walks every calendar day of a range, advancing an
//! [`IntervalTracker`] and a single forward-only cursor over the sorted log,
//! and feeds each registered [`Reducer`] in registration order.

use chrono::NaiveDate;
use tracing::debug;

use crate::{
    error::StatsError,
    interval::{IntervalTracker, Intervals},
    operation::Operation,
    predicate::Predicate,
    store::OperationStore,
    utils,
};

pub mod account;
pub mod accounts;
pub mod comparison;
pub mod count;
pub mod goals;
pub mod income_expense;
pub mod series;

pub use account::AccountReducer;
pub use accounts::AccountsReducer;
pub use comparison::{MonthlyComparison, YearlyComparison};
pub use count::{CountReducer, OperationCounts};
pub use goals::GoalsReducer;
pub use income_expense::IncomeExpenseReducer;
pub use series::{BucketedSeries, Point, Series};

/// Stateful aggregator fed by a sweep. Every hook defaults to a no-op.
pub trait Reducer {
    /// Called once per simulated day, before that day's operations.
    fn new_day(&mut self, _intervals: &Intervals) -> Result<(), StatsError> {
        Ok(())
    }

    /// Called for every live operation on its own calendar day that passes the filter.
    fn process(&mut self, _op: &Operation) -> Result<(), StatsError> {
        Ok(())
    }

    /// Called once after the last simulated day.
    fn done(&mut self) -> Result<(), StatsError> {
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TimeSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SweepSummary {
    pub span: TimeSpan,
    pub days: usize,
    pub dispatched: usize,
}

pub struct Sweep<'a> {
    store: &'a OperationStore,
    today: NaiveDate,
}

impl<'a> Sweep<'a> {
    pub fn new(store: &'a OperationStore, today: NaiveDate) -> Self {
        Self { store, today }
    }

    pub fn run(
        &self,
        predicate: &Predicate,
        span: Option<TimeSpan>,
        reducers: &mut [&mut dyn Reducer],
    ) -> Result<SweepSummary, StatsError> {
        let operations = self.store.snapshot()?;
        let matcher = predicate.compile()?;

        let span = span.unwrap_or_else(|| {
            let first = operations.iter().find_map(Operation::date);
            let last = operations.iter().rev().find_map(Operation::date);

            TimeSpan::new(first.unwrap_or(self.today), last.unwrap_or(self.today))
        });

        debug!(
            start = %span.start,
            end = %span.end,
            operations = operations.len(),
            reducers = reducers.len(),
            "starting sweep"
        );

        let mut tracker = IntervalTracker::new(span.start, self.today);
        let mut summary = SweepSummary {
            span,
            days: 0,
            dispatched: 0,
        };
        let mut cursor = 0;

        for day in utils::days(span.start, span.end) {
            let intervals = tracker.advance(day);

            for reducer in reducers.iter_mut() {
                reducer.new_day(intervals)?;
            }

            while let Some(op) = operations.get(cursor) {
                let date = match op.date() {
                    Some(date) => date,
                    None => {
                        cursor += 1;
                        continue;
                    }
                };

                if date > day {
                    break;
                }

                cursor += 1;

                // anything older than `day` lies before the span
                if date < day || !matcher(op) {
                    continue;
                }

                for reducer in reducers.iter_mut() {
                    reducer.process(op)?;
                }
                summary.dispatched += 1;
            }

            summary.days += 1;
        }

        for reducer in reducers.iter_mut() {
            reducer.done()?;
        }

        debug!(days = summary.days, dispatched = summary.dispatched, "sweep done");

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::fixtures::*;
    use crate::operation::OpType;
    use anyhow::Result;

    #[derive(Default)]
    struct Recorder {
        days: Vec<NaiveDate>,
        seen: Vec<(NaiveDate, String)>,
        done: usize,
    }

    impl Reducer for Recorder {
        fn new_day(&mut self, intervals: &Intervals) -> Result<(), StatsError> {
            self.days.push(intervals.date);
            Ok(())
        }

        fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
            let today = *self.days.last().expect("process before new_day");
            assert_eq!(op.date(), Some(today));
            self.seen.push((today, op.id().to_string()));
            Ok(())
        }

        fn done(&mut self) -> Result<(), StatsError> {
            self.done += 1;
            Ok(())
        }
    }

    #[test]
    fn test_not_loaded_fails_fast() {
        let store = OperationStore::new();
        let mut recorder = Recorder::default();

        let result = Sweep::new(&store, day(2020, 1, 1)).run(&Predicate::Any, None, &mut [&mut recorder]);

        assert!(matches!(result, Err(StatsError::NotLoaded)));
        assert_eq!(recorder.done, 0);
    }

    #[test]
    fn test_empty_log_sweeps_today() -> Result<()> {
        let store = OperationStore::loaded(vec![]);
        let mut recorder = Recorder::default();

        let summary = Sweep::new(&store, day(2020, 5, 5)).run(&Predicate::Any, None, &mut [&mut recorder])?;

        assert_eq!(summary.days, 1);
        assert_eq!(recorder.days, vec![day(2020, 5, 5)]);
        assert_eq!(recorder.done, 1);

        Ok(())
    }

    #[test]
    fn test_span_clips_operations() -> Result<()> {
        let store = OperationStore::loaded(vec![
            expense("before", day(2020, 1, 1), -1.0, "cash", &[]),
            expense("inside", day(2020, 1, 3), -1.0, "cash", &[]),
            expense("after", day(2020, 1, 9), -1.0, "cash", &[]),
            deleted("gone"),
        ]);
        let mut recorder = Recorder::default();

        let summary = Sweep::new(&store, day(2020, 1, 5)).run(
            &Predicate::Any,
            Some(TimeSpan::new(day(2020, 1, 2), day(2020, 1, 4))),
            &mut [&mut recorder],
        )?;

        assert_eq!(summary.days, 3);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(recorder.seen, vec![(day(2020, 1, 3), "inside".to_string())]);

        Ok(())
    }

    #[test]
    fn test_predicate_and_empty_predicate() -> Result<()> {
        let store = OperationStore::loaded(vec![
            expense("e", day(2020, 1, 1), -1.0, "cash", &[]),
            income("i", day(2020, 1, 1), 1.0, "cash", &[]),
        ]);
        let sweep = Sweep::new(&store, day(2020, 1, 1));
        let mut recorder = Recorder::default();

        sweep.run(&Predicate::Type(OpType::Income), None, &mut [&mut recorder])?;
        assert_eq!(recorder.seen, vec![(day(2020, 1, 1), "i".to_string())]);

        let result = sweep.run(&Predicate::Or(vec![]), None, &mut [&mut recorder]);
        assert!(matches!(result, Err(StatsError::EmptyPredicate(_))));

        Ok(())
    }

    #[test]
    fn test_reducers_called_in_order() -> Result<()> {
        struct Tagged<'a>(&'static str, &'a std::cell::RefCell<Vec<&'static str>>);

        impl Reducer for Tagged<'_> {
            fn process(&mut self, _: &Operation) -> Result<(), StatsError> {
                self.1.borrow_mut().push(self.0);
                Ok(())
            }
        }

        let log = std::cell::RefCell::new(vec![]);
        let store = OperationStore::loaded(vec![
            expense("a", day(2020, 1, 1), -1.0, "cash", &[]),
            expense("b", day(2020, 1, 2), -1.0, "cash", &[]),
        ]);

        Sweep::new(&store, day(2020, 1, 2)).run(
            &Predicate::Any,
            None,
            &mut [&mut Tagged("first", &log), &mut Tagged("second", &log)],
        )?;

        assert_eq!(*log.borrow(), vec!["first", "second", "first", "second"]);

        Ok(())
    }
}
