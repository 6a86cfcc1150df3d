use chrono::NaiveDate;
use num::Num;

use crate::interval::{Granularity, Intervals};

/// One sample of a time series.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Point<T = f64> {
    pub date: NaiveDate,
    pub value: T,
}

impl<T> Point<T> {
    pub fn new(date: NaiveDate, value: T) -> Self {
        Self { date, value }
    }
}

/// Bucket points of a single granularity: the running total as of each
/// bucket, and the change accumulated within it.
#[derive(Debug, PartialEq, Clone)]
pub struct Series<T = f64> {
    pub total: Vec<Point<T>>,
    pub change: Vec<Point<T>>,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            total: vec![],
            change: vec![],
        }
    }
}

impl<T: Copy> Series<T> {
    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.total.iter().map(|p| p.date)
    }

    pub fn total_at(&self, date: NaiveDate) -> Option<T> {
        self.total.iter().find(|p| p.date == date).map(|p| p.value)
    }

    pub fn change_at(&self, date: NaiveDate) -> Option<T> {
        self.change.iter().find(|p| p.date == date).map(|p| p.value)
    }
}

/// Running total and per-bucket change for every granularity at once.
#[derive(Debug, PartialEq, Clone)]
pub struct BucketedSeries<T = f64> {
    buckets: [Series<T>; 5],
    running: T,
}

impl<T: Num + Copy> Default for BucketedSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Num + Copy> BucketedSeries<T> {
    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            running: T::zero(),
        }
    }

    /// Opens a new point for every granularity whose bucket starts on this day.
    pub fn new_day(&mut self, intervals: &Intervals) {
        for granularity in Granularity::ALL {
            if !intervals.opens(granularity) {
                continue;
            }

            let date = intervals.get(granularity).start;
            let series = &mut self.buckets[granularity.index()];

            series.total.push(Point::new(date, self.running));
            series.change.push(Point::new(date, T::zero()));
        }
    }

    /// Adds `value` to the open bucket of every granularity.
    pub fn add(&mut self, value: T) {
        self.running = self.running + value;

        for series in self.buckets.iter_mut() {
            if let Some(last) = series.total.last_mut() {
                last.value = last.value + value;
            }
            if let Some(last) = series.change.last_mut() {
                last.value = last.value + value;
            }
        }
    }

    pub fn get(&self, granularity: Granularity) -> &Series<T> {
        &self.buckets[granularity.index()]
    }

    pub fn running(&self) -> T {
        self.running
    }
}
