use chrono::prelude::*;

use crate::utils;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Day,
    /// Weeks starting on Sunday.
    SundayWeek,
    /// Weeks starting on Monday.
    MondayWeek,
    Month,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Day,
        Granularity::SundayWeek,
        Granularity::MondayWeek,
        Granularity::Month,
        Granularity::Year,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_first_day(&self, date: NaiveDate) -> bool {
        match self {
            Granularity::Day => true,
            Granularity::SundayWeek => date.weekday() == Weekday::Sun,
            Granularity::MondayWeek => date.weekday() == Weekday::Mon,
            Granularity::Month => date.day() == 1,
            Granularity::Year => date.ordinal() == 1,
        }
    }

    /// First day of the bucket containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::SundayWeek => {
                utils::add_days(date, -(date.weekday().num_days_from_sunday() as i64))
            }
            Granularity::MondayWeek => {
                utils::add_days(date, -(date.weekday().num_days_from_monday() as i64))
            }
            Granularity::Month => utils::first_day_of_month(date),
            Granularity::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// Last day of the bucket containing `date`.
    pub fn bucket_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::SundayWeek | Granularity::MondayWeek => {
                utils::add_days(self.bucket_start(date), 6)
            }
            Granularity::Month => utils::last_day_of_month(date),
            Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Interval {
    pub start: NaiveDate,
    pub is_first_day: bool,
    pub is_past: bool,
    pub is_now: bool,
    pub is_future: bool,
}

impl Interval {
    /// State before the first simulated day: every flag is raised.
    fn sentinel(start: NaiveDate) -> Self {
        Self {
            start,
            is_first_day: true,
            is_past: true,
            is_now: true,
            is_future: true,
        }
    }
}

/// Snapshot of every granularity's cursor for one simulated day.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Intervals {
    pub date: NaiveDate,
    /// Set only on the first simulated day of a sweep.
    pub first: bool,
    items: [Interval; 5],
}

impl Intervals {
    pub fn get(&self, granularity: Granularity) -> &Interval {
        &self.items[granularity.index()]
    }

    pub fn day(&self) -> &Interval {
        self.get(Granularity::Day)
    }

    pub fn s_week(&self) -> &Interval {
        self.get(Granularity::SundayWeek)
    }

    pub fn m_week(&self) -> &Interval {
        self.get(Granularity::MondayWeek)
    }

    pub fn month(&self) -> &Interval {
        self.get(Granularity::Month)
    }

    pub fn year(&self) -> &Interval {
        self.get(Granularity::Year)
    }

    /// Whether a new bucket of `granularity` begins today, counting the first simulated day.
    pub fn opens(&self, granularity: Granularity) -> bool {
        self.first || self.get(granularity).is_first_day
    }
}

pub struct IntervalTracker {
    today: NaiveDate,
    started: bool,
    current: Intervals,
}

impl IntervalTracker {
    pub fn new(start: NaiveDate, today: NaiveDate) -> Self {
        Self {
            today,
            started: false,
            current: Intervals {
                date: start,
                first: true,
                items: [Interval::sentinel(start); 5],
            },
        }
    }

    pub fn current(&self) -> &Intervals {
        &self.current
    }

    /// Moves every cursor to `date`, which must follow the previously simulated day.
    ///
    /// Past, now and future compare `today` with the whole calendar bucket
    /// holding `date`, even when the sweep starts partway into that bucket.
    pub fn advance(&mut self, date: NaiveDate) -> &Intervals {
        let first = !self.started;
        self.started = true;

        for granularity in Granularity::ALL {
            let interval = &mut self.current.items[granularity.index()];

            interval.is_first_day = granularity.is_first_day(date);
            if interval.is_first_day || first {
                interval.start = date;
            }

            interval.is_past = granularity.bucket_end(date) < self.today;
            interval.is_future = granularity.bucket_start(date) > self.today;
            interval.is_now = !interval.is_past && !interval.is_future;
        }

        self.current.date = date;
        self.current.first = first;

        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::days;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sentinel_before_first_day() {
        let tracker = IntervalTracker::new(day(2021, 3, 3), day(2021, 3, 3));
        let month = tracker.current().month();

        assert!(month.is_past && month.is_now && month.is_future && month.is_first_day);
    }

    #[test]
    fn test_first_day_flags() {
        // 2021-03-01 is a Monday
        let mut tracker = IntervalTracker::new(day(2021, 2, 27), day(2021, 12, 31));
        let mut seen = vec![];

        for d in days(day(2021, 2, 27), day(2021, 3, 8)) {
            let iv = tracker.advance(d);
            seen.push((d, iv.s_week().is_first_day, iv.m_week().is_first_day, iv.month().is_first_day));
        }

        assert_eq!(seen[0], (day(2021, 2, 27), false, false, false));
        assert_eq!(seen[1], (day(2021, 2, 28), true, false, false));
        assert_eq!(seen[2], (day(2021, 3, 1), false, true, true));
        assert_eq!(seen[8], (day(2021, 3, 7), true, false, false));
        assert_eq!(seen[9], (day(2021, 3, 8), false, true, false));
    }

    #[test]
    fn test_start_follows_boundaries() {
        let mut tracker = IntervalTracker::new(day(2020, 12, 30), day(2021, 6, 1));

        let iv = tracker.advance(day(2020, 12, 30)).clone();
        assert!(iv.first);
        assert_eq!(iv.year().start, day(2020, 12, 30));
        assert!(iv.opens(Granularity::Year));

        tracker.advance(day(2020, 12, 31));
        let iv = tracker.advance(day(2021, 1, 1));
        assert!(!iv.first);
        assert!(iv.year().is_first_day);
        assert_eq!(iv.year().start, day(2021, 1, 1));
        assert_eq!(iv.month().start, day(2021, 1, 1));

        let iv = tracker.advance(day(2021, 1, 2));
        assert!(!iv.opens(Granularity::Month));
        assert_eq!(iv.month().start, day(2021, 1, 1));
        assert_eq!(iv.day().start, day(2021, 1, 2));
    }

    #[test]
    fn test_past_now_future_exclusive() {
        let today = day(2021, 3, 10);
        let mut tracker = IntervalTracker::new(day(2021, 2, 20), today);

        for d in days(day(2021, 2, 20), day(2021, 4, 10)) {
            let iv = tracker.advance(d);
            for g in Granularity::ALL {
                let i = iv.get(g);
                let raised = [i.is_past, i.is_now, i.is_future].iter().filter(|x| **x).count();
                assert_eq!(raised, 1, "{:?} on {}", g, d);
            }
        }

        let iv = tracker.advance(day(2021, 4, 11));
        assert!(iv.day().is_future);
        assert!(iv.month().is_future);
        assert!(iv.year().is_now);
    }

    #[test]
    fn test_mid_bucket_start_uses_calendar_bucket() {
        // the sweep starts on the 15th, after today, inside today's month
        let mut tracker = IntervalTracker::new(day(2021, 3, 15), day(2021, 3, 5));
        let iv = tracker.advance(day(2021, 3, 15));

        assert_eq!(iv.month().start, day(2021, 3, 15));
        assert!(iv.month().is_now);
        assert!(iv.year().is_now);
        assert!(iv.day().is_future);
    }

    #[test]
    fn test_week_now_covers_today() {
        // 2021-03-10 is a Wednesday; the Sunday week runs 7th..13th
        let today = day(2021, 3, 10);
        let mut tracker = IntervalTracker::new(day(2021, 3, 6), today);

        assert!(tracker.advance(day(2021, 3, 6)).s_week().is_past);
        assert!(tracker.advance(day(2021, 3, 7)).s_week().is_now);
        assert!(tracker.advance(day(2021, 3, 8)).m_week().is_now);
        assert!(tracker.advance(day(2021, 3, 13)).s_week().is_now);
        assert!(tracker.advance(day(2021, 3, 14)).s_week().is_future);
        assert!(tracker.advance(day(2021, 3, 15)).m_week().is_future);
    }
}
