use chrono::{prelude::*, Duration};

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Every calendar day from `start` to `end`, both included.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
}

pub fn round_to_fixed<T: Into<f64>>(value: T, precision: i32) -> f64 {
    let factor = 10_f64.powi(precision);

    (value.into() * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(last_day_of_month(day(2020, 2, 10)), day(2020, 2, 29));
        assert_eq!(last_day_of_month(day(2021, 12, 1)), day(2021, 12, 31));
        assert_eq!(first_day_of_month(day(2021, 12, 17)), day(2021, 12, 1));
    }

    #[test]
    fn test_days_inclusive() {
        let all: Vec<_> = days(day(2020, 12, 30), day(2021, 1, 2)).collect();

        assert_eq!(all.len(), 4);
        assert_eq!(all[3], day(2021, 1, 2));
        assert_eq!(days(day(2020, 1, 2), day(2020, 1, 1)).count(), 0);
    }

    #[test]
    fn test_round_to_fixed() {
        assert_eq!(round_to_fixed(1.23456, 2), 1.23);
        assert_eq!(round_to_fixed(-0.005_f32, 1), -0.0);
    }
}
