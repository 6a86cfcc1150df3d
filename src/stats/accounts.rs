use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::trace;

use crate::{
    account::Account,
    error::StatsError,
    interval::{Granularity, Intervals},
    money::{RateCache, RateTable},
    operation::Operation,
    stats::{BucketedSeries, Point, Reducer, Series},
    utils,
};

/// Balances of every account, each in its own currency, rolled up into the
/// master currency once the sweep is over.
pub struct AccountsReducer<'a> {
    master: String,
    today: NaiveDate,
    currencies: BTreeMap<String, String>,
    accounts: BTreeMap<String, BucketedSeries>,
    // tracks bucket dates even when no account exists
    calendar: BucketedSeries,
    last_day: Option<NaiveDate>,
    rates: RateCache<'a>,
    rollup: Vec<Series>,
}

impl<'a> AccountsReducer<'a> {
    pub fn new<T: Into<String>>(
        accounts: &[Account],
        master: T,
        today: NaiveDate,
        rates: &'a dyn RateTable,
    ) -> Self {
        Self {
            master: master.into(),
            today,
            currencies: accounts
                .iter()
                .map(|a| (a.name.clone(), a.currency.clone()))
                .collect(),
            accounts: accounts
                .iter()
                .map(|a| (a.name.clone(), BucketedSeries::new()))
                .collect(),
            calendar: BucketedSeries::new(),
            last_day: None,
            rates: RateCache::new(rates),
            rollup: vec![],
        }
    }

    pub fn master_currency(&self) -> &str {
        &self.master
    }

    /// Series of one account, in the account's currency.
    pub fn account(&self, name: &str) -> Option<&BucketedSeries> {
        self.accounts.get(name)
    }

    pub fn account_names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// All accounts together, in the master currency. Empty until the sweep is done.
    pub fn master(&self, granularity: Granularity) -> Option<&Series> {
        self.rollup.get(granularity.index())
    }

    /// Day whose rate values the total of bucket `index`: its last day, never past today.
    fn rate_date(&self, granularity: Granularity, dates: &[NaiveDate], index: usize) -> NaiveDate {
        let end = match dates.get(index + 1) {
            Some(next) => utils::add_days(*next, -1),
            None => {
                let end = granularity.bucket_end(dates[index]);
                self.last_day.map(|last| end.min(last)).unwrap_or(end)
            }
        };

        end.min(self.today)
    }

    fn convert_series(&mut self, granularity: Granularity) -> Result<Series, StatsError> {
        let dates: Vec<NaiveDate> = self.calendar.get(granularity).dates().collect();
        let mut out = Series::default();

        for index in 0..dates.len() {
            let rate_date = self.rate_date(granularity, &dates, index);
            let mut total = 0.0;
            let mut change = 0.0;

            for (name, series) in self.accounts.iter() {
                let currency = &self.currencies[name];
                let rate = self.rates.rate(rate_date, currency, &self.master)?;
                let series = series.get(granularity);

                total += series.total[index].value * rate;
                change += series.change[index].value * rate;
            }

            // past the first bucket, change is the step between converted totals
            if let Some(prev) = out.total.last() {
                change = total - prev.value;
            }

            out.total.push(Point::new(dates[index], total));
            out.change.push(Point::new(dates[index], change));
        }

        Ok(out)
    }
}

impl Reducer for AccountsReducer<'_> {
    fn new_day(&mut self, intervals: &Intervals) -> Result<(), StatsError> {
        self.calendar.new_day(intervals);
        for series in self.accounts.values_mut() {
            series.new_day(intervals);
        }
        self.last_day = Some(intervals.date);

        Ok(())
    }

    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        for side in op.account_sides() {
            self.accounts
                .get_mut(&side.name)
                .ok_or_else(|| StatsError::UnknownAccount(side.name.clone()))?
                .add(side.amount);
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        self.rollup = Granularity::ALL
            .iter()
            .map(|g| self.convert_series(*g))
            .collect::<Result<_, _>>()?;

        trace!(
            accounts = self.accounts.len(),
            lookups = self.rates.len(),
            "rolled up account balances"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{MonthlyRates, RateBook};
    use crate::operation::fixtures::*;
    use crate::predicate::Predicate;
    use crate::stats::Sweep;
    use crate::store::OperationStore;
    use anyhow::Result;
    use chrono::{TimeZone, Utc};

    fn accounts() -> Vec<Account> {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        vec![Account::new("usd", "USD", now), Account::new("eur", "EUR", now)]
    }

    fn rates() -> Result<RateBook> {
        // one EUR is worth 2 USD in January and 4 USD in February
        let mut book = RateBook::new();
        book.insert(MonthlyRates {
            month: "2020-01".into(),
            currency: "EUR".into(),
            rates: vec![0.5; 31],
        })?;
        book.insert(MonthlyRates {
            month: "2020-02".into(),
            currency: "EUR".into(),
            rates: vec![0.25; 29],
        })?;
        Ok(book)
    }

    #[test]
    fn test_rollup_uses_rate_at_bucket_end() -> Result<()> {
        let store = OperationStore::loaded(vec![
            income("a", day(2020, 1, 10), 10.0, "usd", &[]),
            income("b", day(2020, 1, 20), 1.0, "eur", &[]),
            income("c", day(2020, 2, 5), 1.0, "eur", &[]),
        ]);
        let book = rates()?;
        let mut reducer = AccountsReducer::new(&accounts(), "USD", day(2020, 12, 31), &book);

        Sweep::new(&store, day(2020, 12, 31)).run(
            &Predicate::Any,
            Some(crate::stats::TimeSpan::new(day(2020, 1, 1), day(2020, 2, 10))),
            &mut [&mut reducer],
        )?;

        let monthly = reducer.master(Granularity::Month).unwrap();
        assert_eq!(monthly.total_at(day(2020, 1, 1)), Some(12.0));
        assert_eq!(monthly.change_at(day(2020, 1, 1)), Some(12.0));
        // the January euro is revalued at February's rate
        assert_eq!(monthly.total_at(day(2020, 2, 1)), Some(18.0));
        assert_eq!(monthly.change_at(day(2020, 2, 1)), Some(6.0));

        let daily = reducer.master(Granularity::Day).unwrap();
        assert_eq!(daily.total_at(day(2020, 1, 20)), Some(12.0));
        assert_eq!(daily.len(), 41);

        Ok(())
    }

    #[test]
    fn test_future_bucket_uses_today_rate() -> Result<()> {
        let store = OperationStore::loaded(vec![income("b", day(2020, 1, 20), 1.0, "eur", &[])]);
        let book = rates()?;
        let today = day(2020, 1, 25);
        let mut reducer = AccountsReducer::new(&accounts(), "USD", today, &book);

        Sweep::new(&store, today).run(
            &Predicate::Any,
            Some(crate::stats::TimeSpan::new(day(2020, 1, 1), day(2020, 3, 1))),
            &mut [&mut reducer],
        )?;

        let monthly = reducer.master(Granularity::Month).unwrap();
        assert_eq!(monthly.total_at(day(2020, 2, 1)), Some(2.0));
        assert_eq!(monthly.total_at(day(2020, 3, 1)), Some(2.0));

        Ok(())
    }

    #[test]
    fn test_future_week_uses_today_rate() -> Result<()> {
        // one EUR is worth 2 USD until the 14th, 4 USD on the 15th and 8 USD afterwards
        let mut daily = vec![0.5; 14];
        daily.push(0.25);
        daily.extend(vec![0.125; 16]);
        let book = RateBook::new().with(MonthlyRates {
            month: "2020-01".into(),
            currency: "EUR".into(),
            rates: daily,
        })?;

        // Sunday 12th to Saturday 18th, today is Wednesday 15th
        let today = day(2020, 1, 15);
        let store = OperationStore::loaded(vec![income("b", day(2020, 1, 12), 1.0, "eur", &[])]);
        let mut reducer = AccountsReducer::new(&accounts(), "USD", today, &book);

        Sweep::new(&store, today).run(
            &Predicate::Any,
            Some(crate::stats::TimeSpan::new(day(2020, 1, 12), day(2020, 1, 18))),
            &mut [&mut reducer],
        )?;

        let week = reducer.master(Granularity::SundayWeek).unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week.total_at(day(2020, 1, 12)), Some(4.0));
        assert_eq!(week.change_at(day(2020, 1, 12)), Some(4.0));

        // the Monday week opens a second bucket on the 13th
        let m_week = reducer.master(Granularity::MondayWeek).unwrap();
        assert_eq!(m_week.total_at(day(2020, 1, 12)), Some(2.0));
        assert_eq!(m_week.total_at(day(2020, 1, 13)), Some(4.0));
        assert_eq!(m_week.change_at(day(2020, 1, 13)), Some(2.0));

        let days = reducer.master(Granularity::Day).unwrap();
        assert_eq!(days.total_at(day(2020, 1, 14)), Some(2.0));
        assert_eq!(days.total_at(day(2020, 1, 15)), Some(4.0));
        assert_eq!(days.total_at(day(2020, 1, 18)), Some(4.0));

        Ok(())
    }

    #[test]
    fn test_unknown_account() -> Result<()> {
        let store = OperationStore::loaded(vec![income("x", day(2020, 1, 1), 1.0, "nowhere", &[])]);
        let book = rates()?;
        let mut reducer = AccountsReducer::new(&accounts(), "USD", day(2020, 1, 1), &book);

        let result = Sweep::new(&store, day(2020, 1, 1)).run(&Predicate::Any, None, &mut [&mut reducer]);

        assert!(matches!(result, Err(StatsError::UnknownAccount(name)) if name == "nowhere"));

        Ok(())
    }
}
