use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Currency every rate file is quoted against.
pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RateError {
    #[error("no exchange rate known for {currency} around {date}")]
    Missing { currency: String, date: NaiveDate },

    #[error("malformed rate month `{0}`, expected yyyy-MM")]
    BadMonth(String),
}

/// Source of point-in-time exchange rates.
pub trait RateTable {
    /// How many units of `to` one unit of `from` is worth on `date`.
    fn rate(&self, date: NaiveDate, from: &str, to: &str) -> Result<f64, RateError>;
}

/// One rate file: `{year}/{month}/{currency}.json`.
///
/// `rates[i]` is the number of units of `currency` per unit of the base
/// currency on day `i + 1` of `month`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MonthlyRates {
    pub month: String,
    pub currency: String,
    pub rates: Vec<f64>,
}

impl MonthlyRates {
    fn year_month(&self) -> Result<(i32, u32), RateError> {
        let bad = || RateError::BadMonth(self.month.clone());
        let (y, m) = self.month.split_once('-').ok_or_else(bad)?;
        let year = y.parse::<i32>().map_err(|_| bad())?;
        let month = m.parse::<u32>().map_err(|_| bad())?;

        if (1..=12).contains(&month) {
            Ok((year, month))
        } else {
            Err(bad())
        }
    }
}

/// In-memory rate table built from monthly rate files.
///
/// Gaps are filled by carrying the last known earlier rate forward, or the
/// first known later rate when nothing earlier exists.
#[derive(Debug, Default, Clone)]
pub struct RateBook {
    months: HashMap<String, BTreeMap<(i32, u32), Vec<f64>>>,
}

impl RateBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: MonthlyRates) -> Result<(), RateError> {
        let key = file.year_month()?;

        self.months
            .entry(file.currency)
            .or_default()
            .insert(key, file.rates);

        Ok(())
    }

    pub fn with(mut self, file: MonthlyRates) -> Result<Self, RateError> {
        self.insert(file)?;
        Ok(self)
    }

    /// Loads every `*.json` file below `root`, laid out as `{year}/{month}/{currency}.json`.
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let mut book = Self::new();
        let mut pending = vec![root.as_ref().to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir)
                .with_context(|| format!("Failed to list rate directory {}", dir.display()))?;

            for entry in entries {
                let path = entry?.path();

                if path.is_dir() {
                    pending.push(path);
                } else if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read rate file {}", path.display()))?;
                    let file: MonthlyRates = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse rate file {}", path.display()))?;

                    book.insert(file)?;
                }
            }
        }

        debug!(currencies = book.months.len(), "loaded exchange rates");

        Ok(book)
    }

    /// Units of `currency` per unit of the base currency on `date`.
    pub fn base_rate(&self, date: NaiveDate, currency: &str) -> Result<f64, RateError> {
        if currency == BASE_CURRENCY {
            return Ok(1.0);
        }

        let missing = || RateError::Missing {
            currency: currency.to_string(),
            date,
        };
        let months = self.months.get(currency).ok_or_else(missing)?;
        let key = (date.year(), date.month());
        let index = date.day0() as usize;

        if let Some(rate) = months.get(&key).and_then(|r| r.get(index)) {
            return Ok(*rate);
        }

        let earlier = months
            .range(..=key)
            .rev()
            .find_map(|(k, rates)| {
                let upto = if *k == key { index.min(rates.len()) } else { rates.len() };
                rates[..upto].last()
            });

        if let Some(rate) = earlier {
            debug!(%currency, %date, "carrying earlier exchange rate forward");
            return Ok(*rate);
        }

        months
            .range(key..)
            .find_map(|(_, rates)| rates.first())
            .copied()
            .ok_or_else(missing)
    }
}

impl RateTable for RateBook {
    fn rate(&self, date: NaiveDate, from: &str, to: &str) -> Result<f64, RateError> {
        if from == to {
            return Ok(1.0);
        }

        Ok(self.base_rate(date, to)? / self.base_rate(date, from)?)
    }
}

/// Memoizes lookups against a [`RateTable`] by `(date, from, to)`.
pub struct RateCache<'a> {
    table: &'a dyn RateTable,
    memo: HashMap<(NaiveDate, String, String), f64>,
}

impl<'a> RateCache<'a> {
    pub fn new(table: &'a dyn RateTable) -> Self {
        Self {
            table,
            memo: HashMap::new(),
        }
    }

    pub fn rate(&mut self, date: NaiveDate, from: &str, to: &str) -> Result<f64, RateError> {
        if from == to {
            return Ok(1.0);
        }

        let key = (date, from.to_string(), to.to_string());
        if let Some(rate) = self.memo.get(&key) {
            return Ok(*rate);
        }

        let rate = self.table.rate(date, from, to)?;
        self.memo.insert(key, rate);

        Ok(rate)
    }

    pub fn convert(&mut self, date: NaiveDate, amount: f64, from: &str, to: &str) -> Result<f64, RateError> {
        Ok(amount * self.rate(date, from, to)?)
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}
