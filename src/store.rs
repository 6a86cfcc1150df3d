use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::{
    error::StatsError,
    operation::{sort_operations, Operation},
};

/// Immutable, sorted view of the operation log.
pub type Snapshot = Arc<[Operation]>;

/// Owner of the operation log.
///
/// Every mutation publishes a fresh sorted snapshot; snapshots handed out
/// earlier never change underneath their holders.
#[derive(Debug, Default, Clone)]
pub struct OperationStore {
    operations: Option<Snapshot>,
}

impl OperationStore {
    /// A store whose operations have not been loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, mut operations: Vec<Operation>) {
        sort_operations(&mut operations);
        debug!(count = operations.len(), "loaded operations");
        self.operations = Some(operations.into());
    }

    pub fn loaded(operations: Vec<Operation>) -> Self {
        let mut store = Self::new();
        store.load(operations);
        store
    }

    pub fn is_loaded(&self) -> bool {
        self.operations.is_some()
    }

    pub fn snapshot(&self) -> Result<Snapshot, StatsError> {
        self.operations.clone().ok_or(StatsError::NotLoaded)
    }

    /// Date of the earliest live operation.
    pub fn first_date(&self) -> Result<Option<NaiveDate>, StatsError> {
        Ok(self.snapshot()?.iter().find_map(Operation::date))
    }

    /// Date of the latest live operation.
    pub fn last_date(&self) -> Result<Option<NaiveDate>, StatsError> {
        Ok(self.snapshot()?.iter().rev().find_map(Operation::date))
    }

    /// Reconciles `incoming` records with the log.
    ///
    /// The most recently modified version of each operation wins. Tombstones
    /// always win and are never brought back.
    pub fn merge(&mut self, incoming: Vec<Operation>) -> Result<usize, StatsError> {
        let current = self.snapshot()?;
        let mut by_id: HashMap<String, Operation> = current
            .iter()
            .map(|op| (op.id().to_string(), op.clone()))
            .collect();
        let mut changed = 0;

        for op in incoming {
            let replace = match by_id.get(op.id()) {
                None => true,
                Some(existing) if existing.is_deleted() => false,
                Some(_) if op.is_deleted() => true,
                Some(existing) => op.last_modified() > existing.last_modified(),
            };

            if replace {
                by_id.insert(op.id().to_string(), op);
                changed += 1;
            }
        }

        debug!(changed, "merged operations");
        self.load(by_id.into_values().collect());

        Ok(changed)
    }

    /// Rewrites references to account `from` so they point at `to`.
    pub fn rename_account(&mut self, from: &str, to: &str, now: DateTime<Utc>) -> Result<usize, StatsError> {
        self.rewrite(now, |op| op.rename_account(from, to))
    }

    pub fn rename_category(&mut self, from: &str, to: &str, now: DateTime<Utc>) -> Result<usize, StatsError> {
        self.rewrite(now, |op| op.rename_category(from, to))
    }

    fn rewrite<F: FnMut(&mut Operation) -> bool>(&mut self, now: DateTime<Utc>, mut f: F) -> Result<usize, StatsError> {
        let mut operations = self.snapshot()?.to_vec();
        let mut changed = 0;

        for op in operations.iter_mut() {
            if f(op) {
                op.touch(now);
                changed += 1;
            }
        }

        self.load(operations);

        Ok(changed)
    }
}
