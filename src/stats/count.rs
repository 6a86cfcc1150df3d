use serde::Serialize;
use tracing::trace;

use crate::{
    error::StatsError,
    operation::{OpType, Operation},
    stats::Reducer,
};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct OperationCounts {
    pub all: usize,
    pub income: usize,
    pub expense: usize,
    pub transfer: usize,
    pub adjustment: usize,
    /// Expenses booked with a positive amount, i.e. refunds. Every return is
    /// also an expense, so `returns <= expense` only fails when the sweep
    /// double-counts an operation.
    pub returns: usize,
}

/// Counts the operations a sweep dispatched, per type.
#[derive(Debug, Default)]
pub struct CountReducer {
    counts: OperationCounts,
}

impl CountReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> OperationCounts {
        self.counts
    }
}

impl Reducer for CountReducer {
    fn process(&mut self, op: &Operation) -> Result<(), StatsError> {
        let counts = &mut self.counts;
        counts.all += 1;

        match op.op_type() {
            OpType::Income => counts.income += 1,
            OpType::Expense => {
                counts.expense += 1;
                if op.amount() > 0.0 {
                    counts.returns += 1;
                }
            }
            OpType::Transfer => counts.transfer += 1,
            OpType::Adjustment => counts.adjustment += 1,
            OpType::Deleted => {}
        }

        Ok(())
    }

    fn done(&mut self) -> Result<(), StatsError> {
        let c = &self.counts;
        let by_type = c.income + c.expense + c.transfer + c.adjustment;

        if c.all != by_type {
            return Err(StatsError::Inconsistent(format!(
                "counted {} operations but {} by type",
                c.all, by_type
            )));
        }

        if c.returns > c.expense {
            return Err(StatsError::Inconsistent(format!(
                "counted {} returns for only {} expenses",
                c.returns, c.expense
            )));
        }

        trace!(?c, "operation counts");

        Ok(())
    }
}
