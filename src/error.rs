use thiserror::Error;

use crate::{money::RateError, predicate::EmptyPredicateError};

/// Failures of a statistics sweep. None of these are recoverable: they point
/// at a sequencing bug in the caller or a bug in a reducer.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("operations are not loaded yet")]
    NotLoaded,

    #[error(transparent)]
    EmptyPredicate(#[from] EmptyPredicateError),

    #[error("operation references unknown account `{0}`")]
    UnknownAccount(String),

    #[error("category `{0}` has no yearly goal")]
    MissingGoal(String),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("internal consistency check failed: {0}")]
    Inconsistent(String),
}
