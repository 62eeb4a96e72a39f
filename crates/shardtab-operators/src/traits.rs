//! Predicate trait + operator errors.

use shardtab_core::partition::Row;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    /// A predicate failed on `row`; no partial result is produced.
    #[error("predicate failed at row {row}: {source}")]
    PredicateEvaluation {
        row: usize,
        #[source]
        source: shardtab_core::Error,
    },

    #[error("cannot parse predicate '{0}'")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] shardtab_core::Error),
}

/// A pure row filter.
///
/// Anything the predicate needs from its environment is captured up front
/// (closure captures or struct fields); evaluation must not mutate state.
pub trait RowPredicate {
    fn evaluate(&self, row: &Row<'_>) -> shardtab_core::Result<bool>;
}

impl<F> RowPredicate for F
where
    F: Fn(&Row<'_>) -> shardtab_core::Result<bool>,
{
    fn evaluate(&self, row: &Row<'_>) -> shardtab_core::Result<bool> {
        self(row)
    }
}

/// Pin a closure to the predicate signature so its argument types are
/// inferred when it is passed to a generic `RowPredicate` parameter.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&Row<'_>) -> shardtab_core::Result<bool>,
{
    f
}
