//! Row-predicate selection over one Partition.

use shardtab_core::partition::Partition;

use crate::traits::{OpError, RowPredicate};

/// Keep the rows of `input` for which `predicate` holds, in input order.
///
/// The input is untouched. The first predicate error aborts the whole call
/// and reports the failing row index; rows accepted before it are discarded.
pub fn select<P>(input: &Partition, predicate: &P) -> Result<Partition, OpError>
where
    P: RowPredicate + ?Sized,
{
    let mut keep = Vec::with_capacity(input.num_rows());
    for row in input.rows() {
        let matched = predicate
            .evaluate(&row)
            .map_err(|source| OpError::PredicateEvaluation {
                row: row.index(),
                source,
            })?;
        if matched {
            keep.push(row.index());
        }
    }

    // Fast path: everything survived, the result is a copy of the input.
    if keep.len() == input.num_rows() {
        return Ok(input.clone());
    }
    Ok(input.take(&keep)?)
}
