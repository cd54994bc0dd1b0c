//! Per-pattern cardinality estimation.
//!
//! One approximate range-count request per pattern, all issued
//! concurrently. Results come back in input order; the first failure
//! aborts the whole round and later results are discarded.

use crate::error::Result;
use crate::index::{select_index, IndexSelection};
use crate::pattern::TriplePattern;
use crate::store::RangeSizeProvider;
use futures::future::try_join_all;
use tracing::debug;

/// A pattern with its chosen index and estimated match count.
#[derive(Clone, Debug)]
pub(crate) struct Estimated {
    pub(crate) pattern: TriplePattern,
    pub(crate) selection: IndexSelection,
    pub(crate) size: u64,
}

/// Estimates every pattern against `store`, concurrently.
pub(crate) async fn estimate_all(
    store: &dyn RangeSizeProvider,
    patterns: &[TriplePattern],
) -> Result<Vec<Estimated>> {
    try_join_all(patterns.iter().map(|pattern| estimate(store, pattern))).await
}

async fn estimate(store: &dyn RangeSizeProvider, pattern: &TriplePattern) -> Result<Estimated> {
    let selection = select_index(pattern);
    let size = store
        .approximate_size(&selection.range.lower, &selection.range.upper)
        .await?;
    debug!(
        index = selection.order.name(),
        lower = %selection.range.lower,
        size,
        "planner.estimate"
    );
    Ok(Estimated {
        pattern: pattern.clone(),
        selection,
        size,
    })
}
