//! Join-order planning and physical join-strategy assignment.
//!
//! Planning happens in two stages. First every pattern is priced with an
//! approximate index-range count and the list is reordered cheapest first,
//! the classical smallest-relation-first join heuristic. Second, when the
//! sort algorithm is enabled, adjacent patterns whose scans can share one
//! index ordering are paired into sorted-merge joins; everything else
//! executes as an index nested-loop probe.
//!
//! Plans are descriptions only. No scan is opened and no triple is read
//! here; executors downstream consume the annotations.

use crate::error::{PlanError, Result};
use crate::estimate::{estimate_all, Estimated};
use crate::index::{candidate_orders, preferred_order, CandidateOrders, IndexOrder};
use crate::pattern::{FieldRole, TriplePattern};
use crate::store::RangeSizeProvider;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Which physical join strategies the planner may assign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinAlgorithm {
    /// Index nested-loop joins only. Every planned pattern probes its own
    /// index once per upstream binding.
    #[default]
    Basic,
    /// Additionally pair order-compatible adjacent patterns into
    /// sorted-merge joins over a shared index ordering.
    Sort,
}

impl JoinAlgorithm {
    /// Lowercase configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            JoinAlgorithm::Basic => "basic",
            JoinAlgorithm::Sort => "sort",
        }
    }
}

impl fmt::Display for JoinAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JoinAlgorithm {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(JoinAlgorithm::Basic),
            "sort" => Ok(JoinAlgorithm::Sort),
            other => Err(PlanError::UnknownJoinAlgorithm(other.to_string())),
        }
    }
}

/// Planner behavior fixed at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Join strategy repertoire, [`JoinAlgorithm::Basic`] unless configured.
    pub join_algorithm: JoinAlgorithm,
}

/// Physical operator kind executing one planned pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Probe the pattern's index once per upstream binding.
    NestedLoop,
    /// Merge the pattern's index scan against the already-sorted upstream.
    SortedMerge,
}

impl JoinStrategy {
    /// Human-readable operator name.
    pub fn name(&self) -> &'static str {
        match self {
            JoinStrategy::NestedLoop => "nested-loop",
            JoinStrategy::SortedMerge => "sorted-merge",
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a finished plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedPattern {
    /// The caller's pattern, byte for byte.
    pub pattern: TriplePattern,
    /// Operator kind joining this pattern's matches with the bindings
    /// accumulated so far.
    pub stream: JoinStrategy,
    /// Index ordering shared with a merge-paired neighbor. `Some` on both
    /// halves of every pair, `None` everywhere else; always `None` under
    /// [`JoinAlgorithm::Basic`].
    pub index: Option<IndexOrder>,
}

/// Cost-based query planner bound to one storage engine.
///
/// Stateless between calls: every [`QueryPlanner::plan`] prices the
/// patterns afresh, so concurrent calls on one instance never interfere.
#[derive(Clone)]
pub struct QueryPlanner {
    options: PlannerOptions,
    store: Arc<dyn RangeSizeProvider>,
}

impl QueryPlanner {
    /// Creates a planner over `store` with the given options.
    pub fn new(options: PlannerOptions, store: Arc<dyn RangeSizeProvider>) -> Self {
        QueryPlanner { options, store }
    }

    /// The options this planner was built with.
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plans a conjunctive query.
    ///
    /// Reorders `patterns` by ascending estimated cardinality and assigns
    /// each a join strategy. The output is a permutation of the input:
    /// patterns are never dropped, merged, or rewritten. Equal estimates
    /// keep their input order. An empty query yields an empty plan without
    /// touching storage.
    pub async fn plan(&self, patterns: &[TriplePattern]) -> Result<Vec<PlannedPattern>> {
        let mut estimates = estimate_all(self.store.as_ref(), patterns).await?;
        estimates.sort_by_key(|estimate| estimate.size);
        debug!(
            patterns = estimates.len(),
            algorithm = self.options.join_algorithm.name(),
            "planner.order"
        );
        let plan = match self.options.join_algorithm {
            JoinAlgorithm::Basic => basic_plan(estimates),
            JoinAlgorithm::Sort => sort_plan(estimates),
        };
        Ok(plan)
    }
}

/// Every pattern probes its own index; no pairing.
fn basic_plan(estimates: Vec<Estimated>) -> Vec<PlannedPattern> {
    estimates
        .into_iter()
        .map(|estimate| PlannedPattern {
            pattern: estimate.pattern,
            stream: JoinStrategy::NestedLoop,
            index: None,
        })
        .collect()
}

/// Walks the ordered patterns pairing each with its predecessor where a
/// shared ordering exists. Pairing pins the predecessor's index, which also
/// lets chains of three or more patterns merge over one ordering.
fn sort_plan(estimates: Vec<Estimated>) -> Vec<PlannedPattern> {
    let mut plan: Vec<PlannedPattern> = Vec::with_capacity(estimates.len());
    for estimate in estimates {
        let shared = plan
            .last()
            .and_then(|prev| shared_merge_order(prev, &estimate.pattern));
        if let (Some(order), Some(prev)) = (shared, plan.last_mut()) {
            prev.index = Some(order);
            debug!(index = order.name(), "planner.merge");
            plan.push(PlannedPattern {
                pattern: estimate.pattern,
                stream: JoinStrategy::SortedMerge,
                index: Some(order),
            });
        } else {
            plan.push(PlannedPattern {
                pattern: estimate.pattern,
                stream: JoinStrategy::NestedLoop,
                index: None,
            });
        }
    }
    plan
}

/// Decides whether `current` can merge with the already-planned `prev`,
/// and on which index ordering.
///
/// Two conditions gate the pairing. The patterns must bind the same
/// variables in the same roles, otherwise their scans emit rows keyed by
/// different unknowns and a positional merge is meaningless. And at least
/// one index ordering must be able to answer both scans; if `prev` is
/// already pinned to an ordering by an earlier pairing, only that ordering
/// qualifies. Bound constants are free to differ, equal masks alone make
/// the scans align.
fn shared_merge_order(prev: &PlannedPattern, current: &TriplePattern) -> Option<IndexOrder> {
    if prev.pattern.variable_mask() != current.variable_mask() {
        return None;
    }
    let current_candidates = candidate_orders(current);
    let shared: CandidateOrders = match prev.index {
        Some(pinned) if current_candidates.contains(&pinned) => smallvec![pinned],
        Some(_) => return None,
        None => {
            let prev_candidates = candidate_orders(&prev.pattern);
            current_candidates
                .into_iter()
                .filter(|order| prev_candidates.contains(order))
                .collect()
        }
    };
    let prefer_predicate = prev.pattern.is_bound(FieldRole::Predicate)
        || current.is_bound(FieldRole::Predicate);
    preferred_order(&shared, prefer_predicate)
}
