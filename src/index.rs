//! Compound index orderings and scan-bound construction.
//!
//! Six covering indexes store every triple, one per permutation of the
//! three fields:
//!
//! | order | key layout                      |
//! |-------|---------------------------------|
//! | `spo` | subject, predicate, object      |
//! | `sop` | subject, object, predicate      |
//! | `pos` | predicate, object, subject      |
//! | `pso` | predicate, subject, object      |
//! | `ops` | object, predicate, subject      |
//! | `osp` | object, subject, predicate      |
//!
//! A pattern can be answered by one contiguous scan of an index exactly
//! when the pattern's bound fields form a prefix of that index's field
//! order. Selection picks among those candidates, preferring
//! predicate-leading orders for patterns that bind the predicate, since
//! real-world queries share predicates far more often than subjects or
//! objects.

use crate::pattern::{FieldRole, TriplePattern};
use smallvec::SmallVec;
use std::fmt;
use tracing::trace;

/// Separator between the index label and each bound value in a scan key.
pub const KEY_SEPARATOR: &str = "::";

/// Sentinel closing the upper bound of a scan. Sorts after the separator,
/// so swapping it for a key's trailing separator yields an exclusive bound
/// covering every key that extends the bound prefix.
pub const UPPER_BOUND_SENTINEL: char = '\u{00ff}';

/// One of the six covering index orderings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    /// Subject, predicate, object.
    Spo,
    /// Subject, object, predicate.
    Sop,
    /// Predicate, object, subject.
    Pos,
    /// Predicate, subject, object.
    Pso,
    /// Object, predicate, subject.
    Ops,
    /// Object, subject, predicate.
    Osp,
}

impl IndexOrder {
    /// Every ordering, in canonical declaration order. Ties between
    /// equally suitable candidates resolve to the earliest entry here.
    pub const ALL: [IndexOrder; 6] = [
        IndexOrder::Spo,
        IndexOrder::Sop,
        IndexOrder::Pos,
        IndexOrder::Pso,
        IndexOrder::Ops,
        IndexOrder::Osp,
    ];

    /// The field roles in this index's key order.
    pub fn fields(&self) -> [FieldRole; 3] {
        use FieldRole::{Object, Predicate, Subject};
        match self {
            IndexOrder::Spo => [Subject, Predicate, Object],
            IndexOrder::Sop => [Subject, Object, Predicate],
            IndexOrder::Pos => [Predicate, Object, Subject],
            IndexOrder::Pso => [Predicate, Subject, Object],
            IndexOrder::Ops => [Object, Predicate, Subject],
            IndexOrder::Osp => [Object, Subject, Predicate],
        }
    }

    /// Lowercase label, which is also the key-space partition prefix.
    pub fn name(&self) -> &'static str {
        match self {
            IndexOrder::Spo => "spo",
            IndexOrder::Sop => "sop",
            IndexOrder::Pos => "pos",
            IndexOrder::Pso => "pso",
            IndexOrder::Ops => "ops",
            IndexOrder::Osp => "osp",
        }
    }

    /// Whether the predicate is this index's leading field.
    pub fn leads_with_predicate(&self) -> bool {
        self.fields()[0] == FieldRole::Predicate
    }

    /// Builds the half-open key range `[lower, upper)` scanning this index
    /// for `pattern`.
    ///
    /// The lower bound is the label followed by each bound value in key
    /// order, every component closed by [`KEY_SEPARATOR`]; values stop at
    /// the first field the pattern leaves unbound. The upper bound is the
    /// same key with the final separator replaced by
    /// [`UPPER_BOUND_SENTINEL`].
    pub fn scan_range(&self, pattern: &TriplePattern) -> ScanRange {
        let mut lower = String::from(self.name());
        lower.push_str(KEY_SEPARATOR);
        for role in self.fields() {
            match pattern.constant(role) {
                Some(value) => {
                    lower.push_str(value);
                    lower.push_str(KEY_SEPARATOR);
                }
                None => break,
            }
        }
        let mut upper = lower[..lower.len() - KEY_SEPARATOR.len()].to_string();
        upper.push(UPPER_BOUND_SENTINEL);
        ScanRange { lower, upper }
    }
}

impl fmt::Display for IndexOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Candidate orderings for one pattern. Never empty and at most six long,
/// so it lives on the stack.
pub type CandidateOrders = SmallVec<[IndexOrder; 6]>;

/// Half-open key range `[lower, upper)` over one index partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRange {
    /// Inclusive lower bound.
    pub lower: String,
    /// Exclusive upper bound.
    pub upper: String,
}

/// The ordering chosen for a pattern together with its scan bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSelection {
    /// The chosen ordering.
    pub order: IndexOrder,
    /// Bounds of the single contiguous scan answering the pattern.
    pub range: ScanRange,
}

/// Orderings able to answer `pattern` with one contiguous scan, in
/// canonical order.
///
/// An ordering qualifies when all of the pattern's bound fields sit in a
/// contiguous prefix of its key order. A pattern with no bound fields is
/// answered by a full partition scan, so all six orderings qualify.
pub fn candidate_orders(pattern: &TriplePattern) -> CandidateOrders {
    let bound = pattern.bound_count();
    IndexOrder::ALL
        .iter()
        .copied()
        .filter(|order| {
            order
                .fields()
                .iter()
                .take_while(|role| pattern.is_bound(**role))
                .count()
                == bound
        })
        .collect()
}

/// Picks the winner among `candidates`: the first predicate-leading entry
/// when `prefer_predicate` is set and one exists, otherwise the first
/// entry. Returns `None` only for an empty slice.
pub(crate) fn preferred_order(
    candidates: &[IndexOrder],
    prefer_predicate: bool,
) -> Option<IndexOrder> {
    if prefer_predicate {
        if let Some(order) = candidates.iter().find(|o| o.leads_with_predicate()) {
            return Some(*order);
        }
    }
    candidates.first().copied()
}

/// Chooses the index and scan bounds for one pattern.
///
/// Deterministic: equal patterns always land on the same ordering.
pub fn select_index(pattern: &TriplePattern) -> IndexSelection {
    let candidates = candidate_orders(pattern);
    // Every bound-field set is a prefix of at least one ordering, so the
    // fallback is unreachable.
    let order = preferred_order(&candidates, pattern.is_bound(FieldRole::Predicate))
        .unwrap_or(IndexOrder::Spo);
    let range = order.scan_range(pattern);
    trace!(index = order.name(), lower = %range.lower, "planner.index.selected");
    IndexSelection { order, range }
}
