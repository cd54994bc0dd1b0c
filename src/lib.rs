//! Cost-based query planner for the Tercet triple store.
//!
//! A conjunctive query is a list of triple patterns sharing variables. The
//! planner turns that list into an execution plan in three steps: it picks
//! the cheapest covering index for every pattern, prices each pattern with
//! an approximate range count from the storage engine, and reorders the
//! list cheapest first. With the `sort` join algorithm enabled it also
//! pairs order-compatible adjacent patterns into sorted-merge joins.
//!
//! The planner talks to storage through the [`store::RangeSizeProvider`]
//! trait and is runtime-agnostic; any executor able to poll a future can
//! drive [`planner::QueryPlanner::plan`].
//!
//! ```ignore
//! let planner = QueryPlanner::new(
//!     PlannerOptions { join_algorithm: JoinAlgorithm::Sort },
//!     Arc::new(engine),
//! );
//! let plan = planner
//!     .plan(&[
//!         TriplePattern::new().with_subject("matteo").with_predicate("friend"),
//!         TriplePattern::new().with_predicate("friend"),
//!     ])
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod index;
pub mod pattern;
pub mod planner;
pub mod store;
pub mod variable;

mod estimate;

pub use error::{PlanError, Result, StorageError};
pub use planner::{JoinAlgorithm, JoinStrategy, PlannedPattern, PlannerOptions, QueryPlanner};
