//! Error types shared across the planner.

use std::io;
use thiserror::Error;

/// Crate-wide result alias for planner operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Failure reported by the storage engine's approximate range-count path.
///
/// The planner never constructs these itself; storage implementations do.
/// Whichever estimate fails first propagates through [`PlanError::Storage`]
/// with its cause intact.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O failure while serving the range count.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Backend-specific failure described by the engine.
    #[error("{0}")]
    Backend(String),
}

impl StorageError {
    /// Backend failure with a plain message.
    pub fn backend(message: impl Into<String>) -> Self {
        StorageError::Backend(message.into())
    }
}

/// Errors surfaced by the query planner.
///
/// Planning is all-or-nothing: a single failed estimate aborts the call and
/// no partial plan is returned.
#[derive(Debug, Error)]
pub enum PlanError {
    /// An approximate range-size request failed. The first failure observed
    /// wins; results of the remaining in-flight estimates are discarded.
    #[error("range size estimate failed: {0}")]
    Storage(#[from] StorageError),
    /// A join algorithm name outside `"basic"` / `"sort"` was supplied.
    #[error("unknown join algorithm {0:?}, expected \"basic\" or \"sort\"")]
    UnknownJoinAlgorithm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_nest_under_plan_errors() {
        let err = PlanError::from(StorageError::backend("leveldb iterator failed"));
        assert_eq!(
            err.to_string(),
            "range size estimate failed: leveldb iterator failed"
        );
    }

    #[test]
    fn io_errors_convert_into_storage_errors() {
        let io = io::Error::new(io::ErrorKind::NotFound, "missing sst");
        let err = StorageError::from(io);
        assert!(matches!(err, StorageError::Io(_)));
    }
}
