//! Storage-engine contract consumed by the planner.
//!
//! Planning needs exactly one capability from the engine underneath: an
//! approximate count of the keys inside a half-open range. Real
//! implementations live with the storage engine; [`InMemoryRangeSizes`]
//! ships here for tests and prototyping.

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Source of approximate range cardinalities.
///
/// Estimates may be rough; the planner only compares them against each
/// other, so the useful property is monotonicity, bigger ranges should not
/// report smaller counts. Each call resolves exactly once, with either a
/// count or an error.
#[async_trait]
pub trait RangeSizeProvider: Send + Sync {
    /// Approximate number of stored keys in `[lower, upper)`.
    async fn approximate_size(&self, lower: &str, upper: &str) -> Result<u64, StorageError>;
}

/// Deterministic in-memory size provider.
///
/// Sizes are registered per exact `(lower, upper)` bound pair through the
/// fluent `with_*` builders. Requests outside the registered set fail
/// unless a fallback is installed, which keeps tests honest about the
/// exact ranges the planner asks for. Every request is recorded and can be
/// inspected afterwards through [`InMemoryRangeSizes::requests`].
#[derive(Debug, Default)]
pub struct InMemoryRangeSizes {
    sizes: HashMap<(String, String), u64>,
    failures: HashMap<(String, String), String>,
    fallback: Option<u64>,
    requests: Mutex<Vec<(String, String)>>,
}

impl InMemoryRangeSizes {
    /// An empty provider; every request fails until sizes are registered.
    pub fn new() -> Self {
        InMemoryRangeSizes::default()
    }

    /// Registers the size reported for the exact range `[lower, upper)`.
    pub fn with_size(
        mut self,
        lower: impl Into<String>,
        upper: impl Into<String>,
        size: u64,
    ) -> Self {
        self.sizes.insert((lower.into(), upper.into()), size);
        self
    }

    /// Registers a backend failure for the exact range `[lower, upper)`.
    pub fn with_failure(
        mut self,
        lower: impl Into<String>,
        upper: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .insert((lower.into(), upper.into()), message.into());
        self
    }

    /// Size reported for ranges with no registered entry.
    pub fn with_fallback(mut self, size: u64) -> Self {
        self.fallback = Some(size);
        self
    }

    /// Every range requested so far, in arrival order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl RangeSizeProvider for InMemoryRangeSizes {
    async fn approximate_size(&self, lower: &str, upper: &str) -> Result<u64, StorageError> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push((lower.to_string(), upper.to_string()));
        let key = (lower.to_string(), upper.to_string());
        if let Some(message) = self.failures.get(&key) {
            return Err(StorageError::backend(message.clone()));
        }
        match self.sizes.get(&key).copied().or(self.fallback) {
            Some(size) => Ok(size),
            None => Err(StorageError::backend(format!(
                "no registered size for range [{lower:?}, {upper:?})"
            ))),
        }
    }
}
