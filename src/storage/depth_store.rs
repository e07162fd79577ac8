//! DepthStore trait: pluggable depth-series backend
//!
//! Abstracts well / curve / row persistence so the query, aggregation and
//! context paths never touch a concrete database:
//! - `SledDepthStore`: embedded sled database (production)
//! - `InMemoryDepthStore`: in-memory store for testing and minimal deployments

use std::sync::Arc;

use crate::types::{
    Curve, CurveStats, DepthRange, DepthRow, NewCurve, NewWell, OwnerId, Well, WellId,
};

/// Everything one ingestion writes, committed as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WellBundle {
    pub well: NewWell,
    pub curves: Vec<NewCurve>,
    /// Rows in file order; depth is the curve-0 value
    pub rows: Vec<DepthRow>,
}

/// Trait for pluggable depth-series backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks. Every read returns rows in ascending depth order;
/// rows sharing a depth keep their ingestion order.
pub trait DepthStore: Send + Sync {
    /// Create a well with its curves and rows in one all-or-nothing write.
    ///
    /// Rows are written in chunks of `row_batch_size`; chunks are not visible
    /// until the whole well commits.
    fn create_well(&self, bundle: WellBundle, row_batch_size: usize) -> Result<Well, StoreError>;

    /// Well by id, only if owned by `owner`
    fn find_well(&self, well_id: WellId, owner: OwnerId) -> Result<Option<Well>, StoreError>;

    /// All wells owned by `owner`, newest first
    fn list_wells(&self, owner: OwnerId) -> Result<Vec<Well>, StoreError>;

    /// Delete a well with its curves and rows. Returns false when the well
    /// does not exist or is not owned by `owner`.
    fn delete_well(&self, well_id: WellId, owner: OwnerId) -> Result<bool, StoreError>;

    /// Curves of a well ordered by position index
    fn curves(&self, well_id: WellId) -> Result<Vec<Curve>, StoreError>;

    /// Rows with `depth` in `range` (inclusive), ascending by depth
    fn rows_in_range(
        &self,
        well_id: WellId,
        range: DepthRange,
    ) -> Result<Vec<DepthRow>, StoreError>;

    /// The first `limit` rows by depth
    fn first_rows(&self, well_id: WellId, limit: usize) -> Result<Vec<DepthRow>, StoreError>;

    /// Total rows stored for a well
    fn row_count(&self, well_id: WellId) -> Result<usize, StoreError>;

    /// Min / max / mean / count of one curve over `range`, computed inside the
    /// store without materializing rows for the caller.
    ///
    /// Values equal to `null_value` and missing entries are excluded.
    fn curve_stats(
        &self,
        well_id: WellId,
        curve: &str,
        null_value: f64,
        range: DepthRange,
    ) -> Result<CurveStats, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("corrupt key in tree {tree}")]
    CorruptKey { tree: &'static str },
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("blocking store task failed: {0}")]
    Task(String),
}

/// Run synchronous store work on the blocking pool.
///
/// Async callers go through this so sled I/O never stalls a runtime worker.
pub async fn run_blocking<T, F>(store: &Arc<dyn DepthStore>, work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn DepthStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || work(store.as_ref()))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
