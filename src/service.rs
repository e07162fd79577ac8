//! WellLogService: the operations a transport layer exposes
//!
//! Owns the depth store, the raw file sink and the context cache. Every
//! well-scoped operation first resolves the well for the requesting owner;
//! wells that do not exist and wells owned by someone else both surface as
//! `WellNotFound`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::acquisition::{parse_las, LasDocument};
use crate::aggregation::{aggregate_curves, compute_statistics, FanOutOptions, StatsMap};
use crate::config::EngineConfig;
use crate::context::{build_context, ContextCache, WellContext};
use crate::narrative::{analysis_prompt, ChatSession, InterpretationPayload, NarrativeBackend};
use crate::query::{project_rows, query_range, DepthBounds, RangeResponse};
use crate::sampling::downsample;
use crate::storage::{
    ingest, run_blocking, store_with_fallback, DepthStore, IngestError, InMemoryDepthStore,
    LocalRawFileStore, RawFileStore, SledDepthStore, StoreError,
};
use crate::types::{
    Curve, DepthRange, DepthRow, OwnerId, ProjectedRow, Well, WellId, WellSummary,
};

/// Service errors.
///
/// `is_user_error` separates rejected input from system failure.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("well not found")]
    WellNotFound,
    #[error("no curve definitions found in ~C section")]
    NoCurves,
    #[error("no valid data rows found in ~A section")]
    NoRows,
    #[error("at least one curve is required")]
    MissingCurves,
    #[error("invalid depth range: {0}")]
    InvalidRange(String),
    #[error("no data found in the specified depth range")]
    EmptyRange,
    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] serde_json::Error),
    #[error("narrative generation failed: {0:#}")]
    Narrative(anyhow::Error),
}

impl ServiceError {
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Prompt(_) | Self::Narrative(_))
    }
}

impl From<IngestError> for ServiceError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoCurves => Self::NoCurves,
            IngestError::NoRows => Self::NoRows,
            IngestError::Store(e) => Self::Store(e),
        }
    }
}

/// Declared interval of an uploaded well
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthSpan {
    pub start: f64,
    pub stop: f64,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub well_id: WellId,
    pub well_name: String,
    pub curves_count: usize,
    pub data_rows_count: usize,
    pub depth_range: DepthSpan,
}

/// One-shot interpretation request; both bounds are required
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretRequest {
    pub well_id: WellId,
    pub curves: Vec<String>,
    pub start_depth: Option<f64>,
    pub end_depth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationResponse {
    pub well_id: WellId,
    pub curves: Vec<String>,
    pub depth_range: DepthRange,
    pub stats: StatsMap,
    pub interpretation: String,
}

pub struct WellLogService {
    store: Arc<dyn DepthStore>,
    raw_files: Arc<dyn RawFileStore>,
    cache: ContextCache,
    config: EngineConfig,
}

impl WellLogService {
    pub fn new(
        store: Arc<dyn DepthStore>,
        raw_files: Arc<dyn RawFileStore>,
        config: EngineConfig,
    ) -> Self {
        let cache = ContextCache::new(config.context.ttl());
        Self::with_cache(store, raw_files, cache, config)
    }

    pub fn with_cache(
        store: Arc<dyn DepthStore>,
        raw_files: Arc<dyn RawFileStore>,
        cache: ContextCache,
        config: EngineConfig,
    ) -> Self {
        info!(backend = store.backend_name(), "Well-log service ready");
        Self {
            store,
            raw_files,
            cache,
            config,
        }
    }

    /// Sled store under `storage.data_dir`, raw files under `storage.raw_dir`
    pub fn open(config: EngineConfig) -> Result<Self, ServiceError> {
        let store = SledDepthStore::open(&config.storage.data_dir)?;
        let raw = LocalRawFileStore::new(config.storage.raw_dir.clone());
        Ok(Self::new(Arc::new(store), Arc::new(raw), config))
    }

    /// Non-durable service for tests and dry runs
    pub fn in_memory(config: EngineConfig) -> Self {
        let raw = LocalRawFileStore::new(config.storage.raw_dir.clone());
        Self::new(Arc::new(InMemoryDepthStore::new()), Arc::new(raw), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    fn fan_out(&self) -> FanOutOptions {
        FanOutOptions {
            batch_width: self.config.aggregation.batch_width,
            curve_timeout: self.config.aggregation.curve_timeout(),
        }
    }

    fn resolve(&self, well_id: WellId, owner: OwnerId) -> Result<Well, ServiceError> {
        self.store
            .find_well(well_id, owner)?
            .ok_or(ServiceError::WellNotFound)
    }

    /// `resolve` on the blocking pool, for async operations.
    async fn resolve_blocking(
        &self,
        well_id: WellId,
        owner: OwnerId,
    ) -> Result<Well, ServiceError> {
        run_blocking(&self.store, move |s| s.find_well(well_id, owner))
            .await?
            .ok_or(ServiceError::WellNotFound)
    }

    /// Reject non-numeric bounds. `start > end` passes and yields no rows.
    fn checked(range: DepthRange) -> Result<DepthRange, ServiceError> {
        if range.is_finite() {
            Ok(range)
        } else {
            Err(ServiceError::InvalidRange(format!("[{}, {}]", range.start, range.end)))
        }
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Store the raw bytes, parse them and ingest the result.
    pub fn upload(
        &self,
        owner: OwnerId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadReceipt, ServiceError> {
        let limit = self.config.ingest.max_file_bytes;
        if bytes.len() > limit {
            return Err(ServiceError::FileTooLarge {
                size: bytes.len(),
                limit,
            });
        }

        let raw_ref = store_with_fallback(self.raw_files.as_ref(), owner, file_name, bytes);
        let text = String::from_utf8_lossy(bytes);
        let doc = parse_las(&text);
        if doc.dropped_lines > 0 {
            warn!(file = file_name, dropped = doc.dropped_lines, "Skipped unparseable lines");
        }

        let curves_count = doc.curves.len();
        let well = self.ingest_document(owner, &doc, Some(raw_ref))?;
        let data_rows_count = doc.rows.len();

        Ok(UploadReceipt {
            well_id: well.id,
            well_name: well.well_name,
            curves_count,
            data_rows_count,
            depth_range: DepthSpan {
                start: well.start_depth,
                stop: well.stop_depth,
            },
        })
    }

    pub fn ingest_document(
        &self,
        owner: OwnerId,
        doc: &LasDocument,
        raw_file_ref: Option<String>,
    ) -> Result<Well, ServiceError> {
        Ok(ingest(
            self.store.as_ref(),
            doc,
            owner,
            raw_file_ref,
            self.config.ingest.row_batch_size,
        )?)
    }

    // ------------------------------------------------------------------
    // Wells and curves
    // ------------------------------------------------------------------

    pub fn list_wells(&self, owner: OwnerId) -> Result<Vec<WellSummary>, ServiceError> {
        Ok(self
            .store
            .list_wells(owner)?
            .iter()
            .map(Well::summary)
            .collect())
    }

    pub fn get_well(&self, well_id: WellId, owner: OwnerId) -> Result<Well, ServiceError> {
        self.resolve(well_id, owner)
    }

    /// Delete a well with its curves and rows and evict its cached contexts.
    pub fn delete_well(&self, well_id: WellId, owner: OwnerId) -> Result<(), ServiceError> {
        if !self.store.delete_well(well_id, owner)? {
            return Err(ServiceError::WellNotFound);
        }
        let evicted = self.cache.invalidate_well(well_id);
        info!(well_id, evicted, "Well deleted");
        Ok(())
    }

    pub fn curves(&self, well_id: WellId, owner: OwnerId) -> Result<Vec<Curve>, ServiceError> {
        let well = self.resolve(well_id, owner)?;
        Ok(self.store.curves(well.id)?)
    }

    // ------------------------------------------------------------------
    // Query, aggregation, sampling
    // ------------------------------------------------------------------

    pub fn query_range(
        &self,
        well_id: WellId,
        owner: OwnerId,
        curves: &[String],
        bounds: DepthBounds,
    ) -> Result<RangeResponse, ServiceError> {
        if curves.is_empty() {
            return Err(ServiceError::MissingCurves);
        }
        let well = self.resolve(well_id, owner)?;
        let range = Self::checked(bounds.resolve(&well))?;
        Ok(query_range(self.store.as_ref(), &well, curves, range)?)
    }

    /// Pushdown statistics per curve. An empty curve list means every
    /// non-depth curve of the well. Curves whose computation fails are omitted.
    pub async fn aggregate(
        &self,
        well_id: WellId,
        owner: OwnerId,
        curves: &[String],
        bounds: DepthBounds,
    ) -> Result<StatsMap, ServiceError> {
        let well = self.resolve_blocking(well_id, owner).await?;
        let range = Self::checked(bounds.resolve(&well))?;
        let curves = if curves.is_empty() {
            let id = well.id;
            run_blocking(&self.store, move |s| s.curves(id))
                .await?
                .into_iter()
                .filter(|c| !c.is_depth_index())
                .map(|c| c.mnemonic)
                .collect()
        } else {
            curves.to_vec()
        };
        Ok(aggregate_curves(Arc::clone(&self.store), &well, &curves, range, self.fan_out()).await)
    }

    /// Range query reduced to at most `max_count` evenly strided rows
    pub fn sample(
        &self,
        well_id: WellId,
        owner: OwnerId,
        curves: &[String],
        bounds: DepthBounds,
        max_count: usize,
    ) -> Result<Vec<ProjectedRow>, ServiceError> {
        let response = self.query_range(well_id, owner, curves, bounds)?;
        Ok(downsample(&response.data, max_count))
    }

    // ------------------------------------------------------------------
    // Narrative
    // ------------------------------------------------------------------

    /// Statistics and bounded sample for an interpretation request.
    pub fn prepare_interpretation(
        &self,
        owner: OwnerId,
        request: &InterpretRequest,
    ) -> Result<InterpretationPayload, ServiceError> {
        let range = Self::interpretation_range(request)?;
        let well = self.resolve(request.well_id, owner)?;
        let rows = self.store.rows_in_range(well.id, range)?;
        self.assemble_payload(well, request, range, &rows)
    }

    fn interpretation_range(request: &InterpretRequest) -> Result<DepthRange, ServiceError> {
        if request.curves.is_empty() {
            return Err(ServiceError::MissingCurves);
        }
        let (Some(start), Some(end)) = (request.start_depth, request.end_depth) else {
            return Err(ServiceError::InvalidRange(
                "startDepth and endDepth are required".to_string(),
            ));
        };
        Self::checked(DepthRange::new(start, end))
    }

    fn assemble_payload(
        &self,
        well: Well,
        request: &InterpretRequest,
        range: DepthRange,
        rows: &[DepthRow],
    ) -> Result<InterpretationPayload, ServiceError> {
        if rows.is_empty() {
            return Err(ServiceError::EmptyRange);
        }
        let projected = project_rows(rows, &request.curves, well.null_value);
        let stats = compute_statistics(&projected, &request.curves);
        let sample = downsample(&projected, self.config.interpretation.max_sample_rows);

        Ok(InterpretationPayload {
            well_id: well.id,
            well_name: well.well_name,
            depth_range: range,
            curves: request.curves.clone(),
            stats,
            sample,
            total_rows: projected.len(),
        })
    }

    pub async fn interpret(
        &self,
        owner: OwnerId,
        request: &InterpretRequest,
        backend: &dyn NarrativeBackend,
    ) -> Result<InterpretationResponse, ServiceError> {
        let range = Self::interpretation_range(request)?;
        let well = self.resolve_blocking(request.well_id, owner).await?;
        let id = well.id;
        let rows = run_blocking(&self.store, move |s| s.rows_in_range(id, range)).await?;
        let payload = self.assemble_payload(well, request, range, &rows)?;
        let prompt = analysis_prompt(&payload)?;
        info!(
            well_id = payload.well_id,
            curves = payload.curves.len(),
            rows = payload.total_rows,
            backend = backend.backend_name(),
            "Requesting interpretation"
        );
        let interpretation = backend
            .generate(&prompt)
            .await
            .map_err(ServiceError::Narrative)?;

        Ok(InterpretationResponse {
            well_id: payload.well_id,
            curves: payload.curves,
            depth_range: payload.depth_range,
            stats: payload.stats,
            interpretation,
        })
    }

    /// Cached context for `(consumer, well)`, rebuilt when missing or stale.
    pub async fn context(
        &self,
        owner: OwnerId,
        consumer: &str,
        well_id: WellId,
    ) -> Result<Arc<WellContext>, ServiceError> {
        if let Some(hit) = self.cache.get(consumer, well_id) {
            return if hit.owner_id == owner {
                Ok(hit)
            } else {
                Err(ServiceError::WellNotFound)
            };
        }
        let sample_rows = self.config.context.sample_rows;
        let options = self.fan_out();
        self.cache
            .get_or_compute(consumer, well_id, || async {
                let well = self.resolve_blocking(well_id, owner).await?;
                Ok::<_, ServiceError>(
                    build_context(Arc::clone(&self.store), &well, sample_rows, options).await?,
                )
            })
            .await
    }

    /// Point a chat session at a well and return its greeting.
    pub async fn select_well(
        &self,
        owner: OwnerId,
        session: &mut ChatSession,
        well_id: WellId,
    ) -> Result<String, ServiceError> {
        let context = self.context(owner, session.consumer(), well_id).await?;
        Ok(session.select(context))
    }

    /// New chat session configured from `[chat]`
    pub fn chat_session(&self, consumer: impl Into<String>) -> ChatSession {
        ChatSession::new(consumer, self.config.chat.clone())
    }
}
