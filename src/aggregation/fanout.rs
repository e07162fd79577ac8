//! Batched per-curve statistics pushed down to the store
//!
//! Curves are evaluated in groups of `batch_width`. Every curve in a group
//! runs concurrently on the blocking pool; the next group starts only after
//! the current one has fully resolved. A failed or timed-out curve is
//! dropped from the result map and logged.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::statistics::StatsMap;
use crate::config::defaults;
use crate::storage::{DepthStore, StoreError};
use crate::types::{CurveStats, DepthRange, Well, WellId};

/// Why one curve's statistics are missing
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("curve statistics timed out after {0:?}")]
    Timeout(Duration),
    #[error("curve statistics task failed: {0}")]
    Join(String),
}

/// Fan-out limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutOptions {
    pub batch_width: usize,
    pub curve_timeout: Duration,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            batch_width: defaults::AGGREGATION_BATCH_WIDTH,
            curve_timeout: Duration::from_secs(defaults::CURVE_STATS_TIMEOUT_SECS),
        }
    }
}

pub type CurveOutcome = (String, Result<CurveStats, AggregateError>);

/// Evaluate every curve and keep each outcome, in request order.
pub async fn evaluate_curves(
    store: Arc<dyn DepthStore>,
    well_id: WellId,
    null_value: f64,
    curves: &[String],
    range: DepthRange,
    options: FanOutOptions,
) -> Vec<CurveOutcome> {
    let width = options.batch_width.max(1);
    let mut outcomes = Vec::with_capacity(curves.len());

    for (batch_no, batch) in curves.chunks(width).enumerate() {
        let mut tasks = JoinSet::new();
        for (slot, curve) in batch.iter().enumerate() {
            let store = Arc::clone(&store);
            let curve = curve.clone();
            let limit = options.curve_timeout;
            tasks.spawn(async move {
                let name = curve.clone();
                let work = tokio::task::spawn_blocking(move || {
                    store.curve_stats(well_id, &curve, null_value, range)
                });
                let outcome = match tokio::time::timeout(limit, work).await {
                    Ok(Ok(Ok(stats))) => Ok(stats),
                    Ok(Ok(Err(e))) => Err(AggregateError::Store(e)),
                    Ok(Err(e)) => Err(AggregateError::Join(e.to_string())),
                    Err(_) => Err(AggregateError::Timeout(limit)),
                };
                (slot, name, outcome)
            });
        }

        let mut resolved: Vec<Option<CurveOutcome>> = batch.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, name, outcome)) => {
                    if let Some(cell) = resolved.get_mut(slot) {
                        *cell = Some((name, outcome));
                    }
                }
                Err(e) => warn!(batch = batch_no, "Curve statistics task aborted: {}", e),
            }
        }
        debug!(batch = batch_no, curves = batch.len(), "Aggregation batch resolved");
        outcomes.extend(resolved.into_iter().flatten());
    }

    outcomes
}

/// Statistics for `curves` over `range`; curves that fail are omitted.
pub async fn aggregate_curves(
    store: Arc<dyn DepthStore>,
    well: &Well,
    curves: &[String],
    range: DepthRange,
    options: FanOutOptions,
) -> StatsMap {
    let outcomes =
        evaluate_curves(store, well.id, well.null_value, curves, range, options).await;

    let mut stats = StatsMap::new();
    for (curve, outcome) in outcomes {
        match outcome {
            Ok(s) => {
                stats.insert(curve, s);
            }
            Err(e) => {
                warn!(well_id = well.id, curve = %curve, "Omitting curve from aggregate: {}", e);
            }
        }
    }
    stats
}
