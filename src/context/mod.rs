//! Context Cache
//!
//! A `WellContext` bundles what a conversational consumer needs about one
//! well: the summary record, its curves, pushdown statistics over the whole
//! well and a short depth-ordered sample. `ContextCache` memoizes contexts per
//! `(consumer, well)` for a fixed TTL. Serving from the cache never changes
//! results, only latency.

mod cache;

pub use cache::{Clock, ContextCache, ManualClock, SystemClock};

use serde::Serialize;
use std::sync::Arc;

use crate::aggregation::{aggregate_curves, FanOutOptions, StatsMap};
use crate::query::project_rows;
use crate::storage::{run_blocking, DepthStore, StoreError};
use crate::types::{Curve, DepthRange, OwnerId, ProjectedRow, Well, WellSummary};

/// Memoized summary of one well
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellContext {
    pub owner_id: OwnerId,
    pub well: WellSummary,
    pub curves: Vec<Curve>,
    pub statistics: StatsMap,
    /// First rows by depth, projected onto every curve
    pub sample: Vec<ProjectedRow>,
    pub total_rows: usize,
    /// Interval the statistics cover
    pub range: DepthRange,
}

impl WellContext {
    /// Non-depth curve mnemonics in position order
    pub fn value_curves(&self) -> Vec<String> {
        self.curves
            .iter()
            .filter(|c| !c.is_depth_index())
            .map(|c| c.mnemonic.clone())
            .collect()
    }
}

/// Build a fresh context for `well` from the store.
pub async fn build_context(
    store: Arc<dyn DepthStore>,
    well: &Well,
    sample_rows: usize,
    options: FanOutOptions,
) -> Result<WellContext, StoreError> {
    let well_id = well.id;
    let (curves, total_rows, first) = run_blocking(&store, move |s| {
        Ok((s.curves(well_id)?, s.row_count(well_id)?, s.first_rows(well_id, sample_rows)?))
    })
    .await?;
    let names: Vec<String> = curves
        .iter()
        .filter(|c| !c.is_depth_index())
        .map(|c| c.mnemonic.clone())
        .collect();

    let sample = project_rows(&first, &names, well.null_value);

    let range = DepthRange::ALL;
    let statistics = aggregate_curves(store, well, &names, range, options).await;

    Ok(WellContext {
        owner_id: well.owner_id,
        well: well.summary(),
        curves,
        statistics,
        sample,
        total_rows,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::parse_las;
    use crate::storage::{ingest, InMemoryDepthStore};

    #[tokio::test]
    async fn test_build_context() {
        let store: Arc<dyn DepthStore> = Arc::new(InMemoryDepthStore::new());
        let doc = parse_las(
            "~W\nWELL. CTX-1 :\nNULL. -9999 :\n~C\nDEPT.M :\nGR.API :\n~A\n1 10\n2 -9999\n3 30\n",
        );
        let well = ingest(store.as_ref(), &doc, 1, None, 500).unwrap();

        let ctx = build_context(store, &well, 2, FanOutOptions::default()).await.unwrap();
        assert_eq!(ctx.well.well_name, "CTX-1");
        assert_eq!(ctx.total_rows, 3);
        assert_eq!(ctx.sample.len(), 2);
        assert_eq!(ctx.sample[1].get("GR"), None);
        assert_eq!(ctx.value_curves(), vec!["GR"]);
        assert!(!ctx.statistics.contains_key("DEPT"));
        assert_eq!(ctx.statistics["GR"].mean, Some(20.0));
        assert_eq!(ctx.statistics["GR"].count, 2);
    }
}
