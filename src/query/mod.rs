//! Range Query Engine
//!
//! Retrieves a well's rows inside a depth interval and projects them onto the
//! requested curve list. Missing entries and the well's null sentinel both
//! project to `null`.

use serde::{Deserialize, Serialize};

use crate::storage::{DepthStore, StoreError};
use crate::types::{DepthRange, DepthRow, ProjectedRow, Well, WellId};

/// Range query result in its wire shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResponse {
    pub well_id: WellId,
    pub curves: Vec<String>,
    pub start_depth: f64,
    pub end_depth: f64,
    pub total_rows: usize,
    pub data: Vec<ProjectedRow>,
}

/// Requested bounds; `None` falls back to the well's own interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthBounds {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl DepthBounds {
    pub const fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    pub fn resolve(&self, well: &Well) -> DepthRange {
        DepthRange::new(
            self.start.unwrap_or(well.start_depth),
            self.end.unwrap_or(well.stop_depth),
        )
    }
}

/// Split a comma-separated curve list, dropping blanks.
pub fn parse_curve_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Project already-fetched rows onto `curves`.
pub fn project_rows<S: AsRef<str>>(
    rows: &[DepthRow],
    curves: &[S],
    null_value: f64,
) -> Vec<ProjectedRow> {
    rows.iter().map(|r| r.project(curves, null_value)).collect()
}

/// Rows of `well` within `range`, projected onto `curves`, ascending by depth.
///
/// The caller has already resolved `well` for the requesting owner.
pub fn query_range(
    store: &dyn DepthStore,
    well: &Well,
    curves: &[String],
    range: DepthRange,
) -> Result<RangeResponse, StoreError> {
    let rows = store.rows_in_range(well.id, range)?;
    let data = project_rows(&rows, curves, well.null_value);

    tracing::debug!(
        well_id = well.id,
        curves = curves.len(),
        rows = data.len(),
        "Range query [{}, {}]",
        range.start,
        range.end
    );

    Ok(RangeResponse {
        well_id: well.id,
        curves: curves.to_vec(),
        start_depth: range.start,
        end_depth: range.end,
        total_rows: data.len(),
        data,
    })
}
