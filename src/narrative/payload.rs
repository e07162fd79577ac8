//! Interpretation payload and analysis prompt

use serde::Serialize;

use crate::aggregation::StatsMap;
use crate::types::{DepthRange, ProjectedRow, WellId};

/// Deterministic summary handed to the narrative backend for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationPayload {
    pub well_id: WellId,
    pub well_name: String,
    pub depth_range: DepthRange,
    pub curves: Vec<String>,
    pub stats: StatsMap,
    /// Bounded, evenly strided sample of the interval
    pub sample: Vec<ProjectedRow>,
    pub total_rows: usize,
}

/// Render the one-shot analysis prompt.
pub fn analysis_prompt(payload: &InterpretationPayload) -> Result<String, serde_json::Error> {
    let stats = serde_json::to_string_pretty(&payload.stats)?;
    let sample = serde_json::to_string_pretty(&payload.sample)?;

    Ok(format!(
        "You are a well-log analyst interpreting subsurface measurements.\n\
         \n\
         ## Well\n\
         - Name: {name}\n\
         - Interval: {start} to {end}\n\
         - Rows in interval: {total}\n\
         - Curves: {curves}\n\
         \n\
         ## Statistics over the interval\n\
         {stats}\n\
         \n\
         ## Sample rows ({sample_len} of {total}, evenly strided)\n\
         {sample}\n\
         \n\
         ## Respond with\n\
         1. Trends per curve across the interval\n\
         2. Anomalies with approximate depths\n\
         3. Candidate zones and the curve signatures behind them\n\
         4. Notable relationships between curves\n\
         5. Suggested follow-up curves or intervals\n\
         \n\
         Use markdown headings and bullet points.",
        name = payload.well_name,
        start = payload.depth_range.start,
        end = payload.depth_range.end,
        total = payload.total_rows,
        curves = payload.curves.join(", "),
        stats = stats,
        sample_len = payload.sample.len(),
        sample = sample,
    ))
}
