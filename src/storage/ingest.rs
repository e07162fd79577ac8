//! Ingestion: parsed LAS document → persisted well
//!
//! Maps header entries onto typed well attributes, then hands the whole
//! well/curves/rows bundle to the store as one transaction.

use tracing::{info, warn};

use super::depth_store::{DepthStore, StoreError, WellBundle};
use crate::acquisition::LasDocument;
use crate::types::{
    DepthRow, NewCurve, NewWell, OwnerId, Well, DEFAULT_LAS_VERSION, DEFAULT_NULL_VALUE,
    DEFAULT_STEP, UNKNOWN_WELL_NAME,
};

/// Ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no curve definitions found in ~C section")]
    NoCurves,
    #[error("no valid data rows found in ~A section")]
    NoRows,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Rejections the uploader can fix by correcting the file
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::NoCurves | Self::NoRows)
    }
}

/// Build the store bundle for a parsed document.
///
/// Fails before anything is written when the document has no curves or no rows.
pub fn build_bundle(
    doc: &LasDocument,
    owner: OwnerId,
    raw_file_ref: Option<String>,
) -> Result<WellBundle, IngestError> {
    if doc.curves.is_empty() {
        return Err(IngestError::NoCurves);
    }
    if doc.rows.is_empty() {
        return Err(IngestError::NoRows);
    }

    let text = |mnemonic: &str| {
        doc.well_entry(mnemonic)
            .and_then(|e| e.text_value())
            .map(str::to_string)
    };
    let number = |mnemonic: &str| doc.well_entry(mnemonic).and_then(|e| e.numeric_value());

    let start = number("STRT").unwrap_or(0.0);
    let stop = number("STOP").unwrap_or(0.0);
    let (start_depth, stop_depth) = if start <= stop { (start, stop) } else { (stop, start) };

    let step = number("STEP")
        .map(f64::abs)
        .filter(|s| *s > 0.0)
        .unwrap_or(DEFAULT_STEP);
    let null_value = number("NULL")
        .filter(|n| *n != 0.0)
        .unwrap_or(DEFAULT_NULL_VALUE);

    let las_version = doc
        .version
        .get("VERS")
        .and_then(|e| e.text_value())
        .unwrap_or(DEFAULT_LAS_VERSION)
        .to_string();

    let well = NewWell {
        owner_id: owner,
        well_name: text("WELL").unwrap_or_else(|| UNKNOWN_WELL_NAME.to_string()),
        field: text("FLD"),
        company: text("COMP"),
        location: text("LOC"),
        country: text("CTRY"),
        service_company: text("SRVC"),
        date_analysed: text("DATE"),
        start_depth,
        stop_depth,
        step,
        null_value,
        raw_file_ref,
        las_version,
        metadata: doc.well.clone(),
    };

    let curves = doc
        .curves
        .iter()
        .map(|c| NewCurve {
            mnemonic: c.mnemonic.clone(),
            unit: non_empty(&c.unit),
            description: non_empty(&c.description),
            curve_index: c.index,
        })
        .collect();

    let rows = doc
        .rows
        .iter()
        .filter_map(|r| doc.split_row(r))
        .map(|(depth, values)| DepthRow::new(depth, values))
        .collect();

    Ok(WellBundle { well, curves, rows })
}

/// Persist a parsed document as a new well owned by `owner`.
pub fn ingest(
    store: &dyn DepthStore,
    doc: &LasDocument,
    owner: OwnerId,
    raw_file_ref: Option<String>,
    row_batch_size: usize,
) -> Result<Well, IngestError> {
    let bundle = match build_bundle(doc, owner, raw_file_ref) {
        Ok(b) => b,
        Err(e) => {
            warn!(
                owner,
                curves = doc.curves.len(),
                rows = doc.rows.len(),
                "Rejected ingestion: {}",
                e
            );
            return Err(e);
        }
    };

    let curve_count = bundle.curves.len();
    let row_count = bundle.rows.len();
    info!(
        owner,
        well_name = %bundle.well.well_name,
        curves = curve_count,
        rows = row_count,
        backend = store.backend_name(),
        "Ingesting well"
    );

    match store.create_well(bundle, row_batch_size) {
        Ok(well) => {
            info!(well_id = well.id, "Well ingested");
            Ok(well)
        }
        Err(e) => {
            warn!("Ingestion rolled back: {}", e);
            Err(e.into())
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
