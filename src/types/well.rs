//! Well record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::acquisition::HeaderEntry;

/// Sentinel used when the well header carries no usable `NULL` entry.
pub const DEFAULT_NULL_VALUE: f64 = -9999.0;

/// Nominal sample interval used when the header carries no usable `STEP`.
pub const DEFAULT_STEP: f64 = 1.0;

/// Version tag recorded when the `~V` section carries no `VERS` entry.
pub const DEFAULT_LAS_VERSION: &str = "2.0";

/// Well name recorded when the header carries no `WELL` entry.
pub const UNKNOWN_WELL_NAME: &str = "Unknown";

/// Store-assigned well identifier
pub type WellId = u64;

/// Identity of the account that owns a well
pub type OwnerId = u64;

/// One ingested measurement run.
///
/// Created atomically at the end of ingestion together with its curves and
/// rows. `start_depth <= stop_depth` and `step > 0` hold for every stored well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Well {
    pub id: WellId,
    pub owner_id: OwnerId,
    pub well_name: String,
    pub field: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub service_company: Option<String>,
    pub date_analysed: Option<String>,
    pub start_depth: f64,
    pub stop_depth: f64,
    pub step: f64,
    pub null_value: f64,
    /// Raw-file storage reference (object key or local fallback)
    pub raw_file_ref: Option<String>,
    pub las_version: String,
    /// Full `~W` section, preserved verbatim
    pub metadata: BTreeMap<String, HeaderEntry>,
    pub created_at: DateTime<Utc>,
}

impl Well {
    pub fn summary(&self) -> WellSummary {
        WellSummary {
            id: self.id,
            well_name: self.well_name.clone(),
            field: self.field.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            country: self.country.clone(),
            start_depth: self.start_depth,
            stop_depth: self.stop_depth,
            step: self.step,
            created_at: self.created_at,
        }
    }
}

/// Everything needed to create a well, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWell {
    pub owner_id: OwnerId,
    pub well_name: String,
    pub field: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub service_company: Option<String>,
    pub date_analysed: Option<String>,
    pub start_depth: f64,
    pub stop_depth: f64,
    pub step: f64,
    pub null_value: f64,
    pub raw_file_ref: Option<String>,
    pub las_version: String,
    pub metadata: BTreeMap<String, HeaderEntry>,
}

impl NewWell {
    pub fn into_well(self, id: WellId, created_at: DateTime<Utc>) -> Well {
        Well {
            id,
            owner_id: self.owner_id,
            well_name: self.well_name,
            field: self.field,
            company: self.company,
            location: self.location,
            country: self.country,
            service_company: self.service_company,
            date_analysed: self.date_analysed,
            start_depth: self.start_depth,
            stop_depth: self.stop_depth,
            step: self.step,
            null_value: self.null_value,
            raw_file_ref: self.raw_file_ref,
            las_version: self.las_version,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// Listing view of a well (no header blob)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellSummary {
    pub id: WellId,
    pub well_name: String,
    pub field: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub start_depth: f64,
    pub stop_depth: f64,
    pub step: f64,
    pub created_at: DateTime<Utc>,
}

/// Sentinel comparison shared by every read path.
///
/// Exact equality: sentinels are written verbatim by logging software, so a
/// value either is the sentinel or it is a measurement.
#[allow(clippy::float_cmp)]
pub fn is_null_sentinel(value: f64, null_value: f64) -> bool {
    value == null_value
}
