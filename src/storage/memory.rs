//! In-memory depth-series store
//!
//! Same contract as the sled store, held behind one `RwLock` so a well and
//! all its rows appear in a single write. Not durable.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::depth_store::{DepthStore, StoreError, WellBundle};
use crate::types::{
    curve_value, Curve, CurveStats, DepthRange, DepthRow, OwnerId, StatsAccumulator, Well, WellId,
};

struct StoredWell {
    well: Well,
    curves: Vec<Curve>,
    /// Sorted by depth, stable for equal depths
    rows: Vec<DepthRow>,
}

/// In-memory store for tests and minimal deployments
pub struct InMemoryDepthStore {
    wells: RwLock<BTreeMap<WellId, StoredWell>>,
    next_id: AtomicU64,
}

impl InMemoryDepthStore {
    pub fn new() -> Self {
        Self {
            wells: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn with_well<T>(
        &self,
        well_id: WellId,
        f: impl FnOnce(&StoredWell) -> T,
    ) -> Result<Option<T>, StoreError> {
        let wells = self.wells.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(wells.get(&well_id).map(f))
    }

    fn rows_within(stored: &StoredWell, range: DepthRange) -> impl Iterator<Item = &DepthRow> {
        let valid = range.is_valid();
        stored
            .rows
            .iter()
            .filter(move |r| valid && range.contains(r.depth))
    }
}

impl Default for InMemoryDepthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthStore for InMemoryDepthStore {
    fn create_well(&self, bundle: WellBundle, _row_batch_size: usize) -> Result<Well, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let well = bundle.well.into_well(id, Utc::now());
        let mut curves: Vec<Curve> = bundle.curves.into_iter().map(|c| c.into_curve(id)).collect();
        curves.sort_by_key(|c| c.curve_index);
        let mut rows = bundle.rows;
        rows.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let mut wells = self.wells.write().map_err(|_| StoreError::LockPoisoned)?;
        wells.insert(
            id,
            StoredWell {
                well: well.clone(),
                curves,
                rows,
            },
        );
        Ok(well)
    }

    fn find_well(&self, well_id: WellId, owner: OwnerId) -> Result<Option<Well>, StoreError> {
        Ok(self
            .with_well(well_id, |s| s.well.clone())?
            .filter(|w| w.owner_id == owner))
    }

    fn list_wells(&self, owner: OwnerId) -> Result<Vec<Well>, StoreError> {
        let wells = self.wells.read().map_err(|_| StoreError::LockPoisoned)?;
        // Ids ascend with creation, so reverse id order is newest first.
        Ok(wells
            .values()
            .rev()
            .filter(|s| s.well.owner_id == owner)
            .map(|s| s.well.clone())
            .collect())
    }

    fn delete_well(&self, well_id: WellId, owner: OwnerId) -> Result<bool, StoreError> {
        let mut wells = self.wells.write().map_err(|_| StoreError::LockPoisoned)?;
        match wells.get(&well_id) {
            Some(s) if s.well.owner_id == owner => {
                wells.remove(&well_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn curves(&self, well_id: WellId) -> Result<Vec<Curve>, StoreError> {
        Ok(self
            .with_well(well_id, |s| s.curves.clone())?
            .unwrap_or_default())
    }

    fn rows_in_range(
        &self,
        well_id: WellId,
        range: DepthRange,
    ) -> Result<Vec<DepthRow>, StoreError> {
        Ok(self
            .with_well(well_id, |s| Self::rows_within(s, range).cloned().collect())?
            .unwrap_or_default())
    }

    fn first_rows(&self, well_id: WellId, limit: usize) -> Result<Vec<DepthRow>, StoreError> {
        Ok(self
            .with_well(well_id, |s| s.rows.iter().take(limit).cloned().collect())?
            .unwrap_or_default())
    }

    fn row_count(&self, well_id: WellId) -> Result<usize, StoreError> {
        Ok(self.with_well(well_id, |s| s.rows.len())?.unwrap_or(0))
    }

    fn curve_stats(
        &self,
        well_id: WellId,
        curve: &str,
        null_value: f64,
        range: DepthRange,
    ) -> Result<CurveStats, StoreError> {
        let stats = self.with_well(well_id, |s| {
            let mut acc = StatsAccumulator::default();
            for row in Self::rows_within(s, range) {
                if let Some(v) = curve_value(&row.curve_values, curve, null_value) {
                    acc.push(v);
                }
            }
            acc.finish()
        })?;
        Ok(stats.unwrap_or_else(CurveStats::empty))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
