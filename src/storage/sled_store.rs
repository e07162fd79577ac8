//! Sled-backed depth-series store
//!
//! Three trees inside one sled database:
//! - `wells`:  `well_id` → JSON `Well`
//! - `curves`: `well_id | curve_index` → JSON `Curve`
//! - `rows`:   `well_id | depth | seq` → JSON sparse curve values
//!
//! Well creation and deletion run as multi-tree sled transactions so no reader
//! ever sees a partially written well.

use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Batch, Db, IVec, Tree};
use std::path::Path;
use tracing::{debug, info, trace};

use super::depth_store::{DepthStore, StoreError, WellBundle};
use super::keys;
use crate::types::{
    curve_value, Curve, CurveStats, CurveValues, DepthRange, DepthRow, NewCurve, OwnerId,
    StatsAccumulator, Well, WellId,
};

const WELLS_TREE: &str = "wells";
const CURVES_TREE: &str = "curves";
const ROWS_TREE: &str = "rows";

type Entry = (Vec<u8>, Vec<u8>);

/// A well serialized ahead of its transaction, which sled may retry
struct StagedWell {
    well_key: Vec<u8>,
    well_bytes: Vec<u8>,
    curve_entries: Vec<Entry>,
    row_entries: Vec<Entry>,
}

impl StagedWell {
    fn new(well: &Well, curves: Vec<NewCurve>, rows: &[DepthRow]) -> Result<Self, StoreError> {
        let well_id = well.id;
        let curve_entries = curves
            .into_iter()
            .map(|c| {
                let curve = c.into_curve(well_id);
                let key = keys::curve_key(well_id, curve.curve_index);
                serde_json::to_vec(&curve).map(|v| (key.to_vec(), v))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let row_entries = rows
            .iter()
            .zip(0u64..)
            .map(|(row, seq)| {
                let key = keys::row_key(well_id, row.depth, seq);
                serde_json::to_vec(&row.curve_values).map(|v| (key.to_vec(), v))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            well_key: keys::well_key(well_id).to_vec(),
            well_bytes: serde_json::to_vec(well)?,
            curve_entries,
            row_entries,
        })
    }
}

/// Depth-series store on an embedded sled database
#[derive(Clone)]
pub struct SledDepthStore {
    db: Db,
    wells: Tree,
    curves: Tree,
    rows: Tree,
}

impl SledDepthStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        info!("Depth store opened at {:?}", path_ref);
        Self::from_db(db)
    }

    /// Open a throwaway database (removed on drop)
    pub fn open_temp() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        Ok(Self {
            wells: db.open_tree(WELLS_TREE)?,
            curves: db.open_tree(CURVES_TREE)?,
            rows: db.open_tree(ROWS_TREE)?,
            db,
        })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn load_well(&self, well_id: WellId) -> Result<Option<Well>, StoreError> {
        match self.wells.get(keys::well_key(well_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn decode_row(key: &IVec, value: &IVec) -> Result<DepthRow, StoreError> {
        let depth_bytes: [u8; 8] = key
            .get(8..16)
            .and_then(|b| b.try_into().ok())
            .ok_or(StoreError::CorruptKey { tree: ROWS_TREE })?;
        let curve_values: CurveValues = serde_json::from_slice(value)?;
        Ok(DepthRow::new(keys::decode_depth(depth_bytes), curve_values))
    }

    fn range_iter(&self, well_id: WellId, range: DepthRange) -> Option<sled::Iter> {
        if !range.is_valid() {
            return None;
        }
        let (lo, hi) = keys::row_range(well_id, range.start, range.end);
        Some(self.rows.range(lo..=hi))
    }

    /// Write a staged well in one transaction across all three trees.
    ///
    /// `on_batch` runs after each row batch is applied; an error from it
    /// aborts the transaction and nothing of the well remains.
    fn commit_well(
        &self,
        staged: &StagedWell,
        batch_size: usize,
        on_batch: impl Fn(usize) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        (&self.wells, &self.curves, &self.rows)
            .transaction(|(wells, curves, rows)| {
                wells.insert(staged.well_key.as_slice(), staged.well_bytes.as_slice())?;

                let mut curve_batch = Batch::default();
                for (k, v) in &staged.curve_entries {
                    curve_batch.insert(k.as_slice(), v.as_slice());
                }
                curves.apply_batch(&curve_batch)?;

                for (n, chunk) in staged.row_entries.chunks(batch_size).enumerate() {
                    let mut row_batch = Batch::default();
                    for (k, v) in chunk {
                        row_batch.insert(k.as_slice(), v.as_slice());
                    }
                    rows.apply_batch(&row_batch)?;
                    on_batch(n).map_err(ConflictableTransactionError::Abort)?;
                }

                Ok::<(), ConflictableTransactionError<StoreError>>(())
            })
            .map_err(Self::unwrap_tx)
    }

    fn unwrap_tx(err: TransactionError<StoreError>) -> StoreError {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Database(e.to_string()),
        }
    }
}

impl DepthStore for SledDepthStore {
    fn create_well(&self, bundle: WellBundle, row_batch_size: usize) -> Result<Well, StoreError> {
        let well_id: WellId = self.db.generate_id()? + 1;
        let well = bundle.well.into_well(well_id, Utc::now());

        // Serialize outside the transaction: the closure may be retried.
        let staged = StagedWell::new(&well, bundle.curves, &bundle.rows)?;
        let batch_size = row_batch_size.max(1);
        self.commit_well(&staged, batch_size, |batch| {
            trace!(well_id, batch, "Row batch staged");
            Ok(())
        })?;

        debug!(
            well_id,
            curves = staged.curve_entries.len(),
            rows = staged.row_entries.len(),
            batches = staged.row_entries.len().div_ceil(batch_size),
            "Committed well"
        );

        Ok(well)
    }

    fn find_well(&self, well_id: WellId, owner: OwnerId) -> Result<Option<Well>, StoreError> {
        Ok(self.load_well(well_id)?.filter(|w| w.owner_id == owner))
    }

    fn list_wells(&self, owner: OwnerId) -> Result<Vec<Well>, StoreError> {
        let mut wells = Vec::new();
        for item in self.wells.iter() {
            let (_key, value) = item?;
            let well: Well = serde_json::from_slice(&value)?;
            if well.owner_id == owner {
                wells.push(well);
            }
        }
        wells.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(wells)
    }

    fn delete_well(&self, well_id: WellId, owner: OwnerId) -> Result<bool, StoreError> {
        if self.find_well(well_id, owner)?.is_none() {
            return Ok(false);
        }

        let prefix = keys::well_key(well_id);
        let curve_keys = self
            .curves
            .scan_prefix(prefix)
            .keys()
            .collect::<Result<Vec<_>, _>>()?;
        let row_keys = self
            .rows
            .scan_prefix(prefix)
            .keys()
            .collect::<Result<Vec<_>, _>>()?;

        (&self.wells, &self.curves, &self.rows)
            .transaction(|(wells, curves, rows)| {
                wells.remove(&prefix[..])?;
                let mut curve_batch = Batch::default();
                for k in &curve_keys {
                    curve_batch.remove(k.clone());
                }
                curves.apply_batch(&curve_batch)?;
                let mut row_batch = Batch::default();
                for k in &row_keys {
                    row_batch.remove(k.clone());
                }
                rows.apply_batch(&row_batch)?;
                Ok::<(), ConflictableTransactionError<StoreError>>(())
            })
            .map_err(Self::unwrap_tx)?;

        info!(well_id, rows = row_keys.len(), "Deleted well");
        Ok(true)
    }

    fn curves(&self, well_id: WellId) -> Result<Vec<Curve>, StoreError> {
        self.curves
            .scan_prefix(keys::well_key(well_id))
            .values()
            .map(|v| Ok(serde_json::from_slice::<Curve>(&v?)?))
            .collect()
    }

    fn rows_in_range(
        &self,
        well_id: WellId,
        range: DepthRange,
    ) -> Result<Vec<DepthRow>, StoreError> {
        let Some(iter) = self.range_iter(well_id, range) else {
            return Ok(Vec::new());
        };
        iter.map(|item| {
            let (key, value) = item?;
            Self::decode_row(&key, &value)
        })
        .collect()
    }

    fn first_rows(&self, well_id: WellId, limit: usize) -> Result<Vec<DepthRow>, StoreError> {
        self.rows
            .scan_prefix(keys::well_key(well_id))
            .take(limit)
            .map(|item| {
                let (key, value) = item?;
                Self::decode_row(&key, &value)
            })
            .collect()
    }

    fn row_count(&self, well_id: WellId) -> Result<usize, StoreError> {
        let mut count = 0;
        for key in self.rows.scan_prefix(keys::well_key(well_id)).keys() {
            key?;
            count += 1;
        }
        Ok(count)
    }

    fn curve_stats(
        &self,
        well_id: WellId,
        curve: &str,
        null_value: f64,
        range: DepthRange,
    ) -> Result<CurveStats, StoreError> {
        let mut acc = StatsAccumulator::default();
        if let Some(iter) = self.range_iter(well_id, range) {
            for item in iter {
                let (_key, value) = item?;
                let values: CurveValues = serde_json::from_slice(&value)?;
                if let Some(v) = curve_value(&values, curve, null_value) {
                    acc.push(v);
                }
            }
        }
        Ok(acc.finish())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewCurve, NewWell};
    use std::collections::BTreeMap;

    fn bundle(owner: OwnerId, rows: &[(f64, f64)]) -> WellBundle {
        WellBundle {
            well: NewWell {
                owner_id: owner,
                well_name: "TEST-1".to_string(),
                field: None,
                company: None,
                location: None,
                country: None,
                service_company: None,
                date_analysed: None,
                start_depth: 100.0,
                stop_depth: 110.0,
                step: 1.0,
                null_value: -9999.0,
                raw_file_ref: None,
                las_version: "2.0".to_string(),
                metadata: BTreeMap::new(),
            },
            curves: vec![
                NewCurve {
                    mnemonic: "DEPT".to_string(),
                    unit: Some("M".to_string()),
                    description: None,
                    curve_index: 0,
                },
                NewCurve {
                    mnemonic: "GR".to_string(),
                    unit: Some("API".to_string()),
                    description: None,
                    curve_index: 1,
                },
            ],
            rows: rows
                .iter()
                .map(|(d, gr)| DepthRow::new(*d, [("GR".to_string(), *gr)].into_iter().collect()))
                .collect(),
        }
    }

    #[test]
    fn test_create_and_read_back() {
        let store = SledDepthStore::open_temp().unwrap();
        let well = store
            .create_well(bundle(1, &[(102.0, 60.0), (100.0, 50.0), (101.0, -9999.0)]), 2)
            .unwrap();

        assert_eq!(store.row_count(well.id).unwrap(), 3);
        let curves = store.curves(well.id).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].mnemonic, "DEPT");
        assert_eq!(curves[1].well_id, well.id);

        let rows = store.rows_in_range(well.id, DepthRange::new(100.0, 102.0)).unwrap();
        let depths: Vec<f64> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_ownership_is_enforced() {
        let store = SledDepthStore::open_temp().unwrap();
        let well = store.create_well(bundle(1, &[(100.0, 1.0)]), 500).unwrap();

        assert!(store.find_well(well.id, 1).unwrap().is_some());
        assert!(store.find_well(well.id, 2).unwrap().is_none());
        assert!(!store.delete_well(well.id, 2).unwrap());
        assert_eq!(store.row_count(well.id).unwrap(), 1);
    }

    #[test]
    fn test_delete_cascades() {
        let store = SledDepthStore::open_temp().unwrap();
        let keep = store.create_well(bundle(1, &[(100.0, 1.0)]), 500).unwrap();
        let gone = store
            .create_well(bundle(1, &[(100.0, 1.0), (101.0, 2.0)]), 500)
            .unwrap();

        assert!(store.delete_well(gone.id, 1).unwrap());
        assert!(store.find_well(gone.id, 1).unwrap().is_none());
        assert!(store.curves(gone.id).unwrap().is_empty());
        assert_eq!(store.row_count(gone.id).unwrap(), 0);

        assert_eq!(store.row_count(keep.id).unwrap(), 1);
        assert_eq!(store.curves(keep.id).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_depths_kept_in_order() {
        let store = SledDepthStore::open_temp().unwrap();
        let well = store
            .create_well(bundle(1, &[(100.0, 1.0), (100.0, 2.0), (99.0, 3.0)]), 500)
            .unwrap();

        let rows = store.rows_in_range(well.id, DepthRange::new(100.0, 100.0)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].curve_values["GR"], 1.0);
        assert_eq!(rows[1].curve_values["GR"], 2.0);

        let first = store.first_rows(well.id, 1).unwrap();
        assert_eq!(first[0].depth, 99.0);
    }

    #[test]
    fn test_pushdown_stats_skip_sentinel() {
        let store = SledDepthStore::open_temp().unwrap();
        let well = store
            .create_well(bundle(1, &[(100.0, 50.0), (101.0, -9999.0), (102.0, 60.0)]), 500)
            .unwrap();

        let stats = store
            .curve_stats(well.id, "GR", -9999.0, DepthRange::new(100.0, 102.0))
            .unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, Some(50.0));
        assert_eq!(stats.max, Some(60.0));
        assert_eq!(stats.mean, Some(55.0));

        let missing = store
            .curve_stats(well.id, "RHOB", -9999.0, DepthRange::new(100.0, 102.0))
            .unwrap();
        assert_eq!(missing, CurveStats::empty());
    }

    #[test]
    fn test_list_wells_scoped_to_owner() {
        let store = SledDepthStore::open_temp().unwrap();
        let a = store.create_well(bundle(1, &[(1.0, 1.0)]), 500).unwrap();
        let b = store.create_well(bundle(1, &[(1.0, 1.0)]), 500).unwrap();
        store.create_well(bundle(2, &[(1.0, 1.0)]), 500).unwrap();

        let ids: Vec<WellId> = store.list_wells(1).unwrap().iter().map(|w| w.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let store = SledDepthStore::open_temp().unwrap();
        let well = store.create_well(bundle(1, &[(100.0, 1.0)]), 500).unwrap();
        assert!(store
            .rows_in_range(well.id, DepthRange::new(101.0, 99.0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_aborted_commit_leaves_no_trace() {
        let store = SledDepthStore::open_temp().unwrap();
        let WellBundle { well, curves, rows } =
            bundle(1, &[(100.0, 50.0), (101.0, 51.0), (102.0, 52.0), (103.0, 53.0), (104.0, 54.0)]);
        let well = well.into_well(42, Utc::now());
        let staged = StagedWell::new(&well, curves, &rows).unwrap();

        // Two row batches land inside the transaction before the third aborts it.
        let err = store
            .commit_well(&staged, 2, |batch| {
                if batch == 2 {
                    Err(StoreError::Database("write interrupted".to_string()))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(msg) if msg == "write interrupted"));

        assert!(store.find_well(42, 1).unwrap().is_none());
        assert!(store.list_wells(1).unwrap().is_empty());
        assert!(store.curves(42).unwrap().is_empty());
        assert_eq!(store.row_count(42).unwrap(), 0);
        assert!(store.wells.is_empty() && store.curves.is_empty() && store.rows.is_empty());

        let committed = store.create_well(bundle(1, &[(100.0, 50.0)]), 2).unwrap();
        assert_eq!(store.row_count(committed.id).unwrap(), 1);
    }
}
