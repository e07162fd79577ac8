//! Ingestion → query → aggregation integration tests
//!
//! Runs full LAS files through the public API against both store backends.
//! Sled databases live in temp directories; nothing touches ./data.

use std::sync::Arc;

use welllog_engine::aggregation::{aggregate_curves, FanOutOptions};
use welllog_engine::query::query_range;
use welllog_engine::storage::{ingest, IngestError};
use welllog_engine::{parse_las, DepthRange, DepthStore, InMemoryDepthStore, SledDepthStore};

const THREE_CURVE_LAS: &str = "\
~VERSION INFORMATION
 VERS.                 2.0 :   CWLS LOG ASCII STANDARD -VERSION 2.0
 WRAP.                  NO :   ONE LINE PER DEPTH STEP
~WELL INFORMATION
#MNEM.UNIT       DATA                  DESCRIPTION
 STRT.M          100.0                 : START DEPTH
 STOP.M          102.0                 : STOP DEPTH
 STEP.M          1.0                   : STEP
 NULL.           -9999                 : NULL VALUE
 WELL.           ALPHA-1               : WELL
 COMP.           ACME ENERGY           : COMPANY
~CURVE INFORMATION
 DEPT.M                                : DEPTH
 GR.API                                : GAMMA RAY
 RHOB.G/C3                             : BULK DENSITY
~A  DEPT     GR     RHOB
100 50 2.3
101 -9999 2.4
102 60 2.5
";

fn stores() -> Vec<Arc<dyn DepthStore>> {
    vec![
        Arc::new(InMemoryDepthStore::new()),
        Arc::new(SledDepthStore::open_temp().unwrap()),
    ]
}

// ============================================================================
// End-to-end example
// ============================================================================

#[tokio::test]
async fn sentinel_rows_project_to_null_and_are_excluded_from_stats() {
    for store in stores() {
        let doc = parse_las(THREE_CURVE_LAS);
        assert_eq!(doc.curves.len(), 3);

        let well = ingest(store.as_ref(), &doc, 1, None, 500).unwrap();
        assert_eq!(well.well_name, "ALPHA-1");
        assert_eq!(well.company.as_deref(), Some("ACME ENERGY"));
        assert_eq!(well.null_value, -9999.0);

        let curves = vec!["GR".to_string()];
        let range = DepthRange::new(100.0, 102.0);
        let resp = query_range(store.as_ref(), &well, &curves, range).unwrap();
        let gr: Vec<Option<f64>> = resp.data.iter().map(|r| r.get("GR")).collect();
        assert_eq!(gr, vec![Some(50.0), None, Some(60.0)], "backend {}", store.backend_name());

        let stats =
            aggregate_curves(Arc::clone(&store), &well, &curves, range, FanOutOptions::default())
                .await;
        let gr = &stats["GR"];
        assert_eq!(gr.min, Some(50.0));
        assert_eq!(gr.max, Some(60.0));
        assert_eq!(gr.mean, Some(55.0));
        assert_eq!(gr.count, 2);
    }
}

#[tokio::test]
async fn extreme_finite_readings_keep_numeric_stats() {
    let text = "~C\nDEPT.M :\nGR.API :\n~A\n1 1e306\n2 1e306\n";
    for store in stores() {
        let well = ingest(store.as_ref(), &parse_las(text), 1, None, 500).unwrap();
        let curves = vec!["GR".to_string()];
        let stats = aggregate_curves(
            Arc::clone(&store),
            &well,
            &curves,
            DepthRange::new(1.0, 2.0),
            FanOutOptions::default(),
        )
        .await;

        let gr = &stats["GR"];
        assert_eq!(gr.count, 2);
        assert_eq!(gr.min, Some(1e306));
        assert_eq!(gr.max, Some(1e306));
        assert!(gr.mean.is_some_and(f64::is_finite), "backend {}", store.backend_name());

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["GR"]["mean"].is_number());
    }
}

#[test]
fn non_numeric_data_line_is_excluded() {
    let text = THREE_CURVE_LAS.replace("102 60 2.5\n", "102 60 2.5\n103 abc 2.6\n104 70 2.7\n");
    let doc = parse_las(&text);
    assert_eq!(doc.rows.len(), 4);
    assert!(doc.rows.iter().all(|r| r[0] != 103.0));

    let store = InMemoryDepthStore::new();
    let well = ingest(&store, &doc, 1, None, 500).unwrap();
    assert_eq!(store.row_count(well.id).unwrap(), 4);
    let rows = store.rows_in_range(well.id, DepthRange::new(103.0, 103.0)).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn empty_curve_section_rejects_ingestion() {
    let text = "~W\nWELL. EMPTY :\n~C\n~A\n1 2 3\n4 5 6\n7 8 9\n";
    for store in stores() {
        let err = ingest(store.as_ref(), &parse_las(text), 1, None, 500).unwrap_err();
        assert!(matches!(err, IngestError::NoCurves));
        assert!(store.list_wells(1).unwrap().is_empty());
    }
}

// ============================================================================
// Store behavior
// ============================================================================

#[test]
fn row_batches_commit_as_one_well() {
    let mut text = String::from("~W\nNULL. -999.25 :\n~C\nDEPT.FT :\nGR.API :\n~A\n");
    for i in 0..1234 {
        text.push_str(&format!("{} {}\n", 5000.0 + f64::from(i) * 0.5, i % 150));
    }
    let doc = parse_las(&text);

    for store in stores() {
        let well = ingest(store.as_ref(), &doc, 9, None, 500).unwrap();
        assert_eq!(store.row_count(well.id).unwrap(), 1234);

        let rows = store
            .rows_in_range(well.id, DepthRange::new(5000.0, 5001.0))
            .unwrap();
        let depths: Vec<f64> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![5000.0, 5000.5, 5001.0]);
    }
}

#[test]
fn duplicate_depths_are_kept_as_separate_rows() {
    let text = "~C\nDEPT.M :\nGR.API :\n~A\n10 1\n10 2\n11 3\n";
    for store in stores() {
        let well = ingest(store.as_ref(), &parse_las(text), 1, None, 500).unwrap();
        let rows = store.rows_in_range(well.id, DepthRange::new(10.0, 10.0)).unwrap();
        let gr: Vec<Option<f64>> = rows.iter().map(|r| r.value("GR", well.null_value)).collect();
        assert_eq!(gr, vec![Some(1.0), Some(2.0)]);
    }
}

#[test]
fn sled_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("welllog.db");

    let well_id = {
        let store = SledDepthStore::open(&path).unwrap();
        let well = ingest(&store, &parse_las(THREE_CURVE_LAS), 3, None, 2).unwrap();
        store.flush().unwrap();
        well.id
    };

    let store = SledDepthStore::open(&path).unwrap();
    let well = store.find_well(well_id, 3).unwrap().unwrap();
    assert_eq!(well.well_name, "ALPHA-1");
    assert_eq!(store.curves(well_id).unwrap().len(), 3);
    assert_eq!(store.row_count(well_id).unwrap(), 3);
}
