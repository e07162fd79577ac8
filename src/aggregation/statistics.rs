//! In-memory statistics over already-fetched rows

use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::types::{round_to, CurveStats, ProjectedRow, STATS_DECIMALS};

/// Per-curve statistics keyed by curve mnemonic
pub type StatsMap = BTreeMap<String, CurveStats>;

/// Full-precision statistics for a set of non-null values.
///
/// Empty input yields `CurveStats::empty()`, never NaN.
pub fn summarize(values: &[f64]) -> CurveStats {
    if values.is_empty() {
        return CurveStats::empty();
    }
    let min = Statistics::min(values.iter());
    let max = Statistics::max(values.iter());
    let mean = Statistics::mean(values.iter());
    let std_dev = values.iter().population_std_dev();

    CurveStats {
        min: Some(round_to(min, STATS_DECIMALS)),
        max: Some(round_to(max, STATS_DECIMALS)),
        mean: Some(round_to(mean, STATS_DECIMALS)),
        std_dev: Some(round_to(std_dev, STATS_DECIMALS)),
        count: values.len(),
    }
}

/// Statistics for each of `curves` over rows already projected with nulls.
pub fn compute_statistics<S: AsRef<str>>(rows: &[ProjectedRow], curves: &[S]) -> StatsMap {
    curves
        .iter()
        .map(|c| {
            let name = c.as_ref();
            let values: Vec<f64> = rows.iter().filter_map(|r| r.get(name)).collect();
            (name.to_string(), summarize(&values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(depth: f64, gr: Option<f64>) -> ProjectedRow {
        ProjectedRow {
            depth,
            values: vec![("GR".to_string(), gr)],
        }
    }

    #[test]
    fn test_population_std_dev() {
        let rows = vec![row(100.0, Some(50.0)), row(101.0, None), row(102.0, Some(60.0))];
        let stats = compute_statistics(&rows, &["GR"]);
        let gr = &stats["GR"];
        assert_eq!(gr.count, 2);
        assert_eq!(gr.min, Some(50.0));
        assert_eq!(gr.max, Some(60.0));
        assert_eq!(gr.mean, Some(55.0));
        assert_eq!(gr.std_dev, Some(5.0));
    }

    #[test]
    fn test_all_null_curve_is_empty() {
        let rows = vec![row(100.0, None)];
        let stats = compute_statistics(&rows, &["GR", "RHOB"]);
        assert_eq!(stats["GR"], CurveStats::empty());
        assert_eq!(stats["RHOB"], CurveStats::empty());
    }

    #[test]
    fn test_rounding() {
        let stats = summarize(&[1.0, 2.0, 2.0]);
        assert_eq!(stats.mean, Some(1.6667));
        assert_eq!(stats.std_dev, Some(0.4714));
    }
}
