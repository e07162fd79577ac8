//! Curve statistics types

use serde::{Deserialize, Serialize};

/// Decimal places kept in reported statistics.
pub const STATS_DECIMALS: i32 = 4;

/// Statistics for one curve over a depth interval.
///
/// A curve with no non-null samples reports `count = 0` and every other field
/// `None`. `std_dev` is only produced by the in-memory path; the store
/// pushdown path always reports it as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    #[serde(default)]
    pub std_dev: Option<f64>,
    pub count: usize,
}

impl CurveStats {
    pub const fn empty() -> Self {
        Self {
            min: None,
            max: None,
            mean: None,
            std_dev: None,
            count: 0,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Running min/max/mean/count, the shape a store can compute while scanning.
///
/// The mean is updated incrementally so values near `f64::MAX` never overflow
/// an intermediate sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsAccumulator {
    min: f64,
    max: f64,
    mean: f64,
    count: usize,
}

impl StatsAccumulator {
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let n = self.count as f64;
        self.mean += value / n - self.mean / n;
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Finish into rounded statistics without a standard deviation.
    pub fn finish(self) -> CurveStats {
        if self.count == 0 {
            return CurveStats::empty();
        }
        CurveStats {
            min: Some(round_to(self.min, STATS_DECIMALS)),
            max: Some(round_to(self.max, STATS_DECIMALS)),
            mean: Some(round_to(self.mean, STATS_DECIMALS)),
            std_dev: None,
            count: self.count,
        }
    }
}

/// Round half away from zero to `decimals` places.
///
/// Values too large to scale are already integral and come back unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}
