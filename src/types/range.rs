//! Depth interval type

use serde::{Deserialize, Serialize};

/// Inclusive `[start, end]` depth interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub start: f64,
    pub end: f64,
}

impl DepthRange {
    /// Every finite depth; selects a whole well regardless of its header interval
    pub const ALL: Self = Self::new(f64::MIN, f64::MAX);

    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Both bounds are numbers and `start <= end`.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end
    }

    /// Both bounds are numbers; a reversed interval simply selects nothing.
    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.start && depth <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_bounds() {
        let r = DepthRange::new(100.0, 102.0);
        assert!(r.contains(100.0));
        assert!(r.contains(102.0));
        assert!(!r.contains(102.0001));
        assert!(r.is_valid());
        assert!(!DepthRange::new(5.0, 1.0).is_valid());
        assert!(!DepthRange::new(f64::NAN, 1.0).is_valid());
        assert!(DepthRange::new(5.0, 1.0).is_finite());
        assert!(!DepthRange::new(1.0, f64::INFINITY).is_finite());
        assert!(DepthRange::ALL.is_valid() && DepthRange::ALL.contains(-12.5));
    }
}
