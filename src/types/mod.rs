//! Shared data structures for depth-indexed well-log data
//!
//! This module defines the normalized model every subsystem works against:
//! - `Well`: one ingested measurement run with its depth interval and header
//! - `Curve`: a named channel at a fixed position within a well
//! - `DepthRow`: one depth sample holding a sparse curve-value map
//! - `ProjectedRow`: a row projected onto a requested curve list with nulls
//! - `DepthRange`: inclusive depth interval used by queries and statistics
//! - `CurveStats`: per-curve statistics over a depth interval

mod curve;
mod range;
mod row;
mod stats;
mod well;

pub use curve::*;
pub use range::*;
pub use row::*;
pub use stats::*;
pub use well::*;
