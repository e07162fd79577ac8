//! Aggregation Engine
//!
//! Two paths produce per-curve statistics with the same null exclusion and
//! the same inclusive depth bounds:
//! - `statistics`: scans rows already fetched for an interpretation request,
//!   reporting min / max / mean / population standard deviation
//! - `fanout`: pushes min / max / mean / count down to the store per curve,
//!   evaluated in bounded concurrent batches

pub mod fanout;
pub mod statistics;

pub use fanout::{aggregate_curves, evaluate_curves, AggregateError, FanOutOptions};
pub use statistics::{compute_statistics, summarize, StatsMap};
