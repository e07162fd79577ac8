//! Well-log engine: LAS ingestion and depth-series analytics
//!
//! Parses LAS well-log files into a depth-indexed model and answers range
//! queries and statistical summaries over it.
//!
//! ## Architecture
//!
//! - **Parser** (`acquisition`): sectioned LAS text → `LasDocument`, never fails
//! - **Store** (`storage`): wells, curves and depth-ordered rows; transactional ingestion
//! - **Query** (`query`): inclusive depth-range retrieval with null projection
//! - **Aggregation** (`aggregation`): in-memory and store-pushdown statistics
//! - **Sampling** (`sampling`): bounded, evenly strided subsets
//! - **Context** (`context`): TTL-cached per-consumer well summaries
//! - **Narrative** (`narrative`): prompts and chat state for a text generator

pub mod acquisition;
pub mod aggregation;
pub mod config;
pub mod context;
pub mod narrative;
pub mod query;
pub mod sampling;
pub mod service;
pub mod storage;
pub mod types;

pub use acquisition::{parse_las, LasDocument};
pub use config::EngineConfig;
pub use service::{ServiceError, WellLogService};
pub use storage::{DepthStore, InMemoryDepthStore, SledDepthStore};
pub use types::{Curve, CurveStats, DepthRange, DepthRow, ProjectedRow, Well};
