//! Depth-series persistence
//!
//! Wells, curves and depth-ordered rows behind the `DepthStore` trait, the
//! ingestion transaction that fills it, and the raw upload sink.

mod depth_store;
pub mod ingest;
mod keys;
mod memory;
pub mod raw_files;
mod sled_store;

pub use depth_store::{run_blocking, DepthStore, StoreError, WellBundle};
pub use ingest::{build_bundle, ingest, IngestError};
pub use memory::InMemoryDepthStore;
pub use raw_files::{store_with_fallback, LocalRawFileStore, RawFileStore, RawStoreError};
pub use sled_store::SledDepthStore;
