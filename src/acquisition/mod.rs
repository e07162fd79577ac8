//! Well-log data acquisition module
//!
//! Handles parsing of LAS files into structured documents.

pub mod las_parser;

pub use las_parser::{parse_las, CurveDescriptor, HeaderEntry, LasDocument};
