//! LAS (Log ASCII Standard) Parser
//!
//! Parses the line-oriented, sectioned ASCII format used to exchange well
//! logs. A file is a sequence of sections, each introduced by a `~X` line:
//!
//! - `~V`: version / meta header
//! - `~W`: well header (`STRT`, `STOP`, `STEP`, `NULL`, `WELL`, ...)
//! - `~C`: curve definitions, in column order (first curve = depth index)
//! - `~A`: whitespace-separated data table
//!
//! Header lines follow `MNEMONIC.UNIT VALUE : DESCRIPTION`.
//!
//! Parsing is total: anything that cannot be understood is skipped line by
//! line and the document holds whatever could be extracted.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::types::CurveValues;

/// `MNEMONIC.UNIT VALUE : DESCRIPTION`
///
/// The unit is the token immediately after the first period; the value runs to
/// the first colon not escaped with a backslash.
const HEADER_LINE_PATTERN: &str = r"^([^.]+)\.(\S*)\s+((?:\\.|[^:\\])*?)\s*:\s*(.*)$";

static HEADER_LINE_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn header_line_re() -> &'static Regex {
    HEADER_LINE_RE
        .get_or_init(|| Regex::new(HEADER_LINE_PATTERN).expect("header line pattern is valid"))
}

/// One parsed `~V` / `~W` header entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub unit: String,
    pub value: String,
    pub description: String,
}

impl HeaderEntry {
    /// Leading numeric token of the value field, if any.
    ///
    /// `"100.0"` and `"100.0 FT"` both yield `100.0`.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Value field, or `None` when blank.
    pub fn text_value(&self) -> Option<&str> {
        let v = self.value.trim();
        (!v.is_empty()).then_some(v)
    }
}

/// One `~C` curve definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveDescriptor {
    pub mnemonic: String,
    pub unit: String,
    pub description: String,
    /// 0-based position in file order
    pub index: u32,
}

/// Section currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Version,
    Well,
    Curves,
    Data,
}

impl Section {
    /// Classify a `~X...` marker line; unknown letters yield `None`.
    fn from_marker(line: &str) -> Option<Self> {
        match line.chars().nth(1).map(|c| c.to_ascii_uppercase()) {
            Some('V') => Some(Self::Version),
            Some('W') => Some(Self::Well),
            Some('C') => Some(Self::Curves),
            Some('A') => Some(Self::Data),
            _ => None,
        }
    }
}

/// Result of parsing one LAS file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LasDocument {
    pub version: BTreeMap<String, HeaderEntry>,
    pub well: BTreeMap<String, HeaderEntry>,
    pub curves: Vec<CurveDescriptor>,
    /// Accepted data rows; each has exactly `curves.len()` values in curve order
    pub rows: Vec<Vec<f64>>,
    /// Lines inside a known section that could not be understood
    pub dropped_lines: usize,
}

impl LasDocument {
    /// Mnemonic of the depth index curve (curve 0)
    pub fn depth_mnemonic(&self) -> Option<&str> {
        self.curves.first().map(|c| c.mnemonic.as_str())
    }

    pub fn well_entry(&self, mnemonic: &str) -> Option<&HeaderEntry> {
        self.well.get(mnemonic)
    }

    /// Materialize a parsed row as `{mnemonic -> value}`.
    ///
    /// Later curves with a repeated mnemonic overwrite earlier ones.
    pub fn row_map(&self, row: &[f64]) -> CurveValues {
        self.curves
            .iter()
            .zip(row.iter())
            .map(|(curve, value)| (curve.mnemonic.clone(), *value))
            .collect()
    }

    /// Depth key and sparse value map (depth curve removed) for one row.
    pub fn split_row(&self, row: &[f64]) -> Option<(f64, CurveValues)> {
        let depth_mnemonic = self.depth_mnemonic()?;
        let mut values = self.row_map(row);
        let depth = values.remove(depth_mnemonic)?;
        Some((depth, values))
    }
}

/// Parse a header line into `(mnemonic, entry)`.
pub fn parse_header_line(line: &str) -> Option<(String, HeaderEntry)> {
    let caps = header_line_re().captures(line)?;
    let mnemonic = caps.get(1)?.as_str().trim();
    if mnemonic.is_empty() {
        return None;
    }
    let unit = caps.get(2).map_or("", |m| m.as_str()).trim();
    let value = caps.get(3).map_or("", |m| m.as_str()).trim().replace("\\:", ":");
    let description = caps.get(4).map_or("", |m| m.as_str()).trim();

    Some((
        mnemonic.to_string(),
        HeaderEntry {
            unit: unit.to_string(),
            value,
            description: description.to_string(),
        },
    ))
}

/// Parse a data line against the expected column count.
///
/// Returns `None` unless the line has exactly `expected` tokens and every token
/// is a finite number. No partial rows.
pub fn parse_data_line(line: &str, expected: usize) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(expected);
    for token in line.split_whitespace() {
        let v = token.parse::<f64>().ok().filter(|v| v.is_finite())?;
        values.push(v);
        if values.len() > expected {
            return None;
        }
    }
    (values.len() == expected).then_some(values)
}

/// Parse LAS text. Never fails; see module docs.
pub fn parse_las(text: &str) -> LasDocument {
    let mut doc = LasDocument::default();
    let mut section: Option<Section> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('~') {
            section = Section::from_marker(line);
            continue;
        }

        match section {
            Some(Section::Version) | Some(Section::Well) => match parse_header_line(line) {
                Some((mnemonic, entry)) => {
                    let target = if section == Some(Section::Version) {
                        &mut doc.version
                    } else {
                        &mut doc.well
                    };
                    target.insert(mnemonic, entry);
                }
                None => doc.dropped_lines += 1,
            },
            Some(Section::Curves) => match parse_header_line(line) {
                Some((mnemonic, entry)) => {
                    let index = u32::try_from(doc.curves.len()).unwrap_or(u32::MAX);
                    doc.curves.push(CurveDescriptor {
                        mnemonic,
                        unit: entry.unit,
                        description: entry.description,
                        index,
                    });
                }
                None => doc.dropped_lines += 1,
            },
            Some(Section::Data) => match parse_data_line(line, doc.curves.len()) {
                Some(values) => doc.rows.push(values),
                None => doc.dropped_lines += 1,
            },
            None => {}
        }
    }

    tracing::debug!(
        curves = doc.curves.len(),
        rows = doc.rows.len(),
        dropped_lines = doc.dropped_lines,
        "Parsed LAS document"
    );

    doc
}
