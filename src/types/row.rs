//! Depth row types and null projection

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::is_null_sentinel;

/// Sparse curve values for one depth sample, keyed by curve mnemonic.
///
/// A curve with no entry is absent; an entry equal to the well's null
/// sentinel is logically null. Both read as `None` through [`curve_value`].
pub type CurveValues = BTreeMap<String, f64>;

/// One stored depth sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthRow {
    pub depth: f64,
    pub curve_values: CurveValues,
}

impl DepthRow {
    pub fn new(depth: f64, curve_values: CurveValues) -> Self {
        Self { depth, curve_values }
    }

    /// Null-coalesced value of `curve` in this row
    pub fn value(&self, curve: &str, null_value: f64) -> Option<f64> {
        curve_value(&self.curve_values, curve, null_value)
    }

    /// Project onto `curves` in request order, nulls substituted.
    pub fn project<S: AsRef<str>>(&self, curves: &[S], null_value: f64) -> ProjectedRow {
        ProjectedRow {
            depth: self.depth,
            values: curves
                .iter()
                .map(|c| {
                    let name = c.as_ref();
                    (name.to_string(), self.value(name, null_value))
                })
                .collect(),
        }
    }
}

/// The single null-coalescing rule applied on every read path.
///
/// Missing entry and sentinel entry both project to `None`; anything else
/// passes through unchanged.
pub fn curve_value(values: &CurveValues, curve: &str, null_value: f64) -> Option<f64> {
    match values.get(curve) {
        Some(&v) if !is_null_sentinel(v, null_value) => Some(v),
        _ => None,
    }
}

/// A row projected onto a requested curve list.
///
/// Serializes flat as `{"depth": 100.0, "GR": 50.0, "RHOB": null}` with the
/// curves in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
    pub depth: f64,
    pub values: Vec<(String, Option<f64>)>,
}

impl ProjectedRow {
    pub fn get(&self, curve: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == curve)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for ProjectedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("depth", &self.depth)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(depth: f64, values: &[(&str, f64)]) -> DepthRow {
        DepthRow::new(
            depth,
            values.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
        )
    }

    #[test]
    fn test_sentinel_and_missing_project_to_null() {
        let r = row(101.0, &[("GR", -9999.0), ("RHOB", 2.4)]);
        assert_eq!(r.value("GR", -9999.0), None);
        assert_eq!(r.value("NPHI", -9999.0), None);
        assert_eq!(r.value("RHOB", -9999.0), Some(2.4));
    }

    #[test]
    fn test_custom_sentinel() {
        let r = row(10.0, &[("GR", -999.25), ("SP", -9999.0)]);
        assert_eq!(r.value("GR", -999.25), None);
        // -9999 is only null when it is the well's sentinel
        assert_eq!(r.value("SP", -999.25), Some(-9999.0));
    }

    #[test]
    fn test_projection_keeps_request_order() {
        let r = row(100.0, &[("GR", 50.0), ("RHOB", 2.3)]);
        let projected = r.project(&["RHOB", "GR", "CALI"], -9999.0);
        let names: Vec<&str> = projected.values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["RHOB", "GR", "CALI"]);
        assert_eq!(projected.get("CALI"), None);

        let json = serde_json::to_string(&projected).unwrap();
        assert_eq!(json, r#"{"depth":100.0,"RHOB":2.3,"GR":50.0,"CALI":null}"#);
    }
}
