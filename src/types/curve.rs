//! Curve (channel) types

use serde::{Deserialize, Serialize};

use super::WellId;

/// One named measurement channel belonging to a well.
///
/// `curve_index` is the 0-based position in the source file. The curve at
/// position 0 is the depth index: its values become row depth keys and are
/// never stored as curve values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    pub well_id: WellId,
    pub mnemonic: String,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub curve_index: u32,
}

impl Curve {
    pub fn is_depth_index(&self) -> bool {
        self.curve_index == 0
    }

    /// `GR (API)` style label used in prompts
    pub fn label(&self) -> String {
        match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => format!("{} ({})", self.mnemonic, unit),
            _ => self.mnemonic.clone(),
        }
    }
}

/// Curve definition before the owning well exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCurve {
    pub mnemonic: String,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub curve_index: u32,
}

impl NewCurve {
    pub fn into_curve(self, well_id: WellId) -> Curve {
        Curve {
            well_id,
            mnemonic: self.mnemonic,
            unit: self.unit,
            description: self.description,
            curve_index: self.curve_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_and_without_unit() {
        let gr = Curve {
            well_id: 1,
            mnemonic: "GR".to_string(),
            unit: Some("API".to_string()),
            description: None,
            curve_index: 1,
        };
        assert_eq!(gr.label(), "GR (API)");

        let ratio = Curve { unit: Some(String::new()), ..gr.clone() };
        assert_eq!(ratio.label(), "GR");
        assert!(!gr.is_depth_index());
    }
}
