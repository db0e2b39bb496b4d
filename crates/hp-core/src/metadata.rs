//! Tooltip metadata supplied alongside the SVG.
//!
//! Two shapes are accepted. The flat one describes a single axes:
//!
//! ```json
//! {"tooltip_labels": ["A", "B"], "tooltip_groups": ["g1", "g2"],
//!  "tooltip_x_shift": 10, "tooltip_y_shift": -10}
//! ```
//!
//! The plot-data shape carries the shifts once and one entry per axes:
//!
//! ```json
//! {"tooltip_x_shift": 10, "tooltip_y_shift": -10,
//!  "axes": {"axes_1": {"tooltip_labels": [], "tooltip_groups": [1, 2],
//!                      "hover_nearest": "true"}}}
//! ```
//!
//! Labels and groups are index-aligned with the elements discovered by the
//! classifier. Group values may be strings or numbers; numbers become their
//! decimal text.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Axes id used when plot data has no `axes` map.
pub const DEFAULT_AXES: &str = "axes_1";

/// Labels, groups and tooltip offset for one axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "tooltip_labels", default, deserialize_with = "scalar_strings")]
    pub labels: Vec<String>,
    #[serde(rename = "tooltip_groups", default, deserialize_with = "scalar_strings")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub tooltip_x_shift: f64,
    #[serde(default)]
    pub tooltip_y_shift: f64,
}

/// Whether and how the tooltip is used for an axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipVisibility {
    /// Labels present: tooltip shown on hover.
    Shown,
    /// No labels but groups present: highlight only, tooltip stays hidden.
    Suppressed,
    /// Neither labels nor groups: nothing is bound.
    Disabled,
}

impl Metadata {
    pub fn new(labels: Vec<String>, groups: Vec<String>) -> Self {
        Self {
            labels,
            groups,
            ..Self::default()
        }
    }

    pub fn with_shift(mut self, x: f64, y: f64) -> Self {
        self.tooltip_x_shift = x;
        self.tooltip_y_shift = y;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid tooltip metadata: {e}"))
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).map(String::as_str)
    }

    pub fn visibility(&self) -> TooltipVisibility {
        match (self.labels.is_empty(), self.groups.is_empty()) {
            (false, _) => TooltipVisibility::Shown,
            (true, false) => TooltipVisibility::Suppressed,
            (true, true) => TooltipVisibility::Disabled,
        }
    }
}

/// Per-axes entry of the plot-data `axes` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxesTooltip {
    #[serde(rename = "tooltip_labels", default, deserialize_with = "scalar_strings")]
    pub labels: Vec<String>,
    #[serde(rename = "tooltip_groups", default, deserialize_with = "scalar_strings")]
    pub groups: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hover_nearest: bool,
}

/// Whole-figure metadata: shifts plus per-axes labels and groups. The flat
/// single-axes fields are accepted too and describe [`DEFAULT_AXES`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    #[serde(default)]
    pub tooltip_x_shift: f64,
    #[serde(default)]
    pub tooltip_y_shift: f64,
    #[serde(default)]
    pub axes: BTreeMap<String, AxesTooltip>,
    #[serde(rename = "tooltip_labels", default, deserialize_with = "scalar_strings")]
    pub labels: Vec<String>,
    #[serde(rename = "tooltip_groups", default, deserialize_with = "scalar_strings")]
    pub groups: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hover_nearest: bool,
}

/// One axes ready to classify and bind.
#[derive(Debug, Clone, PartialEq)]
pub struct AxesEntry {
    pub id: String,
    pub metadata: Metadata,
    pub hover_nearest: bool,
}

impl PlotData {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid plot data: {e}"))
    }

    /// Flatten into per-axes entries, sharing the figure-level shifts.
    pub fn axes_entries(&self) -> Vec<AxesEntry> {
        let shifted = |labels: &[String], groups: &[String]| {
            Metadata::new(labels.to_vec(), groups.to_vec())
                .with_shift(self.tooltip_x_shift, self.tooltip_y_shift)
        };
        if self.axes.is_empty() {
            return vec![AxesEntry {
                id: DEFAULT_AXES.to_string(),
                metadata: shifted(&self.labels, &self.groups),
                hover_nearest: self.hover_nearest,
            }];
        }
        self.axes
            .iter()
            .map(|(id, tip)| AxesEntry {
                id: id.clone(),
                metadata: shifted(&tip.labels, &tip.groups),
                hover_nearest: tip.hover_nearest,
            })
            .collect()
    }
}

impl From<Metadata> for PlotData {
    fn from(meta: Metadata) -> Self {
        Self {
            tooltip_x_shift: meta.tooltip_x_shift,
            tooltip_y_shift: meta.tooltip_y_shift,
            labels: meta.labels,
            groups: meta.groups,
            ..Self::default()
        }
    }
}

// ─── Lenient field decoding ──────────────────────────────────────────────

fn scalar_strings<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    use serde::de::Error;
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(de)?;
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Bool(b) => Ok(b.to_string()),
            serde_json::Value::Null => Ok("null".to_string()),
            other => Err(D::Error::custom(format!(
                "expected a string or number, found {other}"
            ))),
        })
        .collect()
}

fn lenient_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    use serde::de::Error;
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("false") || s.is_empty() => {
            Ok(false)
        }
        other => Err(D::Error::custom(format!(
            "expected true/false, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_metadata_with_numeric_groups() {
        let meta = Metadata::from_json(
            r#"{"tooltip_labels": ["A", "B"], "tooltip_groups": [0, 1.5, "x"], "tooltip_x_shift": 10}"#,
        )
        .unwrap();
        assert_eq!(meta.labels, vec!["A", "B"]);
        assert_eq!(meta.groups, vec!["0", "1.5", "x"]);
        assert_eq!(meta.tooltip_x_shift, 10.0);
        assert_eq!(meta.tooltip_y_shift, 0.0);
        assert_eq!(meta.label(2), None);
        assert_eq!(meta.group(2), Some("x"));
    }

    #[test]
    fn visibility_policy() {
        let v = |l: &[&str], g: &[&str]| {
            Metadata::new(
                l.iter().map(|s| s.to_string()).collect(),
                g.iter().map(|s| s.to_string()).collect(),
            )
            .visibility()
        };
        assert_eq!(v(&["a"], &["g"]), TooltipVisibility::Shown);
        assert_eq!(v(&["a"], &[]), TooltipVisibility::Shown);
        assert_eq!(v(&[], &["g"]), TooltipVisibility::Suppressed);
        assert_eq!(v(&[], &[]), TooltipVisibility::Disabled);
    }

    #[test]
    fn plot_data_axes_map() {
        let data = PlotData::from_json(
            r#"{"tooltip_x_shift": 5, "tooltip_y_shift": -5, "axes": {
                "axes_1": {"tooltip_labels": ["a"], "tooltip_groups": [1], "hover_nearest": "true"},
                "axes_2": {"tooltip_groups": ["b"], "hover_nearest": false}}}"#,
        )
        .unwrap();
        let entries = data.axes_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "axes_1");
        assert!(entries[0].hover_nearest);
        assert_eq!(entries[0].metadata.groups, vec!["1"]);
        assert_eq!(entries[0].metadata.tooltip_y_shift, -5.0);
        assert_eq!(entries[1].id, "axes_2");
        assert!(!entries[1].hover_nearest);
        assert_eq!(entries[1].metadata.visibility(), TooltipVisibility::Suppressed);
    }

    #[test]
    fn flat_plot_data_targets_default_axes() {
        let data = PlotData::from_json(r#"{"tooltip_labels": ["a"], "hover_nearest": "False"}"#)
            .unwrap();
        let entries = data.axes_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, DEFAULT_AXES);
        assert!(!entries[0].hover_nearest);
    }

    #[test]
    fn rejects_nested_group_values() {
        let err = Metadata::from_json(r#"{"tooltip_groups": [[1]]}"#).unwrap_err();
        assert!(err.starts_with("Invalid tooltip metadata"), "{err}");
        assert!(PlotData::from_json(r#"{"hover_nearest": "maybe"}"#).is_err());
    }
}
