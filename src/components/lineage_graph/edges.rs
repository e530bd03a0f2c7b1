use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::style::FontStyle;
use super::types::{EdgeIndex, EdgeSpec};

pub const EDGE_WIDTH: f64 = 2.0;
pub const EDGE_COLOR: &str = "#666666";

/// Where a rule takes its label text from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum LabelSource {
	Method,
	Attribute(String),
}

/// Labels edges of one type. Rules are tried in order and the first whose
/// `edge_type` matches decides the label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeLabelRule {
	pub edge_type: String,
	pub source: LabelSource,
	#[serde(default = "label_font")]
	pub font: FontStyle,
}

fn label_font() -> FontStyle {
	FontStyle {
		size: 10.0,
		color: "#333333".into(),
		bold: false,
	}
}

/// Stroke replacing the base width and color for one edge type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
	pub width: f64,
	pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDecorator {
	pub rules: Vec<EdgeLabelRule>,
	/// Keyed by edge type. Types without an entry keep the base stroke.
	#[serde(default)]
	pub styles: HashMap<String, EdgeStyle>,
}

impl Default for EdgeDecorator {
	fn default() -> Self {
		Self {
			rules: vec![EdgeLabelRule {
				edge_type: "datapoint_to_table".into(),
				source: LabelSource::Method,
				font: label_font(),
			}],
			// model -> function edges only exist in the initial graph
			styles: HashMap::from([(
				"model_to_function".to_string(),
				EdgeStyle {
					width: 3.0,
					color: "#1F4E79".into(),
				},
			)]),
		}
	}
}

impl EdgeDecorator {
	pub fn decorate(&self, from: &str, to: &str, index: &EdgeIndex) -> EdgeSpec {
		let mut edge = EdgeSpec {
			from: from.to_string(),
			to: to.to_string(),
			width: EDGE_WIDTH,
			color: EDGE_COLOR.to_string(),
			label: None,
			font: None,
		};

		let Some(descriptor) = index.get(from, to) else {
			return edge;
		};
		if let Some(style) = self.styles.get(&descriptor.edge_type) {
			edge.width = style.width;
			edge.color = style.color.clone();
		}
		let Some(rule) = self.rules.iter().find(|r| r.edge_type == descriptor.edge_type) else {
			return edge;
		};
		let text = match &rule.source {
			LabelSource::Method => descriptor.method.as_deref(),
			LabelSource::Attribute(name) => descriptor.attr(name),
		};
		if let Some(text) = text.filter(|t| !t.is_empty()) {
			edge.label = Some(text.to_string());
			edge.font = Some(rule.font.clone());
		}
		edge
	}
}
