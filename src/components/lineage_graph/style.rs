use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Outline drawn for a node on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
	Box,
	Diamond,
	#[default]
	Ellipse,
	Database,
	Dot,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeColor {
	pub background: String,
	pub border: String,
}

impl Default for NodeColor {
	fn default() -> Self {
		Self {
			background: "#F0F8FF".into(),
			border: "#D0E8EF".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
	pub size: f64,
	pub color: String,
	#[serde(default)]
	pub bold: bool,
}

impl Default for FontStyle {
	fn default() -> Self {
		Self {
			size: 12.0,
			color: "#000000".into(),
			bold: false,
		}
	}
}

impl FontStyle {
	fn new(size: f64, color: &str, bold: bool) -> Self {
		Self {
			size,
			color: color.into(),
			bold,
		}
	}

	/// CSS font shorthand scaled for the current zoom level.
	pub fn css(&self, k: f64) -> String {
		let weight = if self.bold { "bold " } else { "" };
		format!("{}{}px sans-serif", weight, self.size / k.max(0.5))
	}
}

/// Visual attributes applied to a node when it is placed on the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
	pub color: NodeColor,
	pub size: f64,
	pub shape: NodeShape,
	pub font: FontStyle,
	/// Maximum label width in graph units; longer labels are truncated.
	pub width_constraint: Option<f64>,
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			color: NodeColor::default(),
			size: 15.0,
			shape: NodeShape::Ellipse,
			font: FontStyle::default(),
			width_constraint: None,
		}
	}
}

impl NodeStyle {
	fn themed(
		background: &str,
		border: &str,
		size: f64,
		shape: NodeShape,
		font: FontStyle,
		width_constraint: Option<f64>,
	) -> Self {
		Self {
			color: NodeColor {
				background: background.into(),
				border: border.into(),
			},
			size,
			shape,
			font,
			width_constraint,
		}
	}
}

/// Per node type styles. Lookups for unknown types yield [`NodeStyle::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeStyleTable(HashMap<String, NodeStyle>);

impl NodeStyleTable {
	#[cfg(test)]
	pub fn new(styles: HashMap<String, NodeStyle>) -> Self {
		Self(styles)
	}

	pub fn lookup(&self, node_type: &str) -> NodeStyle {
		self.0.get(node_type).cloned().unwrap_or_default()
	}

	/// Overlay `other` on top of this table, replacing entries of the same type.
	pub fn merged(mut self, other: NodeStyleTable) -> Self {
		self.0.extend(other.0);
		self
	}
}

impl Default for NodeStyleTable {
	fn default() -> Self {
		use NodeShape::*;

		let navy = "#000080";
		let dark_red = "#8B0000";
		let styles = [
			(
				"model",
				NodeStyle::themed(
					"#1F4E79",
					"#0F3E69",
					40.0,
					Ellipse,
					FontStyle::new(20.0, "white", true),
					None,
				),
			),
			(
				"function",
				NodeStyle::themed(
					"#4A90A4",
					"#3A8094",
					30.0,
					Box,
					FontStyle::new(16.0, "white", true),
					None,
				),
			),
			(
				"dataset",
				NodeStyle::themed(
					"#87CEEB",
					"#77BEDB",
					40.0,
					Diamond,
					FontStyle::new(14.0, navy, true),
					None,
				),
			),
			(
				"datapoint",
				NodeStyle::themed(
					"#B0E0E6",
					"#A0D0D6",
					25.0,
					Ellipse,
					FontStyle::new(11.0, navy, false),
					Some(150.0),
				),
			),
			(
				"table",
				NodeStyle::themed(
					"#E6F3FF",
					"#D6E3EF",
					30.0,
					Database,
					FontStyle::new(12.0, navy, true),
					Some(180.0),
				),
			),
			(
				"column",
				NodeStyle::themed(
					"#F0F8FF",
					"#E0E8EF",
					20.0,
					Dot,
					FontStyle::new(10.0, navy, false),
					Some(120.0),
				),
			),
			(
				"downstream_table",
				NodeStyle::themed(
					"#FFE4E1",
					"#EED4D1",
					30.0,
					Database,
					FontStyle::new(12.0, dark_red, true),
					Some(180.0),
				),
			),
			(
				"downstream_column",
				NodeStyle::themed(
					"#FFF0F5",
					"#EEE0E5",
					20.0,
					Dot,
					FontStyle::new(10.0, dark_red, false),
					Some(120.0),
				),
			),
		];

		Self(
			styles
				.into_iter()
				.map(|(node_type, style)| (node_type.to_string(), style))
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_type_falls_back_to_default_style() {
		let table = NodeStyleTable::default();
		assert_eq!(table.lookup("warehouse"), NodeStyle::default());
	}

	#[test]
	fn known_types_carry_their_shape() {
		let table = NodeStyleTable::default();
		assert_eq!(table.lookup("table").shape, NodeShape::Database);
		assert_eq!(table.lookup("dataset").shape, NodeShape::Diamond);
		assert_eq!(table.lookup("datapoint").width_constraint, Some(150.0));
	}

	#[test]
	fn merged_overrides_single_entries() {
		let mut custom = HashMap::new();
		custom.insert(
			"table".to_string(),
			NodeStyle {
				size: 99.0,
				..NodeStyle::default()
			},
		);
		let table = NodeStyleTable::default().merged(NodeStyleTable::new(custom));
		assert_eq!(table.lookup("table").size, 99.0);
		assert_eq!(table.lookup("model").size, 40.0);
	}

	#[test]
	fn partial_json_style_fills_defaults() {
		let style: NodeStyle = serde_json::from_str(r#"{"shape": "box", "size": 22}"#).unwrap();
		assert_eq!(style.shape, NodeShape::Box);
		assert_eq!(style.size, 22.0);
		assert_eq!(style.color, NodeColor::default());
	}

	#[test]
	fn bold_font_css() {
		let font = FontStyle::new(10.0, "#333333", true);
		assert_eq!(font.css(1.0), "bold 10px sans-serif");
		assert_eq!(font.css(0.25), "bold 20px sans-serif");
	}
}
