//! Placement of newly revealed children under their parent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::Position;

/// Row height used when children wrap into a grid.
pub const GRID_ROW_HEIGHT: f64 = 80.0;
/// Datapoint fan-outs above this count wrap into a grid.
pub const GRID_THRESHOLD: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
	pub horizontal_spacing: f64,
	pub vertical_offset: f64,
}

impl Spacing {
	pub const fn new(horizontal_spacing: f64, vertical_offset: f64) -> Self {
		Self {
			horizontal_spacing,
			vertical_offset,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
	#[serde(default)]
	pub by_type: HashMap<String, Spacing>,
	pub default: Spacing,
}

impl LayoutConfig {
	pub fn spacing_for(&self, node_type: &str) -> Spacing {
		self.by_type.get(node_type).copied().unwrap_or(self.default)
	}
}

impl Default for LayoutConfig {
	fn default() -> Self {
		let by_type = [
			("dataset", Spacing::new(400.0, 220.0)),
			("datapoint", Spacing::new(180.0, 180.0)),
			("table", Spacing::new(200.0, 180.0)),
			("column", Spacing::new(150.0, 160.0)),
			("downstream_table", Spacing::new(220.0, 200.0)),
			("downstream_column", Spacing::new(140.0, 160.0)),
		]
		.into_iter()
		.map(|(t, s)| (t.to_string(), s))
		.collect();

		Self {
			by_type,
			default: Spacing::new(250.0, 180.0),
		}
	}
}

/// Position of the `index`-th newly placed child out of `count` siblings.
///
/// Children are centered in a row below the parent. Large datapoint fan-outs
/// wrap into a roughly square grid instead.
pub fn place_child(
	parent: Position,
	index: usize,
	count: usize,
	spacing: Spacing,
	node_type: &str,
) -> Position {
	let Spacing {
		horizontal_spacing: s,
		vertical_offset: v,
	} = spacing;

	if node_type == "datapoint" && count > GRID_THRESHOLD {
		let per_row = (count as f64).sqrt().ceil() as usize;
		let (row, col) = (index / per_row, index % per_row);
		Position {
			x: parent.x + col as f64 * s - per_row as f64 * s / 2.0,
			y: parent.y + v + row as f64 * GRID_ROW_HEIGHT,
		}
	} else {
		Position {
			x: parent.x + index as f64 * s - count as f64 * s / 2.0,
			y: parent.y + v,
		}
	}
}
