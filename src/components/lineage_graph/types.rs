use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::style::{FontStyle, NodeStyle};

pub type NodeId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A child waiting under its parent until the parent is expanded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildDescriptor {
	pub id: NodeId,
	pub label: String,
	pub node_type: String,
	#[serde(default)]
	pub auto_expand: bool,
}

/// Parent id to its children, in placement order.
pub type HiddenChildren = HashMap<NodeId, Vec<ChildDescriptor>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
	pub edge_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	#[serde(flatten)]
	pub attrs: HashMap<String, serde_json::Value>,
}

impl EdgeDescriptor {
	/// Look up a string attribute, including the dedicated `method` field.
	pub fn attr(&self, name: &str) -> Option<&str> {
		if name == "method" {
			return self.method.as_deref();
		}
		self.attrs.get(name).and_then(|v| v.as_str())
	}
}

/// Parent id to child id to the attributes of the edge between them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeIndex(HashMap<NodeId, HashMap<NodeId, EdgeDescriptor>>);

impl EdgeIndex {
	pub fn get(&self, from: &str, to: &str) -> Option<&EdgeDescriptor> {
		self.0.get(from).and_then(|children| children.get(to))
	}

	pub fn insert(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>, edge: EdgeDescriptor) {
		self.0.entry(from.into()).or_default().insert(to.into(), edge);
	}
}

/// A node as handed to the rendering surface.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
	pub id: NodeId,
	pub label: String,
	pub position: Position,
	pub style: NodeStyle,
	pub expandable: bool,
}

/// An edge as handed to the rendering surface.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
	pub from: NodeId,
	pub to: NodeId,
	pub width: f64,
	pub color: String,
	pub label: Option<String>,
	pub font: Option<FontStyle>,
}
