//! Lineage payload handed over by the graph builder: the initially visible
//! nodes and edges plus everything kept hidden until expansion.

use std::collections::{HashMap, HashSet, VecDeque};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::ExplorerConfig;
use super::edges::EdgeDecorator;
use super::expansion::ExpansionManager;
use super::layout::{LayoutConfig, place_child};
use super::style::NodeStyleTable;
use super::surface::RenderSurface;
use super::types::{EdgeIndex, EdgeSpec, HiddenChildren, NodeId, NodeSpec, Position};

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("invalid lineage json: {0}")]
	Json(#[from] serde_json::Error),

	#[error("duplicate initial node: {0}")]
	DuplicateNode(NodeId),

	#[error("initial edge {from} -> {to} references an unknown node")]
	UnknownEndpoint { from: NodeId, to: NodeId },
}

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialNode {
	pub id: NodeId,
	pub label: String,
	pub node_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialEdge {
	pub from: NodeId,
	pub to: NodeId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageData {
	pub nodes: Vec<InitialNode>,
	pub edges: Vec<InitialEdge>,
	pub hidden_children: HiddenChildren,
	pub edge_index: EdgeIndex,
	/// Merged over the built-in styles.
	pub node_styles: Option<NodeStyleTable>,
	pub layout: Option<LayoutConfig>,
	pub edge_rules: Option<EdgeDecorator>,
}

impl LineageData {
	pub fn from_json(json: &str) -> LoadResult<Self> {
		let data: Self = serde_json::from_str(json)?;
		data.validate()?;
		info!(
			"Loaded lineage: {} visible nodes, {} expandable parents",
			data.nodes.len(),
			data.hidden_children.len()
		);
		Ok(data)
	}

	pub fn validate(&self) -> LoadResult<()> {
		let mut ids = HashSet::new();
		for node in &self.nodes {
			if !ids.insert(node.id.as_str()) {
				return Err(LoadError::DuplicateNode(node.id.clone()));
			}
		}
		for edge in &self.edges {
			if !ids.contains(edge.from.as_str()) || !ids.contains(edge.to.as_str()) {
				return Err(LoadError::UnknownEndpoint {
					from: edge.from.clone(),
					to: edge.to.clone(),
				});
			}
		}
		Ok(())
	}

	pub fn styles(&self) -> NodeStyleTable {
		match &self.node_styles {
			Some(overrides) => NodeStyleTable::default().merged(overrides.clone()),
			None => NodeStyleTable::default(),
		}
	}

	/// Nodes and edges visible before any interaction. Roots (no incoming
	/// initial edge) sit on a centered row; descendants are placed below
	/// their first parent the same way expansion places children.
	pub fn initial_batch(
		&self,
		styles: &NodeStyleTable,
		layout: &LayoutConfig,
		decorator: &EdgeDecorator,
	) -> (Vec<NodeSpec>, Vec<EdgeSpec>) {
		let by_id: HashMap<&str, _> = self.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
		let incoming: HashSet<&str> = self.edges.iter().map(|e| e.to.as_str()).collect();
		let roots: Vec<&str> = self
			.nodes
			.iter()
			.map(|n| n.id.as_str())
			.filter(|id| !incoming.contains(id))
			.collect();

		let mut positions: HashMap<&str, Position> = HashMap::new();
		let spacing = layout.default.horizontal_spacing;
		let offset = (roots.len().saturating_sub(1)) as f64 * spacing / 2.0;
		for (i, root) in roots.iter().enumerate() {
			positions.insert(*root, Position::new(i as f64 * spacing - offset, 0.0));
		}

		let mut queue: VecDeque<&str> = roots.into_iter().collect();
		while let Some(id) = queue.pop_front() {
			let origin = positions[id];
			let kids: Vec<_> = self
				.edges
				.iter()
				.filter(|e| e.from == id)
				.filter_map(|e| by_id.get(e.to.as_str()).copied())
				.filter(|n| !positions.contains_key(n.id.as_str()))
				.collect();
			let count = kids.len();
			for (i, kid) in kids.into_iter().enumerate() {
				let at = place_child(
					origin,
					i,
					count,
					layout.spacing_for(&kid.node_type),
					&kid.node_type,
				);
				positions.insert(&kid.id, at);
				queue.push_back(&kid.id);
			}
		}

		let nodes = self
			.nodes
			.iter()
			.map(|n| NodeSpec {
				id: n.id.clone(),
				label: n.label.clone(),
				position: positions.get(n.id.as_str()).copied().unwrap_or_default(),
				style: styles.lookup(&n.node_type),
				expandable: self.hidden_children.contains_key(&n.id),
			})
			.collect();
		let edges = self
			.edges
			.iter()
			.map(|e| decorator.decorate(&e.from, &e.to, &self.edge_index))
			.collect();
		(nodes, edges)
	}

	/// Seed `surface` with the initial graph and hand it to a new manager.
	pub fn into_manager<S: RenderSurface>(
		self,
		mut surface: S,
		config: ExplorerConfig,
	) -> ExpansionManager<S> {
		let styles = self.styles();
		let layout = self.layout.clone().unwrap_or_default();
		let decorator = self.edge_rules.clone().unwrap_or_default();

		let (nodes, edges) = self.initial_batch(&styles, &layout, &decorator);
		surface.add_nodes(nodes);
		surface.add_edges(edges);

		ExpansionManager::initialize(surface, self.hidden_children, styles, self.edge_index)
			.with_layout(layout)
			.with_decorator(decorator)
			.with_config(config)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::lineage_graph::surface::recording::RecordingSurface;

	const LINEAGE: &str = r##"{
		"nodes": [
			{"id": "Model", "label": "Model", "node_type": "model"},
			{"id": "get_sales", "label": "get_sales", "node_type": "function"},
			{"id": "get_costs", "label": "get_costs", "node_type": "function"}
		],
		"edges": [
			{"from": "Model", "to": "get_sales"},
			{"from": "Model", "to": "get_costs"}
		],
		"hidden_children": {
			"get_sales": [
				{"id": "get_sales_orders", "label": "orders (1 fields)", "node_type": "dataset"}
			]
		},
		"edge_index": {
			"Model": {"get_sales": {"edge_type": "model_to_function"}}
		},
		"node_styles": {
			"model": {"size": 50, "shape": "dot"}
		}
	}"##;

	#[test]
	fn parses_and_places_initial_graph() {
		let data = LineageData::from_json(LINEAGE).unwrap();
		let (nodes, edges) =
			data.initial_batch(&data.styles(), &LayoutConfig::default(), &EdgeDecorator::default());

		let positions: Vec<(&str, Position)> =
			nodes.iter().map(|n| (n.id.as_str(), n.position)).collect();
		assert_eq!(
			positions,
			vec![
				("Model", Position::new(0.0, 0.0)),
				("get_sales", Position::new(-250.0, 180.0)),
				("get_costs", Position::new(0.0, 180.0)),
			]
		);
		assert!(nodes[1].expandable);
		assert!(!nodes[2].expandable);
		assert_eq!(nodes[0].style.size, 50.0);
		assert_eq!(edges.len(), 2);
		// only Model -> get_sales is indexed as model_to_function
		assert_eq!((edges[0].width, edges[0].color.as_str()), (3.0, "#1F4E79"));
		assert_eq!((edges[1].width, edges[1].color.as_str()), (2.0, "#666666"));
	}

	#[test]
	fn rejects_edge_to_unknown_node() {
		let json = r#"{"nodes": [{"id": "a", "label": "a", "node_type": "model"}],
			"edges": [{"from": "a", "to": "b"}]}"#;
		assert!(matches!(
			LineageData::from_json(json),
			Err(LoadError::UnknownEndpoint { .. })
		));
	}

	#[test]
	fn rejects_duplicate_nodes() {
		let json = r#"{"nodes": [
			{"id": "a", "label": "a", "node_type": "model"},
			{"id": "a", "label": "again", "node_type": "model"}
		]}"#;
		assert!(matches!(
			LineageData::from_json(json),
			Err(LoadError::DuplicateNode(id)) if id == "a"
		));
	}

	#[test]
	fn rejects_malformed_json() {
		assert!(matches!(
			LineageData::from_json("{nodes: "),
			Err(LoadError::Json(_))
		));
	}

	#[test]
	fn manager_starts_from_seeded_surface() {
		let data = LineageData::from_json(LINEAGE).unwrap();
		let mut manager = data.into_manager(RecordingSurface::default(), ExplorerConfig::default());
		assert_eq!(manager.surface().nodes.len(), 3);
		assert!(manager.is_expandable("get_sales"));

		manager.on_node_click("get_sales").unwrap();
		let dataset = &manager.surface().nodes["get_sales_orders"];
		// dataset spacing 400/220 below get_sales at (-250, 180)
		assert_eq!(dataset.position, Position::new(-450.0, 400.0));

		manager.on_node_click("get_sales").unwrap();
		assert_eq!(manager.surface().nodes.len(), 3);
		assert_eq!(manager.surface().edges.len(), 2);
	}
}
