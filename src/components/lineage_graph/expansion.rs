//! Click driven expand / collapse of hidden lineage children.
//!
//! The manager owns the rendering surface and the immutable lineage tables.
//! Everything it knows about what is visible is re-read from the surface at
//! the start of each operation, so deferred auto-expansion can interleave
//! with user clicks.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use thiserror::Error;

use super::config::{ExplorerConfig, SharedChildPolicy};
use super::deferred::DeferredQueue;
use super::edges::EdgeDecorator;
use super::layout::{LayoutConfig, place_child};
use super::style::NodeStyleTable;
use super::surface::RenderSurface;
use super::types::{EdgeIndex, HiddenChildren, NodeId, NodeSpec};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpansionError {
	#[error("cannot expand {0}: node is not placed on the surface")]
	ParentNotPlaced(NodeId),
}

pub type ExpansionResult<T> = Result<T, ExpansionError>;

pub struct ExpansionManager<S> {
	surface: S,
	hidden: HiddenChildren,
	styles: NodeStyleTable,
	edge_index: EdgeIndex,
	layout: LayoutConfig,
	decorator: EdgeDecorator,
	config: ExplorerConfig,
	expanded: HashSet<NodeId>,
	/// Child id to the expanded parents whose expansion put it on the surface.
	holders: HashMap<NodeId, HashSet<NodeId>>,
	/// Edges created by expansion, as opposed to edges the surface started with.
	added_edges: HashSet<(NodeId, NodeId)>,
	/// Parents whose auto-expanding children are waiting to be expanded.
	deferred: DeferredQueue<NodeId>,
}

impl<S: RenderSurface> ExpansionManager<S> {
	pub fn initialize(
		surface: S,
		hidden: HiddenChildren,
		styles: NodeStyleTable,
		edge_index: EdgeIndex,
	) -> Self {
		Self {
			surface,
			hidden,
			styles,
			edge_index,
			layout: LayoutConfig::default(),
			decorator: EdgeDecorator::default(),
			config: ExplorerConfig::default(),
			expanded: HashSet::new(),
			holders: HashMap::new(),
			added_edges: HashSet::new(),
			deferred: DeferredQueue::default(),
		}
	}

	pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
		self.layout = layout;
		self
	}

	pub fn with_decorator(mut self, decorator: EdgeDecorator) -> Self {
		self.decorator = decorator;
		self
	}

	pub fn with_config(mut self, config: ExplorerConfig) -> Self {
		self.config = config;
		self
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	pub fn is_expanded(&self, id: &str) -> bool {
		self.expanded.contains(id)
	}

	pub fn is_expandable(&self, id: &str) -> bool {
		self.hidden.contains_key(id)
	}

	pub fn has_deferred(&self) -> bool {
		!self.deferred.is_empty()
	}

	/// Toggle `id`. Nodes without hidden children are ignored.
	pub fn on_node_click(&mut self, id: &str) -> ExpansionResult<()> {
		if !self.is_expandable(id) {
			return Ok(());
		}
		if self.is_expanded(id) {
			self.collapse(id);
			Ok(())
		} else {
			self.expand(id)
		}
	}

	/// Reveal the children of `parent` below its current position.
	///
	/// Children already on the surface keep their place and only gain an edge
	/// from `parent`. Children flagged `auto_expand` are expanded in turn once
	/// the configured delay has passed, see [`Self::run_deferred`].
	pub fn expand(&mut self, parent: &str) -> ExpansionResult<()> {
		if self.is_expanded(parent) {
			return Ok(());
		}
		let Some(children) = self.hidden.get(parent) else {
			return Ok(());
		};

		let present = self.surface.node_ids();
		let origin = self
			.surface
			.position(parent)
			.ok_or_else(|| ExpansionError::ParentNotPlaced(parent.to_string()))?;
		let count = children.len();

		let mut nodes = Vec::new();
		let mut edges = Vec::new();
		for child in children {
			if !present.contains(&child.id) {
				let spacing = self.layout.spacing_for(&child.node_type);
				nodes.push(NodeSpec {
					id: child.id.clone(),
					label: child.label.clone(),
					position: place_child(origin, nodes.len(), count, spacing, &child.node_type),
					style: self.styles.lookup(&child.node_type),
					expandable: self.hidden.contains_key(&child.id),
				});
				self.holders
					.entry(child.id.clone())
					.or_default()
					.insert(parent.to_string());
			} else if let Some(holders) = self.holders.get_mut(&child.id) {
				holders.insert(parent.to_string());
			}

			if !self.surface.has_edge(parent, &child.id) {
				edges.push(self.decorator.decorate(parent, &child.id, &self.edge_index));
				self.added_edges
					.insert((parent.to_string(), child.id.clone()));
			}
		}

		debug!(
			"expand {}: {} new nodes, {} new edges",
			parent,
			nodes.len(),
			edges.len()
		);
		if !nodes.is_empty() {
			self.surface.add_nodes(nodes);
		}
		if !edges.is_empty() {
			self.surface.add_edges(edges);
		}
		self.expanded.insert(parent.to_string());

		if children.iter().any(|c| c.auto_expand) {
			let due = self.surface.clock_ms() + self.config.auto_expand_delay_ms;
			self.deferred.schedule(due, parent.to_string());
		}
		Ok(())
	}

	/// Hide the children of `parent`, tearing down expanded descendants first.
	pub fn collapse(&mut self, parent: &str) {
		if !self.is_expanded(parent) {
			return;
		}
		self.collapse_subtree(parent);
		self.surface.stabilize();
	}

	fn collapse_subtree(&mut self, parent: &str) {
		// Cleared up front so a cycle in the lineage cannot recurse forever.
		self.expanded.remove(parent);
		let Some(children) = self.hidden.get(parent) else {
			return;
		};
		let child_ids: Vec<NodeId> = children.iter().map(|c| c.id.clone()).collect();

		let (released, detached) = match self.config.shared_children {
			SharedChildPolicy::BestEffort => {
				for id in &child_ids {
					self.holders.remove(id);
				}
				(child_ids, Vec::new())
			}
			SharedChildPolicy::RefCounted => self.release_children(parent, child_ids),
		};

		for child in &released {
			if self.expanded.contains(child) {
				self.collapse_subtree(child);
			}
		}

		let present = self.surface.node_ids();
		let removed: Vec<NodeId> = released
			.into_iter()
			.filter(|id| present.contains(id))
			.collect();
		self.added_edges
			.retain(|(from, to)| !removed.contains(from) && !removed.contains(to));

		let detached: Vec<(NodeId, NodeId)> = detached
			.into_iter()
			.filter(|edge| self.added_edges.remove(edge))
			.filter(|(from, to)| self.surface.has_edge(from, to))
			.collect();

		debug!(
			"collapse {}: removing {} nodes, detaching {} shared children",
			parent,
			removed.len(),
			detached.len()
		);
		if !removed.is_empty() {
			self.surface.remove_nodes(&removed);
		}
		if !detached.is_empty() {
			self.surface.remove_edges(&detached);
		}
	}

	/// Drop `parent` as a holder of its children. Returns the children nobody
	/// holds any more, and the edges to children that must stay visible.
	fn release_children(
		&mut self,
		parent: &str,
		child_ids: Vec<NodeId>,
	) -> (Vec<NodeId>, Vec<(NodeId, NodeId)>) {
		let mut released = Vec::new();
		let mut detached = Vec::new();
		for child in child_ids {
			match self.holders.get_mut(&child) {
				Some(holders) => {
					holders.remove(parent);
					if holders.is_empty() {
						self.holders.remove(&child);
						released.push(child);
					} else {
						detached.push((parent.to_string(), child));
					}
				}
				None => detached.push((parent.to_string(), child)),
			}
		}
		(released, detached)
	}

	/// Run every auto-expansion whose delay has elapsed on the surface clock.
	///
	/// Each task re-checks the surface: a child removed since the task was
	/// scheduled is skipped.
	pub fn run_deferred(&mut self) -> ExpansionResult<()> {
		let now = self.surface.clock_ms();
		for parent in self.deferred.take_due(now) {
			self.auto_expand_children(&parent)?;
		}
		Ok(())
	}

	fn auto_expand_children(&mut self, parent: &str) -> ExpansionResult<()> {
		let Some(children) = self.hidden.get(parent) else {
			return Ok(());
		};
		let candidates: Vec<NodeId> = children
			.iter()
			.filter(|c| c.auto_expand && self.hidden.contains_key(&c.id))
			.map(|c| c.id.clone())
			.collect();

		for child in candidates {
			if self.expanded.contains(&child) {
				continue;
			}
			if self.surface.position(&child).is_none() {
				warn!("skipping auto-expand of {}: no longer on the surface", child);
				continue;
			}
			self.expand(&child)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::lineage_graph::surface::recording::{RecordingSurface, SurfaceCall};
	use crate::components::lineage_graph::types::{ChildDescriptor, EdgeDescriptor, Position};

	fn child(id: &str, node_type: &str) -> ChildDescriptor {
		ChildDescriptor {
			id: id.into(),
			label: id.to_uppercase(),
			node_type: node_type.into(),
			auto_expand: false,
		}
	}

	fn auto(id: &str, node_type: &str) -> ChildDescriptor {
		ChildDescriptor {
			auto_expand: true,
			..child(id, node_type)
		}
	}

	/// fn -> ds -> (dp1, dp2); dp1 -> t1 (auto) -> c1
	fn lineage() -> HiddenChildren {
		let mut hidden = HiddenChildren::new();
		hidden.insert("fn".into(), vec![child("ds", "dataset")]);
		hidden.insert(
			"ds".into(),
			vec![child("dp1", "datapoint"), child("dp2", "datapoint")],
		);
		hidden.insert("dp1".into(), vec![auto("t1", "table")]);
		hidden.insert("t1".into(), vec![child("c1", "column")]);
		hidden
	}

	fn edge_index() -> EdgeIndex {
		let mut index = EdgeIndex::default();
		index.insert(
			"dp1",
			"t1",
			EdgeDescriptor {
				edge_type: "datapoint_to_table".into(),
				method: Some("AVG".into()),
				..Default::default()
			},
		);
		index
	}

	fn manager() -> ExpansionManager<RecordingSurface> {
		ExpansionManager::initialize(
			RecordingSurface::default().with_node("fn", 0.0, 0.0),
			lineage(),
			NodeStyleTable::default(),
			edge_index(),
		)
	}

	fn snapshot(m: &ExpansionManager<RecordingSurface>) -> (Vec<NodeId>, Vec<(NodeId, NodeId)>) {
		(m.surface().node_keys(), m.surface().edge_keys())
	}

	#[test]
	fn expand_places_child_below_parent() {
		let mut m = manager();
		m.expand("fn").unwrap();

		let ds = &m.surface().nodes["ds"];
		// dataset spacing 400/220, one child
		assert_eq!(ds.position, Position::new(-200.0, 220.0));
		assert_eq!(ds.label, "DS");
		assert!(ds.expandable);
		assert_eq!(m.surface().edge_keys(), vec![("fn".into(), "ds".into())]);
		assert!(m.is_expanded("fn"));
	}

	#[test]
	fn nodes_are_added_before_edges() {
		let mut m = manager();
		m.expand("fn").unwrap();
		assert_eq!(
			m.surface().calls,
			vec![
				SurfaceCall::AddNodes(vec!["ds".into()]),
				SurfaceCall::AddEdges(vec![("fn".into(), "ds".into())]),
			]
		);
	}

	#[test]
	fn expand_twice_is_idempotent() {
		let mut m = manager();
		m.expand("fn").unwrap();
		let once = snapshot(&m);
		let calls = m.surface().calls.len();

		m.expand("fn").unwrap();
		assert_eq!(snapshot(&m), once);
		assert_eq!(m.surface().calls.len(), calls);
	}

	#[test]
	fn collapse_of_unexpanded_node_is_noop() {
		let mut m = manager();
		m.collapse("fn");
		m.collapse("nowhere");
		assert!(m.surface().calls.is_empty());
	}

	#[test]
	fn expand_then_collapse_restores_surface() {
		let mut m = manager();
		let before = snapshot(&m);

		m.expand("fn").unwrap();
		m.collapse("fn");

		assert_eq!(snapshot(&m), before);
		assert!(!m.is_expanded("fn"));
		assert_eq!(m.surface().stabilize_count(), 1);
	}

	#[test]
	fn click_toggles_and_ignores_leaves() {
		let mut m = manager();
		m.on_node_click("fn").unwrap();
		assert!(m.is_expanded("fn"));

		m.on_node_click("dp-not-hidden").unwrap();
		m.on_node_click("fn").unwrap();
		assert!(!m.is_expanded("fn"));
		assert_eq!(m.surface().node_keys(), vec!["fn".to_string()]);
	}

	#[test]
	fn expanding_unplaced_parent_fails() {
		let mut m = manager();
		assert_eq!(
			m.expand("ds"),
			Err(ExpansionError::ParentNotPlaced("ds".into()))
		);
		assert!(!m.is_expanded("ds"));
		assert!(m.surface().calls.is_empty());
	}

	#[test]
	fn collapse_tears_down_grandchildren_first() {
		let mut m = manager();
		m.expand("fn").unwrap();
		m.expand("ds").unwrap();
		m.surface_mut().calls.clear();

		m.collapse("fn");

		assert_eq!(
			m.surface().calls,
			vec![
				SurfaceCall::RemoveNodes(vec!["dp1".into(), "dp2".into()]),
				SurfaceCall::RemoveNodes(vec!["ds".into()]),
				SurfaceCall::Stabilize,
			]
		);
		assert!(!m.is_expanded("ds"));
		assert_eq!(m.surface().node_keys(), vec!["fn".to_string()]);
		assert!(m.surface().edges.is_empty());
	}

	#[test]
	fn datapoint_to_table_edge_carries_method() {
		let mut m = manager();
		m.expand("fn").unwrap();
		m.expand("ds").unwrap();
		m.expand("dp1").unwrap();

		let edges = &m.surface().edges;
		let labeled = &edges[&("dp1".to_string(), "t1".to_string())];
		assert_eq!(labeled.label.as_deref(), Some("AVG"));
		let plain = &edges[&("ds".to_string(), "dp1".to_string())];
		assert_eq!(plain.label, None);
	}

	#[test]
	fn auto_expand_fires_after_delay() {
		let mut m = manager();
		m.expand("fn").unwrap();
		m.expand("ds").unwrap();
		m.expand("dp1").unwrap();
		assert!(m.surface().nodes.contains_key("t1"));
		assert!(m.has_deferred());

		m.run_deferred().unwrap();
		assert!(!m.is_expanded("t1"));

		m.surface_mut().advance(100.0);
		m.run_deferred().unwrap();
		assert!(m.is_expanded("t1"));
		assert!(m.surface().nodes.contains_key("c1"));
		assert!(!m.has_deferred());
	}

	#[test]
	fn auto_expand_after_collapse_is_skipped() {
		let mut m = manager();
		m.expand("fn").unwrap();
		m.expand("ds").unwrap();
		m.expand("dp1").unwrap();
		m.collapse("dp1");

		m.surface_mut().advance(500.0);
		m.run_deferred().unwrap();

		assert!(!m.is_expanded("t1"));
		assert!(!m.surface().nodes.contains_key("t1"));
		assert!(!m.surface().nodes.contains_key("c1"));
	}

	#[test]
	fn only_new_children_are_indexed_for_layout() {
		let mut hidden = HiddenChildren::new();
		hidden.insert(
			"p".into(),
			vec![child("a", "table"), child("b", "table"), child("c", "table")],
		);
		let surface = RecordingSurface::default()
			.with_node("p", 0.0, 0.0)
			.with_node("a", 999.0, 999.0);
		let mut m = ExpansionManager::initialize(
			surface,
			hidden,
			NodeStyleTable::default(),
			EdgeIndex::default(),
		);
		m.expand("p").unwrap();

		let nodes = &m.surface().nodes;
		// table spacing 200, three siblings
		assert_eq!(nodes["a"].position, Position::new(999.0, 999.0));
		assert_eq!(nodes["b"].position, Position::new(-300.0, 180.0));
		assert_eq!(nodes["c"].position, Position::new(-100.0, 180.0));
		assert_eq!(m.surface().edges.len(), 3);
	}

	#[test]
	fn large_datapoint_fan_out_uses_grid() {
		let mut hidden = HiddenChildren::new();
		hidden.insert(
			"ds".into(),
			(0..10)
				.map(|i| child(&format!("dp{i}"), "datapoint"))
				.collect(),
		);
		let mut m = ExpansionManager::initialize(
			RecordingSurface::default().with_node("ds", 0.0, 0.0),
			hidden,
			NodeStyleTable::default(),
			EdgeIndex::default(),
		);
		m.expand("ds").unwrap();

		// datapoint spacing 180/180, 4 per row
		let p = m.surface().nodes["dp5"].position;
		assert_eq!(p, Position::new(180.0 - 4.0 * 180.0 / 2.0, 180.0 + 80.0));
	}

	fn shared_lineage(policy: SharedChildPolicy) -> ExpansionManager<RecordingSurface> {
		let mut hidden = HiddenChildren::new();
		hidden.insert("fa".into(), vec![child("shared", "table"), child("a1", "table")]);
		hidden.insert("fb".into(), vec![child("shared", "table")]);
		let surface = RecordingSurface::default()
			.with_node("fa", 0.0, 0.0)
			.with_node("fb", 500.0, 0.0);
		ExpansionManager::initialize(surface, hidden, NodeStyleTable::default(), EdgeIndex::default())
			.with_config(ExplorerConfig {
				shared_children: policy,
				..ExplorerConfig::default()
			})
	}

	#[test]
	fn shared_child_survives_while_another_parent_holds_it() {
		let mut m = shared_lineage(SharedChildPolicy::RefCounted);
		m.expand("fa").unwrap();
		m.expand("fb").unwrap();
		assert!(m.surface().has_edge("fb", "shared"));

		m.collapse("fa");
		assert_eq!(m.surface().node_keys(), vec!["fa", "fb", "shared"]);
		assert_eq!(
			m.surface().edge_keys(),
			vec![("fb".to_string(), "shared".to_string())]
		);

		m.collapse("fb");
		assert_eq!(m.surface().node_keys(), vec!["fa", "fb"]);
		assert!(m.surface().edges.is_empty());
		assert_eq!(m.surface().stabilize_count(), 2);
	}

	#[test]
	fn best_effort_removes_shared_child() {
		let mut m = shared_lineage(SharedChildPolicy::BestEffort);
		m.expand("fa").unwrap();
		m.expand("fb").unwrap();

		m.collapse("fa");
		assert_eq!(m.surface().node_keys(), vec!["fa", "fb"]);
		assert!(m.is_expanded("fb"));
	}

	#[test]
	fn independent_children_and_their_edges_are_kept() {
		let mut hidden = HiddenChildren::new();
		hidden.insert("root".into(), vec![child("fn", "function"), child("other", "function")]);
		let mut surface = RecordingSurface::default()
			.with_node("root", 0.0, 0.0)
			.with_node("fn", 0.0, 180.0);
		surface.add_edges(vec![EdgeDecorator::default().decorate("root", "fn", &EdgeIndex::default())]);
		surface.calls.clear();

		let mut m = ExpansionManager::initialize(
			surface,
			hidden,
			NodeStyleTable::default(),
			EdgeIndex::default(),
		);
		m.expand("root").unwrap();
		assert_eq!(
			m.surface().calls[0],
			SurfaceCall::AddNodes(vec!["other".into()])
		);
		assert_eq!(
			m.surface().calls[1],
			SurfaceCall::AddEdges(vec![("root".into(), "other".into())])
		);

		m.collapse("root");
		assert_eq!(m.surface().node_keys(), vec!["fn", "root"]);
		assert_eq!(
			m.surface().edge_keys(),
			vec![("root".to_string(), "fn".to_string())]
		);
	}

	#[test]
	fn expanded_shared_table_outlives_first_datapoint() {
		let mut hidden = HiddenChildren::new();
		hidden.insert("dp1".into(), vec![auto("tbl", "table")]);
		hidden.insert("dp2".into(), vec![auto("tbl", "table")]);
		hidden.insert("tbl".into(), vec![child("c1", "column"), child("c2", "column")]);
		let surface = RecordingSurface::default()
			.with_node("dp1", 0.0, 0.0)
			.with_node("dp2", 300.0, 0.0);
		let mut m = ExpansionManager::initialize(
			surface,
			hidden,
			NodeStyleTable::default(),
			EdgeIndex::default(),
		);

		m.expand("dp1").unwrap();
		m.surface_mut().advance(100.0);
		m.run_deferred().unwrap();
		assert!(m.is_expanded("tbl"));
		assert_eq!(m.surface().node_keys(), vec!["c1", "c2", "dp1", "dp2", "tbl"]);

		m.expand("dp2").unwrap();
		m.collapse("dp1");
		assert!(m.is_expanded("tbl"));
		assert_eq!(m.surface().node_keys(), vec!["c1", "c2", "dp1", "dp2", "tbl"]);
		assert!(!m.surface().has_edge("dp1", "tbl"));
		assert!(m.surface().has_edge("dp2", "tbl"));

		// the auto-expand queued by dp2 finds the table already expanded
		m.surface_mut().advance(100.0);
		m.run_deferred().unwrap();

		let stabilized = m.surface().stabilize_count();
		let from = m.surface().calls.len();
		m.collapse("dp2");
		assert_eq!(
			m.surface().calls[from..].to_vec(),
			vec![
				SurfaceCall::RemoveNodes(vec!["c1".into(), "c2".into()]),
				SurfaceCall::RemoveNodes(vec!["tbl".into()]),
				SurfaceCall::Stabilize,
			]
		);
		assert_eq!(m.surface().stabilize_count(), stabilized + 1);
		assert!(!m.is_expanded("tbl"));
		assert_eq!(m.surface().node_keys(), vec!["dp1", "dp2"]);
		assert!(m.surface().edges.is_empty());
	}
}
