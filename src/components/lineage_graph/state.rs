use std::collections::{HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::warn;

use super::config::{ExplorerConfig, PhysicsConfig};
use super::render::estimated_extent;
use super::style::{FontStyle, NodeShape, NodeStyle};
use super::surface::RenderSurface;
use super::types::{EdgeSpec, NodeId, NodeSpec, Position};

/// Smallest clickable half extent, in graph units.
pub const HIT_RADIUS: f64 = 12.0;
/// Pointer travel, in screen pixels, under which a press/release is a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	pub style: NodeStyle,
	pub expandable: bool,
}

impl NodeInfo {
	pub fn radius(&self) -> f64 {
		self.style.size / 2.0
	}
}

#[derive(Clone, Debug, Default)]
pub struct EdgeInfo {
	pub width: f64,
	pub color: String,
	pub label: Option<String>,
	pub font: Option<FontStyle>,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

impl From<PhysicsConfig> for SimulationParameters {
	fn from(p: PhysicsConfig) -> Self {
		SimulationParameters {
			force_charge: p.force_charge,
			force_spring: p.force_spring,
			force_max: p.force_max,
			node_speed: p.node_speed,
			damping_factor: p.damping_factor,
		}
	}
}

/// Canvas-backed rendering surface: the physics graph plus view state.
pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	clock_ms: f64,
	settle_until: f64,
	settle_ms: f64,
	anchor_placed: bool,
	ids: HashMap<NodeId, DefaultNodeIdx>,
	edges: HashMap<(DefaultNodeIdx, DefaultNodeIdx), EdgeInfo>,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, config: &ExplorerConfig) -> Self {
		Self {
			graph: ForceGraph::new(config.physics.into()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 4.0,
				k: 0.6,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			clock_ms: 0.0,
			settle_until: 0.0,
			settle_ms: config.settle_ms,
			anchor_placed: config.anchor_placed_nodes,
			ids: HashMap::new(),
			edges: HashMap::new(),
		}
	}

	pub fn edge_info(&self, src: DefaultNodeIdx, tgt: DefaultNodeIdx) -> Option<&EdgeInfo> {
		self.edges.get(&(src, tgt))
	}

	pub fn is_settling(&self) -> bool {
		self.clock_ms < self.settle_until
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			let (w, h) = estimated_extent(info, self.transform.k);
			let (w, h) = (w.max(HIT_RADIUS), h.max(HIT_RADIUS));
			let (dx, dy) = ((node.x() as f64 - gx).abs(), (node.y() as f64 - gy).abs());
			let inside = match info.style.shape {
				NodeShape::Box | NodeShape::Database => dx <= w && dy <= h,
				_ => (dx / w).powi(2) + (dy / h).powi(2) <= 1.0,
			};
			if inside {
				found = Some(node.index());
			}
		});
		found
	}

	fn node_data(&self, idx: DefaultNodeIdx) -> Option<NodeData<NodeInfo>> {
		let mut data = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				data = Some(NodeData {
					x: node.data.x,
					y: node.data.y,
					mass: node.data.mass,
					is_anchor: node.data.is_anchor,
					user_data: node.data.user_data.clone(),
				});
			}
		});
		data
	}

	/// Start dragging the node under the pointer, or panning if there is none.
	pub fn begin_drag(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag.active = true;
			self.drag.moved = false;
			self.drag.node_idx = Some(idx);
			self.drag.start_x = x;
			self.drag.start_y = y;
			if let Some(data) = self.node_data(idx) {
				self.drag.node_start_x = data.x;
				self.drag.node_start_y = data.y;
			}
		} else {
			self.pan.active = true;
			self.pan.start_x = x;
			self.pan.start_y = y;
			self.pan.transform_start_x = self.transform.x;
			self.pan.transform_start_y = self.transform.y;
		}
	}

	pub fn pointer_moved(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			if !self.drag.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
				return;
			}
			self.drag.moved = true;
			let (nx, ny) = (
				self.drag.node_start_x + (dx / self.transform.k) as f32,
				self.drag.node_start_y + (dy / self.transform.k) as f32,
			);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Finish the current gesture. Returns the node id when the gesture was a
	/// click on a node rather than a drag.
	pub fn end_drag(&mut self) -> Option<NodeId> {
		let clicked = match (self.drag.active, self.drag.node_idx) {
			(true, Some(idx)) if !self.drag.moved => self.node_data(idx).map(|d| d.user_data.id),
			(true, Some(_)) => {
				self.stabilize();
				None
			}
			_ => None,
		};
		self.drag.active = false;
		self.drag.moved = false;
		self.drag.node_idx = None;
		self.pan.active = false;
		clicked
	}

	pub fn pointer_left(&mut self) {
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
		self.set_hover(None);
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in self.edges.keys() {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.clock_ms += dt as f64 * 1000.0;
		if self.is_settling() {
			self.graph.update(dt);
		}

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn forget_hover(&mut self, idx: DefaultNodeIdx) {
		if self.hover.node == Some(idx) || self.hover.prev_node == Some(idx) {
			self.hover = HoverState::default();
		}
		self.hover.neighbors.remove(&idx);
		self.hover.prev_neighbors.remove(&idx);
		if self.drag.node_idx == Some(idx) {
			self.drag = DragState::default();
		}
	}

	/// Replace the physics node of `id` with a fresh one at the same spot,
	/// carrying over only the edges still recorded for it. The physics graph
	/// cannot drop a single edge, so this is how an edge is removed.
	fn reseat(&mut self, id: &str) {
		let Some(&old) = self.ids.get(id) else {
			return;
		};
		let Some(data) = self.node_data(old) else {
			return;
		};
		let kept: Vec<((DefaultNodeIdx, DefaultNodeIdx), EdgeInfo)> = self
			.edges
			.iter()
			.filter(|((s, t), _)| *s == old || *t == old)
			.map(|(k, v)| (*k, v.clone()))
			.collect();

		self.forget_hover(old);
		self.graph.remove_node(old);
		self.edges.retain(|(s, t), _| *s != old && *t != old);

		let new = self.graph.add_node(data);
		self.ids.insert(id.to_string(), new);
		for ((s, t), info) in kept {
			let (s, t) = (
				if s == old { new } else { s },
				if t == old { new } else { t },
			);
			self.graph.add_edge(s, t, EdgeData::default());
			self.edges.insert((s, t), info);
		}
	}
}

impl RenderSurface for ForceGraphState {
	fn add_nodes(&mut self, nodes: Vec<NodeSpec>) {
		for node in nodes {
			if self.ids.contains_key(&node.id) {
				warn!("node {} is already on the canvas", node.id);
				continue;
			}
			let idx = self.graph.add_node(NodeData {
				x: node.position.x as f32,
				y: node.position.y as f32,
				mass: 10.0,
				is_anchor: self.anchor_placed,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label,
					style: node.style,
					expandable: node.expandable,
				},
			});
			self.ids.insert(node.id, idx);
		}
	}

	fn add_edges(&mut self, edges: Vec<EdgeSpec>) {
		for edge in edges {
			let (Some(&src), Some(&tgt)) = (self.ids.get(&edge.from), self.ids.get(&edge.to))
			else {
				warn!("edge {} -> {} has no endpoint on the canvas", edge.from, edge.to);
				continue;
			};
			if self.edges.contains_key(&(src, tgt)) {
				continue;
			}
			self.graph.add_edge(src, tgt, EdgeData::default());
			self.edges.insert(
				(src, tgt),
				EdgeInfo {
					width: edge.width,
					color: edge.color,
					label: edge.label,
					font: edge.font,
				},
			);
		}
	}

	fn remove_nodes(&mut self, ids: &[NodeId]) {
		for id in ids {
			let Some(idx) = self.ids.remove(id) else {
				continue;
			};
			self.forget_hover(idx);
			self.graph.remove_node(idx);
			self.edges.retain(|(s, t), _| *s != idx && *t != idx);
		}
	}

	fn remove_edges(&mut self, edges: &[(NodeId, NodeId)]) {
		for (from, to) in edges {
			let (Some(&src), Some(&tgt)) = (self.ids.get(from), self.ids.get(to)) else {
				continue;
			};
			if self.edges.remove(&(src, tgt)).is_some() {
				self.reseat(to);
			}
		}
	}

	fn node_ids(&self) -> HashSet<NodeId> {
		self.ids.keys().cloned().collect()
	}

	fn has_edge(&self, from: &str, to: &str) -> bool {
		match (self.ids.get(from), self.ids.get(to)) {
			(Some(src), Some(tgt)) => self.edges.contains_key(&(*src, *tgt)),
			_ => false,
		}
	}

	fn position(&self, id: &str) -> Option<Position> {
		let idx = *self.ids.get(id)?;
		self.node_data(idx)
			.map(|d| Position::new(d.x as f64, d.y as f64))
	}

	fn stabilize(&mut self) {
		self.settle_until = self.clock_ms + self.settle_ms;
	}

	fn clock_ms(&self) -> f64 {
		self.clock_ms
	}
}
