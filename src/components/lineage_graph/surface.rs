use std::collections::HashSet;

use super::types::{EdgeSpec, NodeId, NodeSpec, Position};

/// The drawing and physics side of the graph, as seen by the expansion logic.
///
/// Node ids are unique; inserting an id twice, or an edge whose endpoints are
/// absent, is a caller error.
pub trait RenderSurface {
	fn add_nodes(&mut self, nodes: Vec<NodeSpec>);

	fn add_edges(&mut self, edges: Vec<EdgeSpec>);

	/// Removes the nodes together with every edge touching them.
	fn remove_nodes(&mut self, ids: &[NodeId]);

	fn remove_edges(&mut self, edges: &[(NodeId, NodeId)]);

	fn node_ids(&self) -> HashSet<NodeId>;

	fn has_edge(&self, from: &str, to: &str) -> bool;

	fn position(&self, id: &str) -> Option<Position>;

	/// Request a layout settle pass. Returns immediately.
	fn stabilize(&mut self);

	/// Monotonic surface time in milliseconds.
	fn clock_ms(&self) -> f64;
}
