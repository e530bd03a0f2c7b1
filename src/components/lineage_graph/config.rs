use serde::{Deserialize, Serialize};

/// What collapsing a parent does to a child that other parents also reveal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedChildPolicy {
	/// A child stays on the surface while any expanded parent still holds it.
	#[default]
	RefCounted,
	/// Every direct child is removed, regardless of other parents.
	BestEffort,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
	/// Delay between a parent's batch insert and its children auto-expanding.
	pub auto_expand_delay_ms: f64,
	/// How long a stabilize request keeps the simulation running.
	pub settle_ms: f64,
	pub shared_children: SharedChildPolicy,
	/// Pin placed nodes where the layout put them. When false, every
	/// stabilize lets the simulation pull the computed rows and grids apart
	/// for `settle_ms`.
	pub anchor_placed_nodes: bool,
	pub physics: PhysicsConfig,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			auto_expand_delay_ms: 100.0,
			settle_ms: 1500.0,
			shared_children: SharedChildPolicy::default(),
			anchor_placed_nodes: true,
			physics: PhysicsConfig::default(),
		}
	}
}
