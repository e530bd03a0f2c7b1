mod component;
mod config;
mod data;
mod deferred;
mod edges;
mod expansion;
mod layout;
mod render;
mod state;
mod style;
mod surface;
mod types;

pub use component::LineageGraphCanvas;
pub use config::ExplorerConfig;
pub use data::{InitialEdge, InitialNode, LineageData};
pub use types::{ChildDescriptor, EdgeDescriptor};
