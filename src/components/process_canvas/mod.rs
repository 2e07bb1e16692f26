mod component;
mod config;
mod dialogs;
mod error;
mod geometry;
mod history;
mod interaction;
mod model;
mod render;
mod session;
mod state;
mod types;
mod viewport;

pub use component::ProcessCanvas;
pub use config::CanvasConfig;
pub use error::{GraphError, SaveError};
pub use session::{SaveFn, SaveFuture};
pub use state::SessionScope;
pub use types::{
	Dimension, Edge, EdgeId, EdgeType, Graph, Level, Marker, Node, NodeId, Provenance, Rect,
};
