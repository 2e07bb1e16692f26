use thiserror::Error;

use super::types::{EdgeId, NodeId};

/// A rejected graph mutation. The graph is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	#[error("process text cannot be empty")]
	EmptyText,
	#[error("a process named \"{0}\" already exists")]
	DuplicateText(String),
	#[error("a process cannot be connected to itself")]
	SelfLoop,
	#[error("these processes are already connected")]
	DuplicateEdge,
	#[error("unknown process {0}")]
	UnknownNode(NodeId),
	#[error("unknown connection {0}")]
	UnknownEdge(EdgeId),
	#[error("the canvas is read-only")]
	ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
	#[error("the network could not be saved")]
	Rejected,
	#[error("saving failed: {0}")]
	Failed(String),
	#[error("a save is already in progress")]
	InFlight,
}
