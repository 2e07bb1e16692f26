//! In-memory process network and the invariants every mutation must keep.
//!
//! Invariants held after every public call:
//! - every edge endpoint names a live node (deleting a node cascades)
//! - at most one edge per unordered node pair, and no self-loops
//! - node text is non-blank and unique, compared trimmed and case-insensitively
//! - node size never drops below the configured minimum, position never below zero

use std::collections::HashSet;

use log::{debug, warn};

use super::config::CanvasConfig;
use super::error::GraphError;
use super::types::{
	Edge, EdgeId, EdgePatch, EdgeType, Graph, Marker, Node, NodeId, NodeTags, Point, Rect,
};

/// Offset applied when a new node would land on top of an existing one.
const CASCADE_STEP: f64 = 24.0;
const CASCADE_TRIES: usize = 64;

fn text_key(text: &str) -> String {
	text.trim().to_lowercase()
}

/// `base`, or `base` with the lowest counter from 2 up, whose key is not taken.
fn free_label(base: &str, taken: &HashSet<String>) -> String {
	let base = base.trim();
	if !taken.contains(&text_key(base)) {
		return base.to_string();
	}
	(2..)
		.map(|i| format!("{base} {i}"))
		.find(|candidate| !taken.contains(&text_key(candidate)))
		.unwrap_or_else(|| base.to_string())
}

#[derive(Clone, Debug)]
pub struct GraphModel {
	graph: Graph,
	config: CanvasConfig,
}

impl GraphModel {
	/// Wrap a graph loaded from outside, repairing anything that breaks the
	/// invariants. Offending edges are dropped, geometry and strength clamped,
	/// blank or repeated texts relabelled.
	pub fn new(mut graph: Graph, config: CanvasConfig) -> Self {
		let config = config.validated();

		let mut seen_nodes = HashSet::new();
		graph.nodes.retain(|n| {
			let fresh = seen_nodes.insert(n.id);
			if !fresh {
				warn!("dropping node with repeated id {}", n.id);
			}
			fresh
		});
		let mut taken = HashSet::new();
		let mut relabel = Vec::new();
		for (i, node) in graph.nodes.iter_mut().enumerate() {
			node.rect = clamp_rect(node.rect, &config);
			let key = text_key(&node.text);
			if key.is_empty() || !taken.insert(key) {
				relabel.push(i);
			}
		}
		for i in relabel {
			let node = &mut graph.nodes[i];
			let base = match node.text.trim() {
				"" => config.default_node_text.clone(),
				text => text.to_string(),
			};
			let label = free_label(&base, &taken);
			warn!("relabelling node {} from {:?} to {:?}", node.id, node.text, label);
			taken.insert(text_key(&label));
			node.text = label;
		}

		let mut kept: Vec<Edge> = Vec::with_capacity(graph.edges.len());
		for mut edge in graph.edges.drain(..) {
			if edge.from == edge.to {
				warn!("dropping self-loop edge {}", edge.id);
			} else if !seen_nodes.contains(&edge.from) || !seen_nodes.contains(&edge.to) {
				warn!("dropping dangling edge {}", edge.id);
			} else if kept.iter().any(|e| e.connects(edge.from, edge.to) || e.id == edge.id) {
				warn!("dropping duplicate edge {}", edge.id);
			} else {
				edge.strength = edge.strength.min(config.max_strength);
				kept.push(edge);
			}
		}
		graph.edges = kept;

		Self { graph, config }
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn config(&self) -> &CanvasConfig {
		&self.config
	}

	/// Replace the whole graph with a snapshot taken from this model earlier.
	pub fn restore(&mut self, graph: Graph) {
		self.graph = graph;
	}

	fn checked_text(&self, text: &str, except: Option<NodeId>) -> Result<String, GraphError> {
		let trimmed = text.trim();
		if trimmed.is_empty() {
			return Err(GraphError::EmptyText);
		}
		let key = text_key(trimmed);
		let taken = self
			.graph
			.nodes
			.iter()
			.any(|n| Some(n.id) != except && text_key(&n.text) == key);
		if taken {
			return Err(GraphError::DuplicateText(trimmed.to_string()));
		}
		Ok(trimmed.to_string())
	}

	pub fn add_node(
		&mut self,
		text: &str,
		rect: Option<Rect>,
		tags: NodeTags,
	) -> Result<Node, GraphError> {
		let text = self.checked_text(text, None)?;
		let rect = match rect {
			Some(r) => clamp_rect(r, &self.config),
			None => self.free_spot(Point::new(
				self.config.default_node_width / 2.0,
				self.config.default_node_height / 2.0,
			)),
		};
		let node = Node {
			id: NodeId::new(),
			rect,
			text,
			dimension: tags.dimension,
			level: tags.level,
			provenance: tags.provenance,
		};
		debug!("added node {} \"{}\"", node.id, node.text);
		self.graph.nodes.push(node.clone());
		Ok(node)
	}

	/// Remove a node and every edge touching it. Unknown ids are a no-op.
	pub fn delete_node(&mut self, id: NodeId) -> bool {
		let before = self.graph.nodes.len();
		self.graph.nodes.retain(|n| n.id != id);
		if self.graph.nodes.len() == before {
			return false;
		}
		let edges_before = self.graph.edges.len();
		self.graph.edges.retain(|e| !e.touches(id));
		debug!(
			"deleted node {} and {} edge(s)",
			id,
			edges_before - self.graph.edges.len()
		);
		true
	}

	pub fn update_node_text(&mut self, id: NodeId, text: &str) -> Result<bool, GraphError> {
		if self.graph.node(id).is_none() {
			return Err(GraphError::UnknownNode(id));
		}
		let text = self.checked_text(text, Some(id))?;
		let node = self.graph.node_mut(id).ok_or(GraphError::UnknownNode(id))?;
		if node.text == text {
			return Ok(false);
		}
		node.text = text;
		Ok(true)
	}

	pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<bool, GraphError> {
		let node = self.graph.node_mut(id).ok_or(GraphError::UnknownNode(id))?;
		let (x, y) = (x.max(0.0), y.max(0.0));
		if node.rect.x == x && node.rect.y == y {
			return Ok(false);
		}
		node.rect.x = x;
		node.rect.y = y;
		Ok(true)
	}

	pub fn resize_node(&mut self, id: NodeId, width: f64, height: f64) -> Result<bool, GraphError> {
		let (min_w, min_h) = (self.config.min_node_width, self.config.min_node_height);
		let node = self.graph.node_mut(id).ok_or(GraphError::UnknownNode(id))?;
		let (width, height) = (clamp_min(width, min_w), clamp_min(height, min_h));
		if node.rect.width == width && node.rect.height == height {
			return Ok(false);
		}
		node.rect.width = width;
		node.rect.height = height;
		Ok(true)
	}

	pub fn add_edge(
		&mut self,
		from: NodeId,
		to: NodeId,
		edge_type: EdgeType,
	) -> Result<Edge, GraphError> {
		if from == to {
			return Err(GraphError::SelfLoop);
		}
		for id in [from, to] {
			if self.graph.node(id).is_none() {
				return Err(GraphError::UnknownNode(id));
			}
		}
		if self.graph.edge_between(from, to).is_some() {
			return Err(GraphError::DuplicateEdge);
		}
		let edge = Edge {
			id: EdgeId::new(),
			from,
			to,
			edge_type,
			strength: self.config.default_strength,
			start_marker: self.config.default_start_marker,
			end_marker: self.config.end_marker_for(edge_type),
			ambivalent: false,
		};
		debug!("added {} edge {} -> {}", edge_type.as_str(), from, to);
		self.graph.edges.push(edge.clone());
		Ok(edge)
	}

	/// Apply a patch. Turning `ambivalent` on forces both markers to arrows at
	/// that moment, overriding any markers in the same patch; later marker
	/// edits are kept even while the flag stays on.
	pub fn update_edge(&mut self, id: EdgeId, patch: &EdgePatch) -> Result<bool, GraphError> {
		let max_strength = self.config.max_strength;
		let edge = self.graph.edge_mut(id).ok_or(GraphError::UnknownEdge(id))?;
		let before = edge.clone();

		if let Some(edge_type) = patch.edge_type {
			edge.edge_type = edge_type;
		}
		if let Some(strength) = patch.strength {
			edge.strength = strength.min(max_strength);
		}
		if let Some(marker) = patch.start_marker {
			edge.start_marker = marker;
		}
		if let Some(marker) = patch.end_marker {
			edge.end_marker = marker;
		}
		if let Some(ambivalent) = patch.ambivalent {
			edge.ambivalent = ambivalent;
			if ambivalent {
				edge.start_marker = Marker::Arrow;
				edge.end_marker = Marker::Arrow;
			}
		}
		Ok(*edge != before)
	}

	pub fn delete_edge(&mut self, id: EdgeId) -> bool {
		let before = self.graph.edges.len();
		self.graph.edges.retain(|e| e.id != id);
		self.graph.edges.len() != before
	}

	/// `base`, or `base 2`, `base 3`, ... whichever is free first.
	pub fn unique_label(&self, base: &str) -> String {
		let taken: HashSet<String> = self.graph.nodes.iter().map(|n| text_key(&n.text)).collect();
		free_label(base, &taken)
	}

	/// Default-sized box centred on `center`, nudged diagonally until it
	/// stops overlapping existing nodes.
	pub fn free_spot(&self, center: Point) -> Rect {
		let (w, h) = (self.config.default_node_width, self.config.default_node_height);
		let mut rect = clamp_rect(Rect::new(center.x - w / 2.0, center.y - h / 2.0, w, h), &self.config);
		for _ in 0..CASCADE_TRIES {
			if !self.graph.nodes.iter().any(|n| n.rect.intersects(&rect)) {
				break;
			}
			rect.x += CASCADE_STEP;
			rect.y += CASCADE_STEP;
		}
		rect
	}
}

fn clamp_min(value: f64, min: f64) -> f64 {
	if value.is_nan() { min } else { value.max(min) }
}

fn clamp_rect(rect: Rect, config: &CanvasConfig) -> Rect {
	Rect {
		x: clamp_min(rect.x, 0.0),
		y: clamp_min(rect.y, 0.0),
		width: clamp_min(rect.width, config.min_node_width),
		height: clamp_min(rect.height, config.min_node_height),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model() -> GraphModel {
		GraphModel::new(Graph::default(), CanvasConfig::default())
	}

	#[test]
	fn add_and_connect() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();
		let edge = m.add_edge(a.id, b.id, EdgeType::Adaptive).unwrap();

		assert_eq!(m.graph().nodes.len(), 2);
		assert_eq!(m.graph().edges.len(), 1);
		assert_eq!(edge.edge_type, EdgeType::Adaptive);
		assert_eq!(edge.strength, 3);
		assert_eq!(edge.end_marker, Marker::Circle);
		assert_eq!(edge.start_marker, Marker::None);
	}

	#[test]
	fn duplicate_text_is_rejected() {
		let mut m = model();
		m.add_node("Avoidance", None, NodeTags::default()).unwrap();
		let err = m.add_node("  avoidance ", None, NodeTags::default()).unwrap_err();
		assert_eq!(err, GraphError::DuplicateText("avoidance".into()));
		assert_eq!(m.graph().nodes.len(), 1);
	}

	#[test]
	fn blank_text_is_rejected() {
		let mut m = model();
		assert_eq!(
			m.add_node("   ", None, NodeTags::default()),
			Err(GraphError::EmptyText)
		);
		let a = m.add_node("Worry", None, NodeTags::default()).unwrap();
		assert_eq!(m.update_node_text(a.id, ""), Err(GraphError::EmptyText));
		assert_eq!(m.graph().node(a.id).unwrap().text, "Worry");
	}

	#[test]
	fn rename_checks_other_nodes_only() {
		let mut m = model();
		let a = m.add_node("Worry", None, NodeTags::default()).unwrap();
		m.add_node("Sleep loss", None, NodeTags::default()).unwrap();

		assert_eq!(m.update_node_text(a.id, "WORRY"), Ok(true));
		assert_eq!(m.update_node_text(a.id, " WORRY "), Ok(false));
		assert!(matches!(
			m.update_node_text(a.id, "sleep LOSS"),
			Err(GraphError::DuplicateText(_))
		));
		assert_eq!(m.graph().node(a.id).unwrap().text, "WORRY");
	}

	#[test]
	fn delete_node_cascades() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();
		m.add_edge(a.id, b.id, EdgeType::Maladaptive).unwrap();

		assert!(m.delete_node(a.id));
		assert_eq!(m.graph().nodes.len(), 1);
		assert_eq!(m.graph().nodes[0].id, b.id);
		assert!(m.graph().edges.is_empty());
		assert!(!m.delete_node(a.id));
	}

	#[test]
	fn edges_are_unique_per_pair_and_never_loop() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();

		assert_eq!(
			m.add_edge(a.id, a.id, EdgeType::Adaptive),
			Err(GraphError::SelfLoop)
		);
		m.add_edge(a.id, b.id, EdgeType::Adaptive).unwrap();
		assert_eq!(
			m.add_edge(b.id, a.id, EdgeType::Unchanged),
			Err(GraphError::DuplicateEdge)
		);
		assert_eq!(m.graph().edges.len(), 1);
	}

	#[test]
	fn add_edge_to_unknown_node_fails() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let ghost = NodeId::new();
		assert_eq!(
			m.add_edge(a.id, ghost, EdgeType::Adaptive),
			Err(GraphError::UnknownNode(ghost))
		);
	}

	#[test]
	fn resize_and_move_clamp() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();

		m.resize_node(a.id, 10.0, -5.0).unwrap();
		m.move_node(a.id, -40.0, 25.0).unwrap();
		let rect = m.graph().node(a.id).unwrap().rect;
		assert_eq!((rect.width, rect.height), (120.0, 60.0));
		assert_eq!((rect.x, rect.y), (0.0, 25.0));

		assert_eq!(m.resize_node(a.id, f64::NAN, 300.0), Ok(true));
		let rect = m.graph().node(a.id).unwrap().rect;
		assert_eq!((rect.width, rect.height), (120.0, 300.0));
	}

	#[test]
	fn ambivalence_forces_arrows_once() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();
		let edge = m.add_edge(a.id, b.id, EdgeType::Adaptive).unwrap();

		let patch = EdgePatch {
			ambivalent: Some(true),
			start_marker: Some(Marker::Square),
			..EdgePatch::default()
		};
		m.update_edge(edge.id, &patch).unwrap();
		let e = m.graph().edge(edge.id).unwrap();
		assert!(e.ambivalent);
		assert_eq!((e.start_marker, e.end_marker), (Marker::Arrow, Marker::Arrow));

		let later = EdgePatch {
			end_marker: Some(Marker::Circle),
			..EdgePatch::default()
		};
		m.update_edge(edge.id, &later).unwrap();
		let e = m.graph().edge(edge.id).unwrap();
		assert!(e.ambivalent);
		assert_eq!(e.end_marker, Marker::Circle);
	}

	#[test]
	fn strength_is_capped() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();
		let edge = m.add_edge(a.id, b.id, EdgeType::Unchanged).unwrap();
		let patch = EdgePatch {
			strength: Some(42),
			..EdgePatch::default()
		};
		assert_eq!(m.update_edge(edge.id, &patch), Ok(true));
		assert_eq!(m.graph().edge(edge.id).unwrap().strength, 5);
		assert_eq!(m.update_edge(edge.id, &patch), Ok(false));
	}

	#[test]
	fn load_drops_broken_edges() {
		let mut m = model();
		let a = m.add_node("A", None, NodeTags::default()).unwrap();
		let b = m.add_node("B", None, NodeTags::default()).unwrap();
		let good = m.add_edge(a.id, b.id, EdgeType::Adaptive).unwrap();

		let mut graph = m.graph().clone();
		let mut reverse = good.clone();
		reverse.id = EdgeId::new();
		std::mem::swap(&mut reverse.from, &mut reverse.to);
		let mut dangling = good.clone();
		dangling.id = EdgeId::new();
		dangling.to = NodeId::new();
		let mut looped = good.clone();
		looped.id = EdgeId::new();
		looped.to = looped.from;
		graph.edges.extend([reverse, dangling, looped]);
		graph.nodes[0].rect.width = 3.0;

		let loaded = GraphModel::new(graph, CanvasConfig::default());
		assert_eq!(loaded.graph().edges, vec![good]);
		assert_eq!(loaded.graph().nodes[0].rect.width, 120.0);
	}

	#[test]
	fn load_relabels_blank_and_repeated_text() {
		let mut m = model();
		for text in ["Worry", "Worry 2", "Sleep loss"] {
			m.add_node(text, None, NodeTags::default()).unwrap();
		}
		let mut graph = m.graph().clone();
		graph.nodes[1].text = "worry ".into();
		graph.nodes[2].text = "   ".into();
		graph.nodes.push(Node {
			id: NodeId::new(),
			rect: Rect::new(0.0, 0.0, 120.0, 60.0),
			text: "Worry 2".into(),
			dimension: None,
			level: None,
			provenance: None,
		});

		let loaded = GraphModel::new(graph, CanvasConfig::default());
		let texts: Vec<&str> = loaded.graph().nodes.iter().map(|n| n.text.as_str()).collect();
		assert_eq!(texts, vec!["Worry", "worry 3", "New process", "Worry 2"]);
	}

	#[test]
	fn unique_label_counts_up() {
		let mut m = model();
		assert_eq!(m.unique_label("New process"), "New process");
		m.add_node("New process", None, NodeTags::default()).unwrap();
		m.add_node("new process 2", None, NodeTags::default()).unwrap();
		assert_eq!(m.unique_label("New process"), "New process 3");
	}

	#[test]
	fn free_spot_avoids_overlap() {
		let mut m = model();
		let first = m.free_spot(Point::new(400.0, 300.0));
		m.add_node("A", Some(first), NodeTags::default()).unwrap();
		let second = m.free_spot(Point::new(400.0, 300.0));
		assert!(!second.intersects(&first));
		assert!(second.x > first.x && second.y > first.y);
	}
}
