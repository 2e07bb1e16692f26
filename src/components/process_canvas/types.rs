use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned box in logical canvas units; `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn intersects(&self, other: &Rect) -> bool {
		self.x < other.x + other.width
			&& other.x < self.x + self.width
			&& self.y < other.y + other.height
			&& other.y < self.y + self.height
	}
}

/// Which facet of a case formulation a process belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
	Cognition,
	Emotion,
	Behavior,
	Motivation,
	Physiology,
	Social,
}

impl Dimension {
	pub const ALL: [Dimension; 6] = [
		Dimension::Cognition,
		Dimension::Emotion,
		Dimension::Behavior,
		Dimension::Motivation,
		Dimension::Physiology,
		Dimension::Social,
	];

	pub fn color(self) -> &'static str {
		match self {
			Dimension::Cognition => "#4c6ef5",
			Dimension::Emotion => "#e64980",
			Dimension::Behavior => "#f59f00",
			Dimension::Motivation => "#7950f2",
			Dimension::Physiology => "#12b886",
			Dimension::Social => "#1098ad",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Dimension::Cognition => "Cognition",
			Dimension::Emotion => "Emotion",
			Dimension::Behavior => "Behavior",
			Dimension::Motivation => "Motivation",
			Dimension::Physiology => "Physiology",
			Dimension::Social => "Social",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Individual,
	Interpersonal,
	Contextual,
}

impl Level {
	pub fn label(self) -> &'static str {
		match self {
			Level::Individual => "Individual",
			Level::Interpersonal => "Interpersonal",
			Level::Contextual => "Contextual",
		}
	}
}

/// Where a node came from. Set once at creation, never edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
	pub session_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_name: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Optional classification handed to `add_node`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTags {
	pub dimension: Option<Dimension>,
	pub level: Option<Level>,
	pub provenance: Option<Provenance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	#[serde(flatten)]
	pub rect: Rect,
	pub text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimension: Option<Dimension>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub level: Option<Level>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub provenance: Option<Provenance>,
}

impl Node {
	pub fn session_id(&self) -> Option<&str> {
		self.provenance.as_ref().map(|p| p.session_id.as_str())
	}
}

/// Semantic classification of a connection; drives its default color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
	#[default]
	Maladaptive,
	Unchanged,
	Adaptive,
}

impl EdgeType {
	pub const ALL: [EdgeType; 3] = [EdgeType::Maladaptive, EdgeType::Unchanged, EdgeType::Adaptive];

	pub fn color(self) -> &'static str {
		match self {
			EdgeType::Maladaptive => "#e03131",
			EdgeType::Unchanged => "#868e96",
			EdgeType::Adaptive => "#2f9e44",
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			EdgeType::Maladaptive => "maladaptive",
			EdgeType::Unchanged => "unchanged",
			EdgeType::Adaptive => "adaptive",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.as_str() == s)
	}
}

/// Glyph drawn at one end of an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
	#[default]
	None,
	Arrow,
	Circle,
	Square,
	Triangle,
}

impl Marker {
	pub const ALL: [Marker; 5] = [
		Marker::None,
		Marker::Arrow,
		Marker::Circle,
		Marker::Square,
		Marker::Triangle,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Marker::None => "none",
			Marker::Arrow => "arrow",
			Marker::Circle => "circle",
			Marker::Square => "square",
			Marker::Triangle => "triangle",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.as_str() == s)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: EdgeId,
	pub from: NodeId,
	pub to: NodeId,
	#[serde(rename = "type")]
	pub edge_type: EdgeType,
	pub strength: u8,
	pub start_marker: Marker,
	pub end_marker: Marker,
	#[serde(default)]
	pub ambivalent: bool,
}

impl Edge {
	/// True when the edge joins `a` and `b`, in either direction.
	pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
		(self.from == a && self.to == b) || (self.from == b && self.to == a)
	}

	pub fn touches(&self, id: NodeId) -> bool {
		self.from == id || self.to == id
	}
}

/// Partial update for an edge. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgePatch {
	pub edge_type: Option<EdgeType>,
	pub strength: Option<u8>,
	pub start_marker: Option<Marker>,
	pub end_marker: Option<Marker>,
	pub ambivalent: Option<bool>,
}

impl EdgePatch {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// The unit of load, save and undo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub edges: Vec<Edge>,
}

impl Graph {
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
		self.edges.iter_mut().find(|e| e.id == id)
	}

	pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
		self.edges.iter().find(|e| e.connects(a, b))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edge_serializes_with_lowercase_enums() {
		let edge = Edge {
			id: EdgeId::new(),
			from: NodeId::new(),
			to: NodeId::new(),
			edge_type: EdgeType::Adaptive,
			strength: 2,
			start_marker: Marker::None,
			end_marker: Marker::Circle,
			ambivalent: false,
		};
		let json = serde_json::to_value(&edge).unwrap();
		assert_eq!(json["type"], "adaptive");
		assert_eq!(json["end_marker"], "circle");
		assert_eq!(json["start_marker"], "none");
	}

	#[test]
	fn node_geometry_is_flattened() {
		let json = r#"{
			"id": "6f1c1f5e-8a44-4c55-9d0a-2b1d5a0e9b11",
			"x": 10.0, "y": 20.0, "width": 150.0, "height": 70.0,
			"text": "Rumination",
			"dimension": "cognition"
		}"#;
		let node: Node = serde_json::from_str(json).unwrap();
		assert_eq!(node.rect, Rect::new(10.0, 20.0, 150.0, 70.0));
		assert_eq!(node.dimension, Some(Dimension::Cognition));
		assert!(node.level.is_none());
		assert!(node.session_id().is_none());
	}

	#[test]
	fn connects_ignores_direction() {
		let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
		let edge = Edge {
			id: EdgeId::new(),
			from: a,
			to: b,
			edge_type: EdgeType::Unchanged,
			strength: 0,
			start_marker: Marker::None,
			end_marker: Marker::Arrow,
			ambivalent: false,
		};
		assert!(edge.connects(a, b));
		assert!(edge.connects(b, a));
		assert!(!edge.connects(a, c));
	}

	#[test]
	fn marker_and_type_parse_round_their_names() {
		assert_eq!(Marker::parse("square"), Some(Marker::Square));
		assert_eq!(Marker::parse("hexagon"), None);
		assert_eq!(EdgeType::parse("unchanged"), Some(EdgeType::Unchanged));
	}
}
