//! Drafts behind the inline text field and the edge property panel.
//! Neither touches the graph; the canvas applies them on confirm.

use super::types::{Edge, EdgeId, EdgePatch, EdgeType, Marker, Node, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKey {
	Commit,
	Cancel,
	Type,
}

/// `Enter` commits, `Shift+Enter` inserts a newline, `Escape` discards.
pub fn text_key(key: &str, shift: bool) -> TextKey {
	match key {
		"Enter" if !shift => TextKey::Commit,
		"Escape" => TextKey::Cancel,
		_ => TextKey::Type,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeTextEditor {
	pub node_id: NodeId,
	pub buffer: String,
}

impl NodeTextEditor {
	pub fn open(node: &Node) -> Self {
		Self {
			node_id: node.id,
			buffer: node.text.clone(),
		}
	}
}

/// Editable copy of an edge's properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDraft {
	pub edge_type: EdgeType,
	pub strength: u8,
	pub start_marker: Marker,
	pub end_marker: Marker,
	pub ambivalent: bool,
}

impl From<&Edge> for EdgeDraft {
	fn from(edge: &Edge) -> Self {
		Self {
			edge_type: edge.edge_type,
			strength: edge.strength,
			start_marker: edge.start_marker,
			end_marker: edge.end_marker,
			ambivalent: edge.ambivalent,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeEditor {
	pub edge_id: EdgeId,
	pub draft: EdgeDraft,
	original: EdgeDraft,
	max_strength: u8,
}

impl EdgeEditor {
	pub fn open(edge: &Edge, max_strength: u8) -> Self {
		let draft = EdgeDraft::from(edge);
		Self {
			edge_id: edge.id,
			draft,
			original: draft,
			max_strength,
		}
	}

	pub fn max_strength(&self) -> u8 {
		self.max_strength
	}

	pub fn set_strength(&mut self, strength: u8) {
		self.draft.strength = strength.min(self.max_strength);
	}

	pub fn set_type(&mut self, edge_type: EdgeType) {
		self.draft.edge_type = edge_type;
	}

	pub fn set_start_marker(&mut self, marker: Marker) {
		self.draft.start_marker = marker;
	}

	pub fn set_end_marker(&mut self, marker: Marker) {
		self.draft.end_marker = marker;
	}

	/// Previews the arrow override the model applies on save.
	pub fn set_ambivalent(&mut self, ambivalent: bool) {
		self.draft.ambivalent = ambivalent;
		if ambivalent {
			self.draft.start_marker = Marker::Arrow;
			self.draft.end_marker = Marker::Arrow;
		}
	}

	/// Only the fields that differ from the edge as opened, so an
	/// already-ambivalent edge does not get its markers forced again.
	pub fn patch(&self) -> EdgePatch {
		let (d, o) = (&self.draft, &self.original);
		EdgePatch {
			edge_type: (d.edge_type != o.edge_type).then_some(d.edge_type),
			strength: (d.strength != o.strength).then_some(d.strength),
			start_marker: (d.start_marker != o.start_marker).then_some(d.start_marker),
			end_marker: (d.end_marker != o.end_marker).then_some(d.end_marker),
			ambivalent: (d.ambivalent != o.ambivalent).then_some(d.ambivalent),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn edge(ambivalent: bool) -> Edge {
		Edge {
			id: EdgeId::new(),
			from: NodeId::new(),
			to: NodeId::new(),
			edge_type: EdgeType::Adaptive,
			strength: 3,
			start_marker: if ambivalent { Marker::Arrow } else { Marker::None },
			end_marker: if ambivalent { Marker::Arrow } else { Marker::Circle },
			ambivalent,
		}
	}

	#[test]
	fn keys_map_to_actions() {
		assert_eq!(text_key("Enter", false), TextKey::Commit);
		assert_eq!(text_key("Enter", true), TextKey::Type);
		assert_eq!(text_key("Escape", false), TextKey::Cancel);
		assert_eq!(text_key("a", false), TextKey::Type);
	}

	#[test]
	fn untouched_editor_yields_empty_patch() {
		let editor = EdgeEditor::open(&edge(false), 5);
		assert!(editor.patch().is_empty());
	}

	#[test]
	fn patch_carries_only_changes() {
		let mut editor = EdgeEditor::open(&edge(false), 5);
		editor.set_strength(9);
		editor.set_end_marker(Marker::Square);
		let patch = editor.patch();
		assert_eq!(patch.strength, Some(5));
		assert_eq!(patch.end_marker, Some(Marker::Square));
		assert_eq!(patch.start_marker, None);
		assert_eq!(patch.ambivalent, None);
	}

	#[test]
	fn toggling_ambivalence_previews_arrows() {
		let mut editor = EdgeEditor::open(&edge(false), 5);
		editor.set_ambivalent(true);
		assert_eq!(editor.draft.start_marker, Marker::Arrow);
		assert_eq!(editor.draft.end_marker, Marker::Arrow);
		assert_eq!(editor.patch().ambivalent, Some(true));
	}

	#[test]
	fn marker_change_on_ambivalent_edge_keeps_flag_out_of_patch() {
		let mut editor = EdgeEditor::open(&edge(true), 5);
		editor.set_end_marker(Marker::Circle);
		let patch = editor.patch();
		assert_eq!(patch.ambivalent, None);
		assert_eq!(patch.end_marker, Some(Marker::Circle));
	}
}
