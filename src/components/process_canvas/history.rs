use super::types::Graph;

/// Linear undo/redo list of full graph snapshots.
///
/// Always holds at least one entry (the graph the canvas was opened with).
/// Committing after an undo drops the undone future.
#[derive(Clone, Debug)]
pub struct History {
	entries: Vec<Graph>,
	index: usize,
}

impl History {
	pub fn new(initial: Graph) -> Self {
		Self {
			entries: vec![initial],
			index: 0,
		}
	}

	pub fn commit(&mut self, graph: Graph) {
		self.entries.truncate(self.index + 1);
		self.entries.push(graph);
		self.index = self.entries.len() - 1;
	}

	pub fn undo(&mut self) -> Option<&Graph> {
		if self.index == 0 {
			return None;
		}
		self.index -= 1;
		self.entries.get(self.index)
	}

	pub fn redo(&mut self) -> Option<&Graph> {
		if self.index + 1 >= self.entries.len() {
			return None;
		}
		self.index += 1;
		self.entries.get(self.index)
	}

	pub fn can_undo(&self) -> bool {
		self.index > 0
	}

	pub fn can_redo(&self) -> bool {
		self.index + 1 < self.entries.len()
	}

	pub fn current(&self) -> &Graph {
		&self.entries[self.index]
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::{Node, NodeId, Rect};
	use super::*;

	fn graph_with(texts: &[&str]) -> Graph {
		Graph {
			nodes: texts
				.iter()
				.map(|t| Node {
					id: NodeId::new(),
					rect: Rect::new(0.0, 0.0, 120.0, 60.0),
					text: t.to_string(),
					dimension: None,
					level: None,
					provenance: None,
				})
				.collect(),
			edges: Vec::new(),
		}
	}

	#[test]
	fn undo_at_start_is_noop() {
		let mut h = History::new(Graph::default());
		assert!(h.undo().is_none());
		assert!(h.redo().is_none());
		assert!(!h.can_undo() && !h.can_redo());
	}

	#[test]
	fn undo_redo_walk_the_list() {
		let (g0, g1, g2) = (graph_with(&[]), graph_with(&["a"]), graph_with(&["a", "b"]));
		let mut h = History::new(g0.clone());
		h.commit(g1.clone());
		h.commit(g2.clone());

		assert_eq!(h.undo(), Some(&g1));
		assert_eq!(h.undo(), Some(&g0));
		assert_eq!(h.undo(), None);
		assert_eq!(h.redo(), Some(&g1));
		assert_eq!(h.redo(), Some(&g2));
		assert_eq!(h.redo(), None);
		assert_eq!(h.current(), &g2);
	}

	#[test]
	fn commit_after_undo_discards_future() {
		let (g0, g1, g2) = (graph_with(&[]), graph_with(&["a"]), graph_with(&["c"]));
		let mut h = History::new(g0);
		h.commit(g1);
		h.undo();
		h.commit(g2.clone());

		assert!(!h.can_redo());
		assert_eq!(h.current(), &g2);
		assert_eq!(h.undo().map(|g| g.nodes.len()), Some(0));
		assert!(h.undo().is_none());
	}
}
