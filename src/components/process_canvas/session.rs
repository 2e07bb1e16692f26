use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use log::{info, warn};

use super::error::SaveError;
use super::types::Graph;

/// Result of handing a graph to the external store. `Ok(false)` and `Err`
/// both count as a failed save.
pub type SaveFuture = LocalBoxFuture<'static, Result<bool, SaveError>>;

/// Injected persistence callback.
pub type SaveFn = Rc<dyn Fn(Graph) -> SaveFuture>;

/// Tracks the last successfully saved graph and whether the live graph
/// differs from it.
pub struct SaveSession {
	last_saved: Graph,
	dirty: bool,
	in_flight: bool,
	listener: Option<Box<dyn FnMut(bool)>>,
}

impl fmt::Debug for SaveSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SaveSession")
			.field("dirty", &self.dirty)
			.field("in_flight", &self.in_flight)
			.field("nodes", &self.last_saved.nodes.len())
			.finish()
	}
}

impl SaveSession {
	pub fn new(saved: Graph) -> Self {
		Self {
			last_saved: saved,
			dirty: false,
			in_flight: false,
			listener: None,
		}
	}

	/// Called with the new dirty flag each time it flips.
	pub fn set_listener(&mut self, listener: impl FnMut(bool) + 'static) {
		self.listener = Some(Box::new(listener));
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	pub fn is_saving(&self) -> bool {
		self.in_flight
	}

	/// Recompute the dirty flag against `current`.
	pub fn observe(&mut self, current: &Graph) {
		let dirty = *current != self.last_saved;
		if dirty == self.dirty {
			return;
		}
		self.dirty = dirty;
		if let Some(listener) = self.listener.as_mut() {
			listener(dirty);
		}
	}

	/// Point-in-time copy of `current` to hand to the store.
	pub fn begin(&mut self, current: &Graph) -> Result<Graph, SaveError> {
		if self.in_flight {
			return Err(SaveError::InFlight);
		}
		self.in_flight = true;
		Ok(current.clone())
	}

	/// Settle a save started with [`SaveSession::begin`]. On success the
	/// snapshot becomes the saved baseline; edits made while the save was
	/// pending keep the canvas dirty.
	pub fn finish(
		&mut self,
		snapshot: Graph,
		current: &Graph,
		outcome: Result<bool, SaveError>,
	) -> Result<(), SaveError> {
		self.in_flight = false;
		match outcome {
			Ok(true) => {
				info!(
					"saved network with {} nodes and {} edges",
					snapshot.nodes.len(),
					snapshot.edges.len()
				);
				self.last_saved = snapshot;
				self.observe(current);
				Ok(())
			}
			Ok(false) => {
				warn!("store rejected the save");
				Err(SaveError::Rejected)
			}
			Err(err) => {
				warn!("save failed: {err}");
				Err(err)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::FutureExt;
	use futures::executor::block_on;

	use super::super::types::{Node, NodeId, Rect};
	use super::*;

	fn node(text: &str) -> Node {
		Node {
			id: NodeId::new(),
			rect: Rect::new(0.0, 0.0, 120.0, 60.0),
			text: text.into(),
			dimension: None,
			level: None,
			provenance: None,
		}
	}

	fn recording(session: &mut SaveSession) -> Rc<RefCell<Vec<bool>>> {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		session.set_listener(move |dirty| sink.borrow_mut().push(dirty));
		seen
	}

	#[test]
	fn fires_only_on_transitions() {
		let original = Graph::default();
		let mut session = SaveSession::new(original.clone());
		let seen = recording(&mut session);

		let mut edited = original.clone();
		edited.nodes.push(node("A"));
		session.observe(&edited);
		session.observe(&edited);
		session.observe(&original);

		assert_eq!(*seen.borrow(), vec![true, false]);
		assert!(!session.is_dirty());
	}

	#[test]
	fn rejected_save_keeps_dirty() {
		let mut session = SaveSession::new(Graph::default());
		let seen = recording(&mut session);
		let mut edited = Graph::default();
		edited.nodes.push(node("A"));
		session.observe(&edited);

		let store: SaveFn = Rc::new(|_graph: Graph| async { Ok::<_, SaveError>(false) }.boxed_local());
		let snapshot = session.begin(&edited).unwrap();
		let outcome = block_on(store(snapshot.clone()));
		assert_eq!(
			session.finish(snapshot, &edited, outcome),
			Err(SaveError::Rejected)
		);

		assert!(session.is_dirty());
		assert!(!session.is_saving());
		assert_eq!(seen.borrow().last(), Some(&true));
	}

	#[test]
	fn edits_during_save_stay_dirty() {
		let mut session = SaveSession::new(Graph::default());
		let mut edited = Graph::default();
		edited.nodes.push(node("A"));
		session.observe(&edited);

		let snapshot = session.begin(&edited).unwrap();
		assert_eq!(session.begin(&edited), Err(SaveError::InFlight));
		edited.nodes.push(node("B"));
		session.finish(snapshot, &edited, Ok(true)).unwrap();
		assert!(session.is_dirty());

		let snapshot = session.begin(&edited).unwrap();
		session.finish(snapshot, &edited, Ok(true)).unwrap();
		assert!(!session.is_dirty());
	}

	#[test]
	fn store_error_is_reported() {
		let mut session = SaveSession::new(Graph::default());
		let snapshot = session.begin(&Graph::default()).unwrap();
		let err = session
			.finish(snapshot, &Graph::default(), Err(SaveError::Failed("offline".into())))
			.unwrap_err();
		assert_eq!(err.to_string(), "saving failed: offline");
	}
}
