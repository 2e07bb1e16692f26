use chrono::Utc;
use log::{debug, info, warn};

use super::config::CanvasConfig;
use super::dialogs::EdgeEditor;
use super::error::{GraphError, SaveError};
use super::history::History;
use super::interaction::{Gesture, Hit};
use super::model::GraphModel;
use super::session::SaveSession;
use super::types::{
	Dimension, Edge, EdgeId, EdgePatch, EdgeType, Graph, Node, NodeId, NodeTags, Point,
	Provenance, Rect,
};
use super::viewport::Viewport;

/// Therapy session a canvas is scoped to. New nodes are stamped with it and
/// nodes from other sessions are drawn dimmed.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionScope {
	pub id: String,
	pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	Info,
	Error,
}

/// Transient, dismissible message for the user.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
	pub id: u64,
	pub level: NoticeLevel,
	pub message: String,
}

/// Everything one canvas instance owns. Instances never share state.
#[derive(Debug)]
pub struct CanvasState {
	pub(super) model: GraphModel,
	pub(super) history: History,
	session: SaveSession,
	pub viewport: Viewport,
	pub gesture: Gesture,
	/// At most one of `selected` and `selected_edge` is set.
	pub selected: Option<NodeId>,
	pub selected_edge: Option<EdgeId>,
	pub edge_editor: Option<EdgeEditor>,
	pub notice: Option<Notice>,
	/// Type given to the next connection started from a node.
	pub connect_type: EdgeType,
	pub next_dimension: Option<Dimension>,
	pub scope: Option<SessionScope>,
	/// Last pointer position, logical units.
	pub pointer: Option<Point>,
	pub hover: Hit,
	pub width: f64,
	pub height: f64,
	read_only: bool,
	notice_seq: u64,
}

impl CanvasState {
	pub fn new(graph: Graph, config: CanvasConfig, read_only: bool) -> Self {
		let model = GraphModel::new(graph, config);
		let viewport = Viewport::new(model.config());
		let loaded = model.graph().clone();
		info!(
			"canvas loaded with {} nodes and {} edges{}",
			loaded.nodes.len(),
			loaded.edges.len(),
			if read_only { " (read-only)" } else { "" }
		);
		Self {
			history: History::new(loaded.clone()),
			session: SaveSession::new(loaded),
			model,
			viewport,
			gesture: Gesture::Idle,
			selected: None,
			selected_edge: None,
			edge_editor: None,
			notice: None,
			connect_type: EdgeType::default(),
			next_dimension: None,
			scope: None,
			pointer: None,
			hover: Hit::Background,
			width: 0.0,
			height: 0.0,
			read_only,
			notice_seq: 0,
		}
	}

	pub fn graph(&self) -> &Graph {
		self.model.graph()
	}

	pub fn config(&self) -> &CanvasConfig {
		self.model.config()
	}

	pub fn read_only(&self) -> bool {
		self.read_only
	}

	pub fn is_dirty(&self) -> bool {
		self.session.is_dirty()
	}

	pub fn is_saving(&self) -> bool {
		self.session.is_saving()
	}

	pub fn can_undo(&self) -> bool {
		!self.read_only && self.history.can_undo()
	}

	pub fn can_redo(&self) -> bool {
		!self.read_only && self.history.can_redo()
	}

	pub fn on_unsaved_changes(&mut self, listener: impl FnMut(bool) + 'static) {
		self.session.set_listener(listener);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
		self.notice_seq += 1;
		self.notice = Some(Notice {
			id: self.notice_seq,
			level,
			message: message.into(),
		});
		self.notice_seq
	}

	/// Clear the notice, or only notice `id` if given.
	pub fn dismiss_notice(&mut self, id: Option<u64>) {
		if id.is_none() || self.notice.as_ref().map(|n| n.id) == id {
			self.notice = None;
		}
	}

	/// Surface a rejected mutation as a notice and swallow it.
	pub fn report<T>(&mut self, result: Result<T, GraphError>) -> Option<T> {
		match result {
			Ok(value) => Some(value),
			Err(err) => {
				warn!("rejected: {err}");
				self.notify(NoticeLevel::Error, err.to_string());
				None
			}
		}
	}

	pub(super) fn guard(&self) -> Result<(), GraphError> {
		if self.read_only {
			Err(GraphError::ReadOnly)
		} else {
			Ok(())
		}
	}

	pub(super) fn changed(&mut self) {
		self.session.observe(self.model.graph());
	}

	/// Snapshot the graph into history if it moved since the last snapshot.
	pub(super) fn commit(&mut self) {
		if self.history.current() != self.model.graph() {
			self.history.commit(self.model.graph().clone());
		}
		self.changed();
	}

	pub fn select_node(&mut self, id: NodeId) {
		self.selected = Some(id);
		self.selected_edge = None;
	}

	pub fn select_edge(&mut self, id: EdgeId) {
		self.selected = None;
		self.selected_edge = Some(id);
	}

	pub fn clear_selection(&mut self) {
		self.selected = None;
		self.selected_edge = None;
	}

	pub fn has_selection(&self) -> bool {
		self.selected.is_some() || self.selected_edge.is_some()
	}

	pub fn is_dimmed(&self, node: &Node) -> bool {
		match &self.scope {
			Some(scope) => node.session_id() != Some(scope.id.as_str()),
			None => false,
		}
	}

	/// Paint order: insertion order with the selected node last.
	pub fn nodes_in_paint_order(&self) -> impl Iterator<Item = &Node> {
		let selected = self.selected;
		let graph = self.model.graph();
		graph
			.nodes
			.iter()
			.filter(move |n| Some(n.id) != selected)
			.chain(selected.and_then(|id| graph.node(id)))
	}

	pub fn add_node(
		&mut self,
		text: &str,
		rect: Option<Rect>,
		tags: NodeTags,
	) -> Result<Node, GraphError> {
		self.guard()?;
		let node = self.model.add_node(text, rect, tags)?;
		self.commit();
		Ok(node)
	}

	/// Toolbar action: a uniquely named node in the middle of the view,
	/// opened straight into text editing.
	pub fn add_node_here(&mut self) -> Result<Node, GraphError> {
		self.guard()?;
		let text = self.model.unique_label(&self.model.config().default_node_text);
		let center = self.viewport.visible_center(self.width, self.height);
		let rect = self.model.free_spot(center);
		let tags = NodeTags {
			dimension: self.next_dimension,
			level: None,
			provenance: self.scope.as_ref().map(|scope| Provenance {
				session_id: scope.id.clone(),
				session_name: scope.name.clone(),
				created_at: Utc::now(),
			}),
		};
		let node = self.add_node(&text, Some(rect), tags)?;
		self.select_node(node.id);
		self.begin_text_edit(node.id)?;
		Ok(node)
	}

	pub fn delete_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
		self.guard()?;
		if !self.model.delete_node(id) {
			return Ok(false);
		}
		self.reconcile();
		self.commit();
		Ok(true)
	}

	pub fn update_node_text(&mut self, id: NodeId, text: &str) -> Result<bool, GraphError> {
		self.guard()?;
		let changed = self.model.update_node_text(id, text)?;
		if changed {
			self.commit();
		}
		Ok(changed)
	}

	pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<bool, GraphError> {
		self.guard()?;
		let changed = self.model.move_node(id, x, y)?;
		if changed {
			self.commit();
		}
		Ok(changed)
	}

	pub fn resize_node(&mut self, id: NodeId, width: f64, height: f64) -> Result<bool, GraphError> {
		self.guard()?;
		let changed = self.model.resize_node(id, width, height)?;
		if changed {
			self.commit();
		}
		Ok(changed)
	}

	pub fn add_edge(
		&mut self,
		from: NodeId,
		to: NodeId,
		edge_type: EdgeType,
	) -> Result<Edge, GraphError> {
		self.guard()?;
		let edge = self.model.add_edge(from, to, edge_type)?;
		self.commit();
		Ok(edge)
	}

	pub fn update_edge(&mut self, id: EdgeId, patch: &EdgePatch) -> Result<bool, GraphError> {
		self.guard()?;
		let changed = self.model.update_edge(id, patch)?;
		if changed {
			self.commit();
		}
		Ok(changed)
	}

	pub fn delete_edge(&mut self, id: EdgeId) -> Result<bool, GraphError> {
		self.guard()?;
		if !self.model.delete_edge(id) {
			return Ok(false);
		}
		self.reconcile();
		self.commit();
		Ok(true)
	}

	pub fn delete_selected(&mut self) -> Result<bool, GraphError> {
		match (self.selected, self.selected_edge) {
			(Some(id), _) => self.delete_node(id),
			(None, Some(id)) => self.delete_edge(id),
			(None, None) => Ok(false),
		}
	}

	pub fn undo(&mut self) -> bool {
		if self.read_only {
			return false;
		}
		self.exit_gesture();
		let Some(snapshot) = self.history.undo().cloned() else {
			return false;
		};
		debug!("undo");
		self.model.restore(snapshot);
		self.reconcile();
		self.changed();
		true
	}

	pub fn redo(&mut self) -> bool {
		if self.read_only {
			return false;
		}
		self.exit_gesture();
		let Some(snapshot) = self.history.redo().cloned() else {
			return false;
		};
		debug!("redo");
		self.model.restore(snapshot);
		self.reconcile();
		self.changed();
		true
	}

	/// Drop references to nodes or edges the graph no longer has.
	fn reconcile(&mut self) {
		let graph = self.model.graph();
		if self.selected.is_some_and(|id| graph.node(id).is_none()) {
			self.selected = None;
		}
		if self.selected_edge.is_some_and(|id| graph.edge(id).is_none()) {
			self.selected_edge = None;
		}
		if self
			.edge_editor
			.as_ref()
			.is_some_and(|ed| graph.edge(ed.edge_id).is_none())
		{
			self.edge_editor = None;
		}
		let stale = match &self.gesture {
			Gesture::DraggingNode { id, .. } | Gesture::ResizingNode { id, .. } => {
				graph.node(*id).is_none()
			}
			Gesture::Connecting { from, .. } => graph.node(*from).is_none(),
			Gesture::EditingNodeText(editor) => graph.node(editor.node_id).is_none(),
			Gesture::Idle | Gesture::Panning { .. } => false,
		};
		if stale {
			debug!("dropping gesture on a removed node");
			self.gesture = Gesture::Idle;
		}
	}

	pub fn open_edge_editor(&mut self, id: EdgeId) -> Result<(), GraphError> {
		self.guard()?;
		let edge = self.model.graph().edge(id).ok_or(GraphError::UnknownEdge(id))?;
		self.edge_editor = Some(EdgeEditor::open(edge, self.model.config().max_strength));
		Ok(())
	}

	pub fn edge_editor_mut(&mut self) -> Option<&mut EdgeEditor> {
		self.edge_editor.as_mut()
	}

	/// Apply the editor's draft. The editor stays open if the model refuses.
	pub fn save_edge_editor(&mut self) -> Result<bool, GraphError> {
		let Some(editor) = self.edge_editor.as_ref() else {
			return Ok(false);
		};
		let (id, patch) = (editor.edge_id, editor.patch());
		let changed = self.update_edge(id, &patch)?;
		self.edge_editor = None;
		Ok(changed)
	}

	pub fn delete_edge_editor(&mut self) -> Result<bool, GraphError> {
		let Some(editor) = self.edge_editor.take() else {
			return Ok(false);
		};
		self.delete_edge(editor.edge_id)
	}

	pub fn cancel_edge_editor(&mut self) {
		self.edge_editor = None;
	}

	/// Start a save. `None` when read-only or another save is pending.
	pub fn begin_save(&mut self) -> Option<Graph> {
		if self.read_only {
			return None;
		}
		match self.session.begin(self.model.graph()) {
			Ok(snapshot) => Some(snapshot),
			Err(err) => {
				self.notify(NoticeLevel::Info, err.to_string());
				None
			}
		}
	}

	pub fn finish_save(
		&mut self,
		snapshot: Graph,
		outcome: Result<bool, SaveError>,
	) -> Result<(), SaveError> {
		let result = self.session.finish(snapshot, self.model.graph(), outcome);
		match &result {
			Ok(()) => {
				self.notify(NoticeLevel::Info, "Network saved");
			}
			Err(err) => {
				self.notify(
					NoticeLevel::Error,
					format!("{err}. Your changes are kept, try saving again."),
				);
			}
		}
		result
	}
}
