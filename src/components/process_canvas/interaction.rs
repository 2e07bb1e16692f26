//! Pointer and keyboard gestures. Exactly one [`Gesture`] is active; starting
//! a new one from anything but `Idle` first leaves the old one.

use log::debug;

use super::dialogs::{self, NodeTextEditor, TextKey};
use super::error::GraphError;
use super::geometry::{distance_to_segment, edge_segment};
use super::state::CanvasState;
use super::types::{EdgeId, EdgeType, NodeId, Point, Rect};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	DraggingNode {
		id: NodeId,
		offset: Point,
		moved: bool,
	},
	/// `offset` is the grab point's distance from the bottom-right corner.
	ResizingNode {
		id: NodeId,
		offset: Point,
		moved: bool,
	},
	/// `anchor` is the screen position the drag started at, `origin` the pan then.
	Panning {
		anchor: Point,
		origin: Point,
	},
	Connecting {
		from: NodeId,
		edge_type: EdgeType,
	},
	EditingNodeText(NodeTextEditor),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePart {
	Body,
	ResizeHandle,
	ConnectHandle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hit {
	Node(NodeId, NodePart),
	Edge(EdgeId),
	#[default]
	Background,
}

/// Bottom-right corner box that resizes a node.
pub fn resize_handle(rect: &Rect, size: f64) -> Rect {
	Rect::new(
		rect.x + rect.width - size,
		rect.y + rect.height - size,
		size,
		size,
	)
}

/// Top-right corner box that starts a connection.
pub fn connect_handle(rect: &Rect, size: f64) -> Rect {
	Rect::new(rect.x + rect.width - size, rect.y, size, size)
}

impl CanvasState {
	/// What lies under logical point `p`. Nodes win over edges, topmost first.
	pub fn hit_test(&self, p: Point) -> Hit {
		let config = self.config();
		let topmost = self
			.nodes_in_paint_order()
			.collect::<Vec<_>>()
			.into_iter()
			.rev()
			.find(|n| n.rect.contains(p));
		if let Some(node) = topmost {
			let part = if self.read_only() {
				NodePart::Body
			} else if resize_handle(&node.rect, config.handle_size).contains(p) {
				NodePart::ResizeHandle
			} else if connect_handle(&node.rect, config.handle_size).contains(p) {
				NodePart::ConnectHandle
			} else {
				NodePart::Body
			};
			return Hit::Node(node.id, part);
		}

		let tolerance = config.edge_hit_tolerance / self.viewport.scale;
		let graph = self.graph();
		graph
			.edges
			.iter()
			.filter_map(|edge| {
				let from = graph.node(edge.from)?;
				let to = graph.node(edge.to)?;
				let seg = edge_segment(&from.rect, &to.rect, config.head_inset);
				let d = distance_to_segment(p, seg.start, seg.head_tip(config.head_inset));
				(d <= tolerance).then_some((edge.id, d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map_or(Hit::Background, |(id, _)| Hit::Edge(id))
	}

	/// Leave the active gesture. A drag or resize that moved something is
	/// committed to history; an open text edit is discarded.
	pub fn exit_gesture(&mut self) {
		match std::mem::take(&mut self.gesture) {
			Gesture::DraggingNode { moved: true, .. } | Gesture::ResizingNode { moved: true, .. } => {
				self.commit();
			}
			Gesture::Connecting { from, .. } => debug!("connect from {from} cancelled"),
			Gesture::EditingNodeText(editor) => debug!("text edit on {} discarded", editor.node_id),
			_ => {}
		}
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let p = self.viewport.screen_to_logical(sx, sy);
		self.pointer = Some(p);
		let hit = self.hit_test(p);

		if let Gesture::Connecting { from, edge_type } = self.gesture {
			if let Hit::Node(target, _) = hit {
				self.finish_connect(from, target, edge_type);
				return;
			}
		}

		self.exit_gesture();
		self.edge_editor = None;

		match hit {
			Hit::Node(id, part) => {
				self.select_node(id);
				if self.read_only() {
					return;
				}
				self.gesture = match part {
					NodePart::ConnectHandle => Gesture::Connecting {
						from: id,
						edge_type: self.connect_type,
					},
					NodePart::ResizeHandle => {
						let corner = self
							.graph()
							.node(id)
							.map(|n| Point::new(n.rect.x + n.rect.width, n.rect.y + n.rect.height))
							.unwrap_or(p);
						Gesture::ResizingNode {
							id,
							offset: Point::new(corner.x - p.x, corner.y - p.y),
							moved: false,
						}
					}
					NodePart::Body => {
						let origin = self
							.graph()
							.node(id)
							.map(|n| Point::new(n.rect.x, n.rect.y))
							.unwrap_or_default();
						Gesture::DraggingNode {
							id,
							offset: Point::new(p.x - origin.x, p.y - origin.y),
							moved: false,
						}
					}
				};
				debug!("pointer down on node {id}: {:?}", part);
			}
			Hit::Edge(id) => {
				self.select_edge(id);
				if !self.read_only() {
					let result = self.open_edge_editor(id);
					self.report(result);
				}
			}
			Hit::Background => {
				self.clear_selection();
				self.gesture = Gesture::Panning {
					anchor: Point::new(sx, sy),
					origin: self.viewport.pan,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		let p = self.viewport.screen_to_logical(sx, sy);
		self.pointer = Some(p);
		let mut graph_changed = false;

		match &mut self.gesture {
			Gesture::DraggingNode { id, offset, moved } => {
				if let Ok(true) = self.model.move_node(*id, p.x - offset.x, p.y - offset.y) {
					*moved = true;
					graph_changed = true;
				}
			}
			Gesture::ResizingNode { id, offset, moved } => {
				let origin = self.model.graph().node(*id).map(|n| (n.rect.x, n.rect.y));
				if let Some((x, y)) = origin {
					let (width, height) = (p.x - x + offset.x, p.y - y + offset.y);
					if let Ok(true) = self.model.resize_node(*id, width, height) {
						*moved = true;
						graph_changed = true;
					}
				}
			}
			Gesture::Panning { anchor, origin } => {
				self.viewport.pan_from(*origin, sx - anchor.x, sy - anchor.y);
			}
			_ => {}
		}

		if graph_changed {
			self.changed();
		}
		self.hover = self.hit_test(p);
	}

	/// Ends a drag, resize or pan. Releasing a connect drag over another
	/// node completes the connection; releasing over the source keeps it
	/// armed for a second click.
	pub fn pointer_up(&mut self) {
		if let Gesture::Connecting { from, edge_type } = self.gesture {
			let target = match self.pointer.map(|p| self.hit_test(p)) {
				Some(Hit::Node(id, _)) if id != from => Some(id),
				_ => None,
			};
			if let Some(target) = target {
				self.finish_connect(from, target, edge_type);
			}
			return;
		}
		if matches!(
			self.gesture,
			Gesture::DraggingNode { .. } | Gesture::ResizingNode { .. } | Gesture::Panning { .. }
		) {
			self.exit_gesture();
		}
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.pointer = None;
		self.hover = Hit::Background;
	}

	pub fn double_click(&mut self, sx: f64, sy: f64) {
		let p = self.viewport.screen_to_logical(sx, sy);
		if let Hit::Node(id, NodePart::Body) = self.hit_test(p) {
			if !self.read_only() {
				let result = self.begin_text_edit(id);
				self.report(result);
			}
		}
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		self.viewport.zoom_at(sx, sy, delta_y < 0.0);
	}

	pub fn start_connect(&mut self, from: NodeId, edge_type: EdgeType) -> Result<(), GraphError> {
		self.guard()?;
		if self.graph().node(from).is_none() {
			return Err(GraphError::UnknownNode(from));
		}
		self.exit_gesture();
		self.gesture = Gesture::Connecting { from, edge_type };
		Ok(())
	}

	fn finish_connect(&mut self, from: NodeId, to: NodeId, edge_type: EdgeType) {
		self.gesture = Gesture::Idle;
		let result = self.add_edge(from, to, edge_type);
		self.report(result);
	}

	pub fn cancel_connect(&mut self) {
		if matches!(self.gesture, Gesture::Connecting { .. }) {
			self.exit_gesture();
		}
	}

	pub fn begin_text_edit(&mut self, id: NodeId) -> Result<(), GraphError> {
		self.guard()?;
		let editor = self
			.graph()
			.node(id)
			.map(NodeTextEditor::open)
			.ok_or(GraphError::UnknownNode(id))?;
		self.exit_gesture();
		self.select_node(id);
		self.gesture = Gesture::EditingNodeText(editor);
		Ok(())
	}

	pub fn set_text_buffer(&mut self, text: String) {
		if let Gesture::EditingNodeText(editor) = &mut self.gesture {
			editor.buffer = text;
		}
	}

	/// Apply the inline text. On rejection the field stays open so the user
	/// can correct it.
	pub fn commit_text_edit(&mut self) -> Result<bool, GraphError> {
		let Gesture::EditingNodeText(editor) = &self.gesture else {
			return Ok(false);
		};
		let (id, text) = (editor.node_id, editor.buffer.clone());
		let changed = self.update_node_text(id, &text)?;
		self.gesture = Gesture::Idle;
		Ok(changed)
	}

	pub fn cancel_text_edit(&mut self) {
		if matches!(self.gesture, Gesture::EditingNodeText(_)) {
			self.exit_gesture();
		}
	}

	/// Key pressed inside the inline text field. Returns true when consumed.
	pub fn text_key(&mut self, key: &str, shift: bool) -> bool {
		match dialogs::text_key(key, shift) {
			TextKey::Commit => {
				let result = self.commit_text_edit();
				self.report(result);
				true
			}
			TextKey::Cancel => {
				self.cancel_text_edit();
				true
			}
			TextKey::Type => false,
		}
	}

	/// Canvas-level shortcuts. Returns true when consumed.
	pub fn key_down(&mut self, key: &str, ctrl: bool, shift: bool) -> bool {
		if matches!(self.gesture, Gesture::EditingNodeText(_)) {
			return false;
		}
		match key {
			"z" | "Z" if ctrl && shift => {
				self.redo();
			}
			"z" | "Z" if ctrl => {
				self.undo();
			}
			"y" | "Y" if ctrl => {
				self.redo();
			}
			"Delete" | "Backspace" if !self.read_only() && self.has_selection() => {
				let result = self.delete_selected();
				self.report(result);
			}
			"Escape" => {
				if matches!(self.gesture, Gesture::Connecting { .. }) {
					self.cancel_connect();
				} else if self.edge_editor.is_some() {
					self.cancel_edge_editor();
				} else {
					self.clear_selection();
				}
			}
			_ => return false,
		}
		true
	}

	pub fn cursor(&self) -> &'static str {
		match &self.gesture {
			Gesture::DraggingNode { .. } | Gesture::Panning { .. } => "grabbing",
			Gesture::ResizingNode { .. } => "nwse-resize",
			Gesture::Connecting { .. } => "crosshair",
			Gesture::EditingNodeText(_) => "default",
			Gesture::Idle => match self.hover {
				Hit::Node(_, NodePart::ResizeHandle) => "nwse-resize",
				Hit::Node(_, NodePart::ConnectHandle) => "copy",
				Hit::Node(_, NodePart::Body) if self.read_only() => "pointer",
				Hit::Node(_, NodePart::Body) => "move",
				Hit::Edge(_) => "pointer",
				Hit::Background => "grab",
			},
		}
	}
}
