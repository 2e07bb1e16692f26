use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::{self, Glyph};
use super::interaction::{Gesture, Hit, NodePart, connect_handle, resize_handle};
use super::state::CanvasState;
use super::types::{Edge, EdgeType, Node, Point};

const BACKGROUND: &str = "#f8f9fa";
const GRID: &str = "#e9ecef";
const GRID_STEP: f64 = 40.0;
const NODE_FILL: &str = "#ffffff";
const NODE_STROKE: &str = "#495057";
const SELECTED_STROKE: &str = "#1c7ed6";
const TEXT: &str = "#212529";
const FONT_PX: f64 = 14.0;
const LINE_HEIGHT: f64 = 18.0;
const PADDING: f64 = 10.0;
const DIMMED_ALPHA: f64 = 0.35;

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.viewport.pan.x, state.viewport.pan.y);
	let _ = ctx.scale(state.viewport.scale, state.viewport.scale);
	draw_grid(state, ctx);
	draw_edges(state, ctx);
	draw_connect_preview(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_grid(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.viewport.scale;
	let top_left = state.viewport.screen_to_logical(0.0, 0.0);
	let bottom_right = state.viewport.screen_to_logical(state.width, state.height);
	ctx.set_stroke_style_str(GRID);
	ctx.set_line_width(1.0 / k);
	ctx.begin_path();
	let mut x = (top_left.x / GRID_STEP).floor() * GRID_STEP;
	while x <= bottom_right.x {
		ctx.move_to(x, top_left.y);
		ctx.line_to(x, bottom_right.y);
		x += GRID_STEP;
	}
	let mut y = (top_left.y / GRID_STEP).floor() * GRID_STEP;
	while y <= bottom_right.y {
		ctx.move_to(top_left.x, y);
		ctx.line_to(bottom_right.x, y);
		y += GRID_STEP;
	}
	ctx.stroke();
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<(f64, f64)>) {
	let pattern = match dash {
		Some((on, off)) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
		None => js_sys::Array::new(),
	};
	let _ = ctx.set_line_dash(&pattern);
}

fn draw_edges(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let graph = state.graph();
	let editing = state.edge_editor.as_ref().map(|e| e.edge_id);
	let hovered = match state.hover {
		Hit::Edge(id) => Some(id),
		_ => None,
	};

	for edge in &graph.edges {
		let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
			continue;
		};
		let dimmed = state.is_dimmed(from) && state.is_dimmed(to);
		let emphasis = Some(edge.id) == editing
			|| Some(edge.id) == hovered
			|| Some(edge.id) == state.selected_edge;
		ctx.set_global_alpha(if dimmed { DIMMED_ALPHA } else { 1.0 });
		draw_edge(state, ctx, edge, from, to, emphasis);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_edge(
	state: &CanvasState,
	ctx: &CanvasRenderingContext2d,
	edge: &Edge,
	from: &Node,
	to: &Node,
	emphasis: bool,
) {
	let config = state.config();
	let color = edge.edge_type.color();
	let seg = geometry::edge_segment(&from.rect, &to.rect, config.head_inset);
	let width = geometry::stroke_width(edge.strength);

	if emphasis {
		ctx.set_stroke_style_str("rgba(28, 126, 214, 0.25)");
		ctx.set_line_width(width + 6.0);
		ctx.begin_path();
		ctx.move_to(seg.start.x, seg.start.y);
		ctx.line_to(seg.end.x, seg.end.y);
		ctx.stroke();
	}

	ctx.set_stroke_style_str(color);
	ctx.set_line_width(width);
	set_dash(
		ctx,
		matches!(edge.edge_type, EdgeType::Unchanged).then_some((8.0, 5.0)),
	);
	ctx.begin_path();
	ctx.move_to(seg.start.x, seg.start.y);
	ctx.line_to(seg.end.x, seg.end.y);
	ctx.stroke();
	set_dash(ctx, None);

	ctx.set_fill_style_str(color);
	let head = geometry::marker_glyph(
		edge.end_marker,
		seg.head_tip(config.head_inset),
		seg.angle,
		config.marker_size,
	);
	let tail = geometry::marker_glyph(
		edge.start_marker,
		seg.start,
		geometry::reverse(seg.angle),
		config.marker_size,
	);
	for glyph in head.iter().chain(tail.iter()) {
		fill_glyph(ctx, glyph);
	}

	if edge.strength > 0 {
		let badge = geometry::badge_center(&seg, config.badge_offset, config.axis_tolerance_deg);
		ctx.begin_path();
		let _ = ctx.arc(badge.x, badge.y, config.badge_radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("#ffffff");
		ctx.fill();
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(1.5);
		ctx.stroke();
		ctx.set_fill_style_str(color);
		ctx.set_font("bold 11px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&edge.strength.to_string(), badge.x, badge.y);
	}
}

fn fill_glyph(ctx: &CanvasRenderingContext2d, glyph: &Glyph) {
	ctx.begin_path();
	match glyph {
		Glyph::Polygon(points) => {
			let Some((first, rest)) = points.split_first() else {
				return;
			};
			ctx.move_to(first.x, first.y);
			for p in rest {
				ctx.line_to(p.x, p.y);
			}
			ctx.close_path();
		}
		Glyph::Circle { center, radius } => {
			let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
		}
	}
	ctx.fill();
}

fn draw_connect_preview(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let Gesture::Connecting { from, edge_type } = state.gesture else {
		return;
	};
	let (Some(node), Some(pointer)) = (state.graph().node(from), state.pointer) else {
		return;
	};
	let c = node.rect.center();
	ctx.set_stroke_style_str(edge_type.color());
	ctx.set_line_width(2.0 / state.viewport.scale);
	set_dash(ctx, Some((6.0, 4.0)));
	ctx.begin_path();
	ctx.move_to(c.x, c.y);
	ctx.line_to(pointer.x, pointer.y);
	ctx.stroke();
	set_dash(ctx, None);
}

fn draw_nodes(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let editing = match &state.gesture {
		Gesture::EditingNodeText(editor) => Some(editor.node_id),
		_ => None,
	};
	for node in state.nodes_in_paint_order() {
		ctx.set_global_alpha(if state.is_dimmed(node) {
			DIMMED_ALPHA
		} else {
			1.0
		});
		draw_node(state, ctx, node, Some(node.id) != editing);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_node(state: &CanvasState, ctx: &CanvasRenderingContext2d, node: &Node, with_text: bool) {
	let config = state.config();
	let r = node.rect;
	let selected = state.selected == Some(node.id);
	let hovered = matches!(state.hover, Hit::Node(id, _) if id == node.id);
	let stroke = match node.dimension {
		Some(d) if config.show_tags => d.color(),
		_ => NODE_STROKE,
	};

	ctx.set_shadow_color("rgba(0, 0, 0, 0.12)");
	ctx.set_shadow_blur(6.0);
	ctx.set_fill_style_str(NODE_FILL);
	ctx.fill_rect(r.x, r.y, r.width, r.height);
	ctx.set_shadow_blur(0.0);

	ctx.set_stroke_style_str(if selected { SELECTED_STROKE } else { stroke });
	ctx.set_line_width(if selected { 3.0 } else { 1.5 });
	if selected {
		set_dash(ctx, Some((6.0, 3.0)));
	}
	ctx.stroke_rect(r.x, r.y, r.width, r.height);
	set_dash(ctx, None);

	if with_text {
		ctx.set_fill_style_str(TEXT);
		ctx.set_font(&format!("{FONT_PX}px sans-serif"));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let lines = geometry::wrap_lines(&node.text, r.width - 2.0 * PADDING, |s| {
			ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
		});
		let center = r.center();
		let top = center.y - (lines.len() as f64 - 1.0) * LINE_HEIGHT / 2.0;
		for (i, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text(line, center.x, top + i as f64 * LINE_HEIGHT);
		}
	}

	if config.show_tags {
		let tags: Vec<&str> = node
			.dimension
			.map(|d| d.label())
			.into_iter()
			.chain(node.level.map(|l| l.label()))
			.collect();
		if !tags.is_empty() {
			ctx.set_fill_style_str(stroke);
			ctx.set_font("10px sans-serif");
			ctx.set_text_align("left");
			ctx.set_text_baseline("top");
			let _ = ctx.fill_text(&tags.join(" · "), r.x + 6.0, r.y + 4.0);
		}
	}

	if !state.read_only() && (selected || hovered) {
		draw_handles(state, ctx, node);
	}
}

fn draw_handles(state: &CanvasState, ctx: &CanvasRenderingContext2d, node: &Node) {
	let size = state.config().handle_size;
	let hot = match state.hover {
		Hit::Node(id, part) if id == node.id => Some(part),
		_ => None,
	};

	let resize = resize_handle(&node.rect, size);
	ctx.set_fill_style_str(if hot == Some(NodePart::ResizeHandle) {
		SELECTED_STROKE
	} else {
		NODE_STROKE
	});
	ctx.begin_path();
	ctx.move_to(resize.x + resize.width, resize.y);
	ctx.line_to(resize.x + resize.width, resize.y + resize.height);
	ctx.line_to(resize.x, resize.y + resize.height);
	ctx.close_path();
	ctx.fill();

	let connect = connect_handle(&node.rect, size);
	let c = Point::new(connect.x + size / 2.0, connect.y + size / 2.0);
	ctx.begin_path();
	let _ = ctx.arc(c.x, c.y, size / 2.0 - 2.0, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(state.connect_type.color());
	ctx.fill();
	ctx.set_stroke_style_str("#ffffff");
	ctx.set_line_width(1.5);
	ctx.begin_path();
	ctx.move_to(c.x - 4.0, c.y);
	ctx.line_to(c.x + 4.0, c.y);
	ctx.move_to(c.x, c.y - 4.0);
	ctx.line_to(c.x, c.y + 4.0);
	ctx.stroke();
}
