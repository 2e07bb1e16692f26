//! Edge geometry: border-to-border segments, marker glyphs, strength badges
//! and pick distances. All values are in logical canvas units.

use std::f64::consts::PI;

use super::types::{Marker, Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
	pub start: Point,
	pub end: Point,
	/// Direction from the `from` centre to the `to` centre, radians.
	pub angle: f64,
}

impl EdgeSegment {
	pub fn midpoint(&self) -> Point {
		Point::new(
			(self.start.x + self.end.x) / 2.0,
			(self.start.y + self.end.y) / 2.0,
		)
	}

	/// Where the end marker's tip sits: back on the target border, past the inset.
	pub fn head_tip(&self, head_inset: f64) -> Point {
		Point::new(
			self.end.x + self.angle.cos() * head_inset,
			self.end.y + self.angle.sin() * head_inset,
		)
	}
}

/// Segment between the borders of two nodes along the line joining their
/// centres. The head end is pulled back by `head_inset` so the end marker
/// is not hidden under the target node.
pub fn edge_segment(from: &Rect, to: &Rect, head_inset: f64) -> EdgeSegment {
	let (c1, c2) = (from.center(), to.center());
	let angle = (c2.y - c1.y).atan2(c2.x - c1.x);
	let (cos, sin) = (angle.cos(), angle.sin());
	EdgeSegment {
		start: Point::new(
			c1.x + cos * from.width / 2.0,
			c1.y + sin * from.height / 2.0,
		),
		end: Point::new(
			c2.x - cos * (to.width / 2.0 + head_inset),
			c2.y - sin * (to.height / 2.0 + head_inset),
		),
		angle,
	}
}

pub fn stroke_width(strength: u8) -> f64 {
	1.5 + 0.5 * strength as f64
}

/// Centre of the strength badge: the segment midpoint pushed off the line.
///
/// Near-horizontal lines push straight up, near-vertical lines straight
/// right; anything else goes perpendicular to the line.
pub fn badge_center(segment: &EdgeSegment, offset: f64, tolerance_deg: f64) -> Point {
	let mid = segment.midpoint();
	let deg = segment.angle.to_degrees().rem_euclid(180.0);
	if deg <= tolerance_deg || deg >= 180.0 - tolerance_deg {
		Point::new(mid.x, mid.y - offset)
	} else if (deg - 90.0).abs() <= tolerance_deg {
		Point::new(mid.x + offset, mid.y)
	} else {
		Point::new(
			mid.x - segment.angle.sin() * offset,
			mid.y + segment.angle.cos() * offset,
		)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Glyph {
	Polygon(Vec<Point>),
	Circle { center: Point, radius: f64 },
}

/// Shape for `marker` whose tip touches `tip`, pointing along `direction`.
pub fn marker_glyph(marker: Marker, tip: Point, direction: f64, size: f64) -> Option<Glyph> {
	let (ux, uy) = (direction.cos(), direction.sin());
	let back = Point::new(tip.x - ux * size, tip.y - uy * size);
	let along = |p: Point, d: f64| Point::new(p.x - ux * d, p.y - uy * d);
	let side = |p: Point, d: f64| Point::new(p.x - uy * d, p.y + ux * d);

	match marker {
		Marker::None => None,
		Marker::Arrow => Some(Glyph::Polygon(vec![
			tip,
			side(back, size * 0.5),
			side(back, -size * 0.5),
		])),
		// Wedge with its base on the border and its point on the line.
		Marker::Triangle => Some(Glyph::Polygon(vec![
			back,
			side(tip, size * 0.6),
			side(tip, -size * 0.6),
		])),
		Marker::Circle => Some(Glyph::Circle {
			center: along(tip, size / 2.0),
			radius: size / 2.0,
		}),
		Marker::Square => {
			let half = size / 2.0;
			Some(Glyph::Polygon(vec![
				side(tip, half),
				side(back, half),
				side(back, -half),
				side(tip, -half),
			]))
		}
	}
}

/// Direction a start marker points: back towards the source node.
pub fn reverse(angle: f64) -> f64 {
	angle + PI
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq < f64::EPSILON {
		0.0
	} else {
		(((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.x + t * dx, a.y + t * dy);
	((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Greedy word wrap. Words longer than `max_width` get a line of their own.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
	let mut lines = Vec::new();
	for paragraph in text.lines() {
		let mut line = String::new();
		for word in paragraph.split_whitespace() {
			let candidate = if line.is_empty() {
				word.to_string()
			} else {
				format!("{line} {word}")
			};
			if !line.is_empty() && measure(&candidate) > max_width {
				lines.push(std::mem::replace(&mut line, word.to_string()));
			} else {
				line = candidate;
			}
		}
		lines.push(line);
	}
	lines
}
