use serde::{Deserialize, Serialize};

use super::types::{EdgeType, Marker};

/// Tunable defaults for one canvas instance.
///
/// The session-scoped and general network views differ only in these values,
/// so they share one component and pass different configs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
	pub min_node_width: f64,
	pub min_node_height: f64,
	pub default_node_width: f64,
	pub default_node_height: f64,
	pub default_strength: u8,
	pub max_strength: u8,
	pub default_start_marker: Marker,
	pub maladaptive_end_marker: Marker,
	pub unchanged_end_marker: Marker,
	pub adaptive_end_marker: Marker,
	pub zoom_factor: f64,
	pub min_scale: f64,
	pub max_scale: f64,
	/// Side of the square hit boxes at a node's corners, logical units.
	pub handle_size: f64,
	/// Gap left between the edge head and the target border for the marker.
	pub head_inset: f64,
	pub marker_size: f64,
	pub badge_offset: f64,
	pub badge_radius: f64,
	/// Degrees from an axis within which a badge uses an axis-aligned offset.
	pub axis_tolerance_deg: f64,
	/// Pick radius around an edge line, in screen pixels.
	pub edge_hit_tolerance: f64,
	pub show_tags: bool,
	pub default_node_text: String,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			min_node_width: 120.0,
			min_node_height: 60.0,
			default_node_width: 180.0,
			default_node_height: 80.0,
			default_strength: 3,
			max_strength: 5,
			default_start_marker: Marker::None,
			maladaptive_end_marker: Marker::Arrow,
			unchanged_end_marker: Marker::Arrow,
			adaptive_end_marker: Marker::Circle,
			zoom_factor: 1.2,
			min_scale: 0.3,
			max_scale: 3.0,
			handle_size: 16.0,
			head_inset: 8.0,
			marker_size: 10.0,
			badge_offset: 14.0,
			badge_radius: 9.0,
			axis_tolerance_deg: 15.0,
			edge_hit_tolerance: 6.0,
			show_tags: true,
			default_node_text: "New process".into(),
		}
	}
}

impl CanvasConfig {
	pub fn end_marker_for(&self, edge_type: EdgeType) -> Marker {
		match edge_type {
			EdgeType::Maladaptive => self.maladaptive_end_marker,
			EdgeType::Unchanged => self.unchanged_end_marker,
			EdgeType::Adaptive => self.adaptive_end_marker,
		}
	}

	/// Repair values that would otherwise break graph or viewport invariants.
	pub fn validated(mut self) -> Self {
		let fallback = Self::default();
		if !(self.min_node_width > 0.0) {
			self.min_node_width = fallback.min_node_width;
		}
		if !(self.min_node_height > 0.0) {
			self.min_node_height = fallback.min_node_height;
		}
		self.default_node_width = self.default_node_width.max(self.min_node_width);
		self.default_node_height = self.default_node_height.max(self.min_node_height);
		self.default_strength = self.default_strength.min(self.max_strength);
		if !(self.zoom_factor > 1.0) {
			self.zoom_factor = fallback.zoom_factor;
		}
		if !(self.min_scale > 0.0) || self.min_scale > self.max_scale {
			self.min_scale = fallback.min_scale;
			self.max_scale = fallback.max_scale;
		}
		if self.default_node_text.trim().is_empty() {
			self.default_node_text = fallback.default_node_text;
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn adaptive_defaults_to_circle() {
		let config = CanvasConfig::default();
		assert_eq!(config.end_marker_for(EdgeType::Adaptive), Marker::Circle);
		assert_eq!(config.end_marker_for(EdgeType::Maladaptive), Marker::Arrow);
		assert_eq!(config.end_marker_for(EdgeType::Unchanged), Marker::Arrow);
	}

	#[test]
	fn validated_repairs_inconsistent_values() {
		let config = CanvasConfig {
			min_node_width: 200.0,
			default_node_width: 100.0,
			default_strength: 9,
			min_scale: 4.0,
			max_scale: 2.0,
			zoom_factor: 0.5,
			default_node_text: "  ".into(),
			..CanvasConfig::default()
		}
		.validated();
		assert_eq!(config.default_node_width, 200.0);
		assert_eq!(config.default_strength, 5);
		assert_eq!((config.min_scale, config.max_scale), (0.3, 3.0));
		assert_eq!(config.zoom_factor, 1.2);
		assert_eq!(config.default_node_text, "New process");
	}

	#[test]
	fn partial_json_falls_back_to_defaults() {
		let config: CanvasConfig =
			serde_json::from_str(r#"{ "adaptive_end_marker": "square", "show_tags": false }"#)
				.unwrap();
		assert_eq!(config.adaptive_end_marker, Marker::Square);
		assert!(!config.show_tags);
		assert_eq!(config.min_node_width, 120.0);
	}
}
