use super::config::CanvasConfig;
use super::types::Point;

/// Pan/zoom transform between screen pixels and logical canvas units.
///
/// `screen = logical * scale + pan`. Every gesture goes through
/// [`Viewport::screen_to_logical`] so drag math never drifts from the zoom.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	pub scale: f64,
	pub pan: Point,
	factor: f64,
	min_scale: f64,
	max_scale: f64,
}

impl Viewport {
	pub fn new(config: &CanvasConfig) -> Self {
		Self {
			scale: 1.0,
			pan: Point::default(),
			factor: config.zoom_factor,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
		}
	}

	pub fn screen_to_logical(&self, px: f64, py: f64) -> Point {
		Point::new((px - self.pan.x) / self.scale, (py - self.pan.y) / self.scale)
	}

	pub fn logical_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.scale + self.pan.x, p.y * self.scale + self.pan.y)
	}

	fn clamp(&self, scale: f64) -> f64 {
		scale.clamp(self.min_scale, self.max_scale)
	}

	pub fn zoom_in(&mut self) {
		self.scale = self.clamp(self.scale * self.factor);
	}

	pub fn zoom_out(&mut self) {
		self.scale = self.clamp(self.scale / self.factor);
	}

	/// Wheel zoom: rescale while keeping the logical point under `(sx, sy)`
	/// fixed on screen.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let next = if zoom_in {
			self.scale * self.factor
		} else {
			self.scale / self.factor
		};
		let next = self.clamp(next);
		let ratio = next / self.scale;
		self.pan.x = sx - (sx - self.pan.x) * ratio;
		self.pan.y = sy - (sy - self.pan.y) * ratio;
		self.scale = next;
	}

	pub fn reset(&mut self) {
		self.scale = 1.0;
		self.pan = Point::default();
	}

	/// Set pan to `origin` shifted by the screen-space drag delta.
	pub fn pan_from(&mut self, origin: Point, dx: f64, dy: f64) {
		self.pan = Point::new(origin.x + dx, origin.y + dy);
	}

	/// Logical point at the middle of a `width` x `height` screen.
	pub fn visible_center(&self, width: f64, height: f64) -> Point {
		self.screen_to_logical(width / 2.0, height / 2.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(&CanvasConfig::default())
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn zoom_is_clamped() {
		let mut v = viewport();
		for _ in 0..50 {
			v.zoom_in();
		}
		assert_eq!(v.scale, 3.0);
		for _ in 0..50 {
			v.zoom_out();
		}
		assert_eq!(v.scale, 0.3);
		v.reset();
		assert_eq!(v.scale, 1.0);
		assert_eq!(v.pan, Point::default());
	}

	#[test]
	fn screen_logical_mapping() {
		let mut v = viewport();
		v.scale = 2.0;
		v.pan = Point::new(100.0, -50.0);
		let p = v.screen_to_logical(300.0, 150.0);
		assert_eq!(p, Point::new(100.0, 100.0));
		assert_eq!(v.logical_to_screen(p), Point::new(300.0, 150.0));
	}

	#[test]
	fn zoom_at_keeps_anchor_fixed() {
		let mut v = viewport();
		v.pan = Point::new(40.0, 10.0);
		let before = v.screen_to_logical(250.0, 180.0);
		v.zoom_at(250.0, 180.0, true);
		let after = v.screen_to_logical(250.0, 180.0);
		assert!(close(before.x, after.x) && close(before.y, after.y));
		assert!(close(v.scale, 1.2));
	}

	#[test]
	fn panning_never_touches_scale() {
		let mut v = viewport();
		v.zoom_in();
		let origin = v.pan;
		v.pan_from(origin, 30.0, -12.0);
		assert_eq!(v.pan, Point::new(30.0, -12.0));
		assert!(close(v.scale, 1.2));
	}
}
