use super::types::Point;

/// Smallest allowed zoom.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest allowed zoom.
pub const MAX_ZOOM: f64 = 2.0;
/// Zoom change per button press or wheel notch.
pub const ZOOM_STEP: f64 = 0.1;

/// Pan/zoom of the canvas: `screen = model * zoom + pan`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Scale factor, always within `[MIN_ZOOM, MAX_ZOOM]`.
	pub zoom: f64,
	/// Screen offset of the model origin.
	pub pan: Point,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			pan: Point::ZERO,
		}
	}
}

impl ViewTransform {
	/// Builds a view, clamping `zoom`.
	pub fn new(zoom: f64, pan: Point) -> Self {
		Self {
			zoom: clamp_zoom(zoom),
			pan,
		}
	}

	/// Canvas pixel to model coordinates.
	pub fn screen_to_model(&self, screen: Point) -> Point {
		let offset = screen - self.pan;
		Point::new(offset.x / self.zoom, offset.y / self.zoom)
	}

	/// Model coordinates to canvas pixel.
	pub fn model_to_screen(&self, model: Point) -> Point {
		model.scale(self.zoom) + self.pan
	}

	/// One step in; the model origin stays put.
	pub fn zoom_in(&mut self) {
		self.zoom = clamp_zoom(self.zoom + ZOOM_STEP);
	}

	/// One step out; the model origin stays put.
	pub fn zoom_out(&mut self) {
		self.zoom = clamp_zoom(self.zoom - ZOOM_STEP);
	}

	/// Sets the zoom while keeping the model point under `anchor` (screen space) fixed.
	pub fn zoom_around(&mut self, anchor: Point, zoom: f64) {
		let new_zoom = clamp_zoom(zoom);
		let ratio = new_zoom / self.zoom;
		self.pan = anchor - (anchor - self.pan).scale(ratio);
		self.zoom = new_zoom;
	}

	/// Shifts the view by a screen-space delta.
	pub fn pan_by(&mut self, delta: Point) {
		self.pan = self.pan + delta;
	}

	/// Back to zoom 1 with no pan.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}

/// Clamps into `[MIN_ZOOM, MAX_ZOOM]`; non-finite or non-positive input becomes 1.
pub fn clamp_zoom(zoom: f64) -> f64 {
	if zoom.is_finite() && zoom > 0.0 {
		zoom.clamp(MIN_ZOOM, MAX_ZOOM)
	} else {
		1.0
	}
}
