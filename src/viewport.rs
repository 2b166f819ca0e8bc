//! Viewport controller: pan/zoom of the mirrored content inside the frame.
//!
//! `pan_x` / `pan_y` are the offset of the content origin from the frame's
//! top-left corner, in CSS pixels. `zoom` is a scale factor clamped to
//! [`MIN_ZOOM`, `MAX_ZOOM`] on every write. Persistence and broadcast are the
//! caller's concern; every mutator reports whether the view changed.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ZOOM_STEP, MAX_ZOOM, MAX_ZOOM_STEP, MIN_ZOOM};

/// A point in either frame (screen) or content (world) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Persisted and synchronized view state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

/// Clamp a requested zoom into the supported range. NaN maps to 1.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() { 1.0 } else { zoom.clamp(MIN_ZOOM, MAX_ZOOM) }
}

/// Clamp a configured wheel step into the supported range.
#[must_use]
pub fn clamp_zoom_step(step: f64) -> f64 {
    if step.is_nan() { DEFAULT_ZOOM_STEP } else { step.clamp(DEFAULT_ZOOM_STEP, MAX_ZOOM_STEP) }
}

/// Pan/zoom state of one client.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pan_x: f64,
    pan_y: f64,
    zoom: f64,
    zoom_step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0, zoom_step: DEFAULT_ZOOM_STEP }
    }
}

impl Viewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pan_x(&self) -> f64 {
        self.pan_x
    }

    #[must_use]
    pub fn pan_y(&self) -> f64 {
        self.pan_y
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn zoom_step(&self) -> f64 {
        self.zoom_step
    }

    pub fn set_zoom_step(&mut self, step: f64) {
        self.zoom_step = clamp_zoom_step(step);
    }

    /// Current state in its persisted/synchronized form.
    #[must_use]
    pub fn view(&self) -> ViewState {
        ViewState { x: self.pan_x, y: self.pan_y, zoom: self.zoom }
    }

    /// Set the pan offset. Returns `true` if it changed.
    pub fn set_pan(&mut self, x: f64, y: f64) -> bool {
        if x == self.pan_x && y == self.pan_y {
            return false;
        }
        self.pan_x = x;
        self.pan_y = y;
        true
    }

    /// Set the zoom, clamped to the supported range. Returns `true` if it changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = clamp_zoom(zoom);
        if zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        true
    }

    /// Apply a full view. Applying the same view twice changes nothing the second time.
    pub fn set_view(&mut self, view: ViewState) -> bool {
        let panned = self.set_pan(view.x, view.y);
        let zoomed = self.set_zoom(view.zoom);
        panned || zoomed
    }

    /// Accumulate a pointer-drag delta into the pan offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        self.set_pan(self.pan_x + dx, self.pan_y + dy)
    }

    /// Reset pan to the origin and shrink the zoom so the content fills the frame.
    ///
    /// Only axes where the content exceeds the frame take part; of those, the
    /// ratio that keeps the frame filled (the larger one) wins. Content that
    /// fits on both axes keeps the current zoom, so fitting never zooms in.
    ///
    /// This is a cover fit, not a contain fit: when both axes overflow by
    /// different amounts the other axis can still overflow the frame
    /// (1000×900 content in a 300×800 frame fits to 800/900 and stays 889
    /// wide).
    pub fn fit_to_content(&mut self, content_w: f64, content_h: f64, frame_w: f64, frame_h: f64) -> bool {
        let mut changed = self.set_pan(0.0, 0.0);
        let ratio = |content: f64, frame: f64| (content > frame && content > 0.0).then(|| frame / content);
        let fit = match (ratio(content_w, frame_w), ratio(content_h, frame_h)) {
            (Some(w), Some(h)) => Some(w.max(h)),
            (w, h) => w.or(h),
        };
        if let Some(zoom) = fit {
            changed |= self.set_zoom(zoom);
        }
        changed
    }

    /// Step the zoom by one wheel notch, keeping the content point under
    /// `anchor` (frame-local) fixed. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, anchor: Point, delta_y: f64) -> bool {
        let target = if delta_y < 0.0 {
            self.zoom + self.zoom_step
        } else if delta_y > 0.0 {
            self.zoom - self.zoom_step
        } else {
            return false;
        };

        let local = self.frame_to_content(anchor);
        let old_zoom = self.zoom;
        if !self.set_zoom(target) {
            return false;
        }
        let dz = self.zoom - old_zoom;
        self.pan_x -= local.x * dz;
        self.pan_y -= local.y * dz;
        true
    }

    /// Convert a frame-local point (CSS pixels) to content coordinates.
    #[must_use]
    pub fn frame_to_content(&self, frame: Point) -> Point {
        Point {
            x: (frame.x - self.pan_x) / self.zoom,
            y: (frame.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a content point to frame-local coordinates (CSS pixels).
    #[must_use]
    pub fn content_to_frame(&self, content: Point) -> Point {
        Point {
            x: content.x * self.zoom + self.pan_x,
            y: content.y * self.zoom + self.pan_y,
        }
    }
}
