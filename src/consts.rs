//! Shared numeric constants for the minimap crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.01;

/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 5.0;

/// Default wheel zoom step.
pub const DEFAULT_ZOOM_STEP: f64 = 0.025;

/// Largest configurable wheel zoom step.
pub const MAX_ZOOM_STEP: f64 = 0.05;

// ── Frame ───────────────────────────────────────────────────────

/// Default widget frame width in CSS pixels.
pub const DEFAULT_FRAME_WIDTH: f64 = 300.0;

/// Default widget frame height in CSS pixels.
pub const DEFAULT_FRAME_HEIGHT: f64 = 200.0;

// ── Scene layers ────────────────────────────────────────────────

/// Darkness overlay alpha is `darkness_level * DARKNESS_ALPHA_CAP`, never full black.
pub const DARKNESS_ALPHA_CAP: f64 = 0.8;

/// Fallback scene background color when the scene has none.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#999999";

/// Tint meaning "no tint".
pub const WHITE: &str = "#FFFFFF";

/// Font used for drawing and note labels when the document names none.
pub const DEFAULT_FONT_FAMILY: &str = "Signika";

/// Label font size when the document names none.
pub const DEFAULT_FONT_SIZE: f64 = 32.0;

/// Note icon edge length when the document names none.
pub const DEFAULT_NOTE_ICON_SIZE: f64 = 40.0;

// ── Markers ─────────────────────────────────────────────────────

/// Marker icon edge length when the marker config names none.
pub const DEFAULT_MARKER_SIZE: f64 = 100.0;

/// Default marker label font size.
pub const DEFAULT_MARKER_FONT_SIZE: f64 = 32.0;
