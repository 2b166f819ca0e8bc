//! Pointer input as delivered by the host, and the drag state machine.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Mouse button of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Other(u8),
}

impl Button {
    /// Map a DOM `MouseEvent.button` index.
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Primary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// Pointer down / move / up, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    /// Movement since the previous event.
    pub movement: Point,
    pub button: Button,
}

impl PointerEvent {
    #[must_use]
    pub fn at(x: f64, y: f64, button: Button) -> Self {
        Self { position: Point::new(x, y), movement: Point::new(0.0, 0.0), button }
    }

    #[must_use]
    pub fn moved(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { position: Point::new(x, y), movement: Point::new(dx, dy), button: Button::Primary }
    }
}

/// Wheel scroll, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub position: Point,
    /// Negative zooms in.
    pub delta_y: f64,
}

/// What a primary-button drag is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    None,
    Pan,
    Marker,
}

/// One drag at a time: a drag starts only from [`DragMode::None`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTracker {
    mode: DragMode,
}

impl DragTracker {
    #[must_use]
    pub fn mode(&self) -> DragMode {
        self.mode
    }

    /// Begin a drag. Returns `false` if one is already running.
    pub fn start(&mut self, mode: DragMode) -> bool {
        if self.mode != DragMode::None || mode == DragMode::None {
            return false;
        }
        self.mode = mode;
        true
    }

    /// End the current drag and return what it was.
    pub fn finish(&mut self) -> DragMode {
        std::mem::take(&mut self.mode)
    }
}
