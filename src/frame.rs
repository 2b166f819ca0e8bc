//! Widget frame: where the minimap sits on screen and what shape it has.
//!
//! The frame is pinned to one screen corner inside the area left free by the
//! host's UI chrome, offset by padding. Its shape decides pointer
//! containment and is baked into a mask texture. An optional nine-slice
//! overlay image is stretched over the frame as a border.

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::consts::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::error::RenderError;
use crate::host::{LoadTicket, MaskShape, Raster, RenderBackend, TextureLoad};
use crate::settings::{MapPosition, MapShape, MinimapSettings, OverlaySettings};
use crate::sprite::Sprite;
use crate::viewport::Point;

/// Free screen area between the host's UI chrome, in CSS pixels.
///
/// `right` and `bottom` are the screen coordinates where the right and bottom
/// chrome begins, not distances from the edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// One piece of a nine-slice: copy `src` of the image into `dst` of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub src: Rect,
    pub dst: Rect,
}

/// Split a `src_w` × `src_h` image into nine pieces stretched over a
/// `dst_w` × `dst_h` frame. Corners keep their size, edges stretch along one
/// axis and the center stretches along both. Rows run top to bottom.
#[must_use]
pub fn nine_slice(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64, borders: &OverlaySettings) -> [Slice; 9] {
    let OverlaySettings { left, right, top, bottom, .. } = *borders;
    let src_cols = [(0.0, left), (left, src_w - left - right), (src_w - right, right)];
    let dst_cols = [(0.0, left), (left, dst_w - left - right), (dst_w - right, right)];
    let src_rows = [(0.0, top), (top, src_h - top - bottom), (src_h - bottom, bottom)];
    let dst_rows = [(0.0, top), (top, dst_h - top - bottom), (dst_h - bottom, bottom)];

    std::array::from_fn(|i| {
        let (row, col) = (i / 3, i % 3);
        Slice {
            src: Rect::new(src_cols[col].0, src_rows[row].0, src_cols[col].1, src_rows[row].1),
            dst: Rect::new(dst_cols[col].0, dst_rows[row].0, dst_cols[col].1, dst_rows[row].1),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameImage {
    Mask,
    Overlay,
}

/// Frame geometry plus its mask and overlay sprites.
#[derive(Debug)]
pub struct Frame {
    width: f64,
    height: f64,
    shape: MapShape,
    position: MapPosition,
    pad_x: f64,
    pad_y: f64,
    mask_src: String,
    overlay_settings: OverlaySettings,
    origin: Point,
    mask: Sprite,
    overlay: Sprite,
    pending: HashMap<LoadTicket, FrameImage>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            shape: MapShape::Rectangle,
            position: MapPosition::BottomRight,
            pad_x: 0.0,
            pad_y: 0.0,
            mask_src: String::new(),
            overlay_settings: OverlaySettings::default(),
            origin: Point::new(0.0, 0.0),
            mask: Sprite::new("Mask"),
            overlay: Sprite::new("Overlay Plane"),
            pending: HashMap::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn shape(&self) -> MapShape {
        self.shape
    }

    /// Top-left corner on screen, as of the last [`Frame::layout`].
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    #[must_use]
    pub fn mask(&self) -> &Sprite {
        &self.mask
    }

    #[must_use]
    pub fn overlay(&self) -> &Sprite {
        &self.overlay
    }

    #[must_use]
    pub fn overlay_settings(&self) -> &OverlaySettings {
        &self.overlay_settings
    }

    /// Adopt the frame-related parts of `settings`. The mask is rebaked when
    /// shape, size or mask image change; the overlay is reloaded when its
    /// settings change.
    pub fn configure<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, settings: &MinimapSettings) {
        self.position = settings.position;
        self.pad_x = settings.pad_x;
        self.pad_y = settings.pad_y;

        let mask_stale = self.mask.is_provisional()
            || self.shape != settings.shape
            || self.width != settings.width
            || self.height != settings.height
            || (settings.shape == MapShape::Mask && self.mask_src != settings.mask);
        self.shape = settings.shape;
        self.width = settings.width;
        self.height = settings.height;
        self.mask_src.clone_from(&settings.mask);
        if mask_stale {
            if let Err(e) = self.rebuild_mask(gfx) {
                warn!(error = %e, shape = ?self.shape, "frame mask failed");
            }
        }

        if self.overlay_settings != settings.overlay_settings {
            self.overlay_settings = settings.overlay_settings.clone();
            if let Err(e) = self.reload_overlay(gfx) {
                warn!(error = %e, file = %self.overlay_settings.file, "overlay image failed");
            }
        }
        self.overlay.width = self.width;
        self.overlay.height = self.height;
    }

    fn rebuild_mask<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) -> Result<(), RenderError> {
        self.pending.retain(|_, image| *image != FrameImage::Mask);
        self.mask.width = self.width;
        self.mask.height = self.height;

        let shape = match self.shape {
            MapShape::Rectangle => MaskShape::Rectangle,
            MapShape::Circle => MaskShape::Circle,
            MapShape::Diamond => MaskShape::Diamond,
            MapShape::Mask if !self.mask_src.is_empty() => {
                match gfx.load_texture(&self.mask_src)? {
                    TextureLoad::Ready(texture) => self.mask.replace_texture(gfx, texture),
                    TextureLoad::Pending(ticket) => {
                        self.pending.insert(ticket, FrameImage::Mask);
                    }
                }
                return Ok(());
            }
            // An image mask without an image clips to the full rectangle.
            MapShape::Mask => MaskShape::Rectangle,
        };
        let texture = gfx.rasterize(&Raster::Mask { shape, width: self.width, height: self.height })?;
        self.mask.replace_texture(gfx, texture);
        Ok(())
    }

    fn reload_overlay<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) -> Result<(), RenderError> {
        self.pending.retain(|_, image| *image != FrameImage::Overlay);
        if self.overlay_settings.file.is_empty() {
            self.overlay.clear_texture(gfx);
            self.overlay.renderable = false;
            return Ok(());
        }
        self.overlay.renderable = self.overlay_settings.visible;
        match gfx.load_texture(&self.overlay_settings.file)? {
            TextureLoad::Ready(texture) => self.overlay.replace_texture(gfx, texture),
            TextureLoad::Pending(ticket) => {
                self.pending.insert(ticket, FrameImage::Overlay);
            }
        }
        Ok(())
    }

    /// Finish a deferred mask or overlay load. Returns `false` if `ticket`
    /// is not ours or has been superseded.
    pub fn asset_ready<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, ticket: LoadTicket) -> bool {
        let Some(image) = self.pending.remove(&ticket) else {
            return false;
        };
        let (src, sprite) = match image {
            FrameImage::Mask => (self.mask_src.as_str(), &mut self.mask),
            FrameImage::Overlay => (self.overlay_settings.file.as_str(), &mut self.overlay),
        };
        match gfx.load_texture(src) {
            Ok(TextureLoad::Ready(texture)) => {
                sprite.replace_texture(gfx, texture);
                true
            }
            Ok(TextureLoad::Pending(next)) => {
                debug!(?image, "frame image still decoding");
                self.pending.insert(next, image);
                false
            }
            Err(e) => {
                warn!(error = %e, ?image, "frame image unavailable");
                false
            }
        }
    }

    /// Nine-slice pieces of the overlay, or nothing while it is hidden or
    /// still loading.
    #[must_use]
    pub fn overlay_slices(&self) -> Vec<Slice> {
        if !self.overlay.renderable {
            return Vec::new();
        }
        let Some(texture) = self.overlay.texture() else {
            return Vec::new();
        };
        nine_slice(texture.width, texture.height, self.width, self.height, &self.overlay_settings).to_vec()
    }

    /// Position the frame within `screen` and return its new origin.
    pub fn layout(&mut self, screen: ScreenBounds) -> Point {
        let left = screen.left + self.pad_x;
        let right = screen.right - self.width - self.pad_x;
        let top = screen.top + self.pad_y;
        let bottom = screen.bottom - self.height - self.pad_y;
        self.origin = match self.position {
            MapPosition::BottomLeft => Point::new(left, bottom),
            MapPosition::BottomRight => Point::new(right, bottom),
            MapPosition::TopLeft => Point::new(left, top),
            MapPosition::TopRight => Point::new(right, top),
        };
        self.origin
    }

    /// Convert a screen point into frame-local coordinates.
    #[must_use]
    pub fn to_local(&self, screen: Point) -> Point {
        Point::new(screen.x - self.origin.x, screen.y - self.origin.y)
    }

    /// Whether a frame-local point is inside the frame's shape. Image masks
    /// use the bounding rectangle.
    #[must_use]
    pub fn contains(&self, local: Point) -> bool {
        let (w, h) = (self.width, self.height);
        if w <= 0.0 || h <= 0.0 || local.x < 0.0 || local.y < 0.0 || local.x > w || local.y > h {
            return false;
        }
        let (dx, dy) = (local.x - w / 2.0, local.y - h / 2.0);
        match self.shape {
            MapShape::Rectangle | MapShape::Mask => true,
            MapShape::Circle => {
                let r = w.min(h) / 2.0;
                dx * dx + dy * dy <= r * r
            }
            MapShape::Diamond => dx.abs() / (w / 2.0) + dy.abs() / (h / 2.0) <= 1.0,
        }
    }

    #[must_use]
    pub fn contains_screen(&self, screen: Point) -> bool {
        self.contains(self.to_local(screen))
    }

    /// Release the mask and overlay textures.
    pub fn clear<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        self.mask.clear_texture(gfx);
        self.overlay.clear_texture(gfx);
        self.pending.clear();
    }
}
