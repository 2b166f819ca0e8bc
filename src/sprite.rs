//! Visual proxy: the lightweight node the minimap owns per mirrored document.
//!
//! A sprite owns its texture and its children (currently text labels).
//! Ownership is strictly downward; destroying a sprite releases its texture
//! through the backend and drops its children.

#[cfg(test)]
#[path = "sprite_test.rs"]
mod sprite_test;

use crate::consts::WHITE;
use crate::host::{RenderBackend, Texture};
use crate::viewport::Point;

/// Text label attached to a sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
    /// Wrap width in pixels; `None` disables wrapping.
    pub word_wrap_width: Option<f64>,
    /// Label anchor, `(0.5, 0.0)` is top-center.
    pub anchor: Point,
    /// Offset from the parent's anchor point, in the parent's local space.
    pub offset: Point,
    pub renderable: bool,
}

/// Owned child of a sprite.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Label(TextLabel),
}

/// A retained-mode visual node.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub name: String,
    texture: Option<Texture>,
    /// Anchor position in content space.
    pub x: f64,
    pub y: f64,
    /// Unsigned display size.
    pub width: f64,
    pub height: f64,
    pub anchor: Point,
    /// Clockwise rotation in degrees about the anchor.
    pub rotation_deg: f64,
    sign_x: f64,
    sign_y: f64,
    pub tint: String,
    pub alpha: f64,
    pub renderable: bool,
    pub z_index: i64,
    children: Vec<Child>,
    destroyed: bool,
}

impl Sprite {
    /// An empty, untextured sprite anchored at its top-left corner.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            anchor: Point::new(0.0, 0.0),
            rotation_deg: 0.0,
            sign_x: 1.0,
            sign_y: 1.0,
            tint: WHITE.to_owned(),
            alpha: 1.0,
            renderable: true,
            z_index: 0,
            children: Vec::new(),
            destroyed: false,
        }
    }

    /// An empty sprite anchored at its center, so rotation pivots there.
    #[must_use]
    pub fn centered(name: impl Into<String>) -> Self {
        Self { anchor: Point::new(0.5, 0.5), ..Self::new(name) }
    }

    #[must_use]
    pub fn texture(&self) -> Option<Texture> {
        self.texture
    }

    /// Whether the sprite is still waiting for its first texture.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.texture.is_none()
    }

    /// Swap in a new texture, releasing the previous one.
    pub fn replace_texture<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, texture: Texture) {
        if let Some(old) = self.texture.replace(texture) {
            if old.id != texture.id {
                gfx.release_texture(old.id);
            }
        }
    }

    /// Drop the texture, releasing it.
    pub fn clear_texture<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        if let Some(old) = self.texture.take() {
            gfx.release_texture(old.id);
        }
    }

    /// Signed scale multipliers, `±1` per axis.
    #[must_use]
    pub fn scale_sign(&self) -> (f64, f64) {
        (self.sign_x, self.sign_y)
    }

    /// Match the flip state to the sign of `target_x` / `target_y`.
    ///
    /// Only flips an axis whose current sign disagrees with the target, so
    /// repeated calls with the same targets are no-ops.
    pub fn apply_scale_sign(&mut self, target_x: f64, target_y: f64) {
        if (self.sign_x < 0.0) != (target_x < 0.0) {
            self.sign_x = -self.sign_x;
        }
        if (self.sign_y < 0.0) != (target_y < 0.0) {
            self.sign_y = -self.sign_y;
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// The attached label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&TextLabel> {
        self.children.iter().map(|Child::Label(l)| l).next()
    }

    /// Attach `label`, replacing any existing one.
    pub fn set_label(&mut self, label: TextLabel) {
        self.remove_label();
        self.children.push(Child::Label(label));
    }

    /// Detach the label, if any.
    pub fn remove_label(&mut self) {
        self.children.retain(|c| !matches!(c, Child::Label(_)));
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release the texture and children. Idempotent.
    pub fn destroy<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        if self.destroyed {
            return;
        }
        self.clear_texture(gfx);
        self.children.clear();
        self.destroyed = true;
    }

    /// Mark as destroyed without touching the backend, for when the host has
    /// already freed the underlying resource.
    pub fn invalidate(&mut self) {
        self.texture = None;
        self.children.clear();
        self.destroyed = true;
    }
}
