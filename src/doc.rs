//! Document model: the host-owned entities the minimap mirrors.
//!
//! The host owns every document. This module only describes the snapshot the
//! host hands over on each lifecycle event (`MirroredDocument`), the sparse
//! delta accompanying updates (`DocumentDelta`), and the typed per-variant
//! payloads. Dispatch over Token/Tile/Drawing/Note is an explicit tag on
//! [`DocumentBody`], so every reconcile branch is exhaustively matched.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sort::SortKey;

/// Unique identifier for a mirrored document.
pub type DocumentId = Uuid;

/// Unique identifier for a scene.
pub type SceneId = Uuid;

/// The kind of a mirrored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Token,
    Tile,
    Drawing,
    Note,
}

fn one() -> f64 {
    1.0
}

/// Texture reference shared by tokens and tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureRef {
    /// Image or video source path. Documents without one are not mirrored.
    #[serde(default)]
    pub src: Option<String>,
    /// CSS color tint. Absent means no tint.
    #[serde(default)]
    pub tint: Option<String>,
    /// Signed horizontal scale; negative mirrors the image.
    #[serde(default = "one")]
    pub scale_x: f64,
    /// Signed vertical scale; negative flips the image.
    #[serde(default = "one")]
    pub scale_y: f64,
}

impl Default for TextureRef {
    fn default() -> Self {
        Self { src: None, tint: None, scale_x: 1.0, scale_y: 1.0 }
    }
}

/// Payload for tokens and tiles.
///
/// Token `width`/`height` are in grid units; tile `width`/`height` are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TexturedData {
    #[serde(default)]
    pub texture: TextureRef,
    #[serde(default = "one")]
    pub width: f64,
    #[serde(default = "one")]
    pub height: f64,
}

/// Geometry type of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Polygon,
}

/// Drawing geometry. `points` is a flat `[x0, y0, x1, y1, ...]` list
/// relative to the drawing origin, used by polygons only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    pub kind: ShapeKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub points: Vec<f64>,
    /// Polygon smoothing strength; `0` draws straight segments.
    #[serde(default)]
    pub bezier_factor: f64,
}

/// Fill style of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillType {
    #[default]
    None,
    Solid,
    Pattern,
}

/// Payload for drawings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingData {
    pub shape: ShapeData,
    /// HUD/info drawing rendered above ordinary scene content.
    #[serde(default)]
    pub interface: bool,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default = "one")]
    pub stroke_alpha: f64,
    #[serde(default)]
    pub fill_type: FillType,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default = "one")]
    pub fill_alpha: f64,
    /// Pattern image for [`FillType::Pattern`].
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub text_color: Option<String>,
}

/// Minimap-specific note flags stored on the note itself.
///
/// These are not host-authoritative; the host's own note permissions are
/// never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteFlags {
    /// Show the note to non-GM viewers.
    pub show: bool,
    /// Draw a rounded background panel behind the icon.
    #[serde(rename = "showBG")]
    pub show_bg: bool,
    /// Show the note's text label under the icon.
    pub show_label: bool,
}

impl Default for NoteFlags {
    fn default() -> Self {
        Self { show: false, show_bg: true, show_label: true }
    }
}

/// Payload for notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_size: Option<f64>,
    #[serde(default)]
    pub tint: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub flags: NoteFlags,
}

/// Variant payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentBody {
    Token(TexturedData),
    Tile(TexturedData),
    Drawing(DrawingData),
    Note(NoteData),
}

/// A host document snapshot as delivered with a lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirroredDocument {
    /// Unique identifier for this document.
    pub id: DocumentId,
    /// The scene that contains this document.
    pub scene_id: SceneId,
    /// Display name, used to label the proxy.
    #[serde(default)]
    pub name: Option<String>,
    /// Left edge (center for notes) in scene canvas coordinates.
    pub x: f64,
    /// Top edge (center for notes) in scene canvas coordinates.
    pub y: f64,
    /// Depth band for paint ordering.
    #[serde(default)]
    pub elevation: f64,
    /// Tie-break order within an elevation band.
    #[serde(default)]
    pub sort: i64,
    /// Clockwise rotation in degrees around the center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub hidden: bool,
    /// Opacity; absent means fully opaque.
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(flatten)]
    pub body: DocumentBody,
}

impl MirroredDocument {
    /// The variant tag of this document.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self.body {
            DocumentBody::Token(_) => DocumentKind::Token,
            DocumentBody::Tile(_) => DocumentKind::Tile,
            DocumentBody::Drawing(_) => DocumentKind::Drawing,
            DocumentBody::Note(_) => DocumentKind::Note,
        }
    }

    /// Whether this is an interface (HUD) drawing.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(&self.body, DocumentBody::Drawing(d) if d.interface)
    }

    /// The paint-order inputs of this document.
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            kind: self.kind(),
            elevation: self.elevation,
            sort: self.sort,
            interface: self.is_interface(),
        }
    }

    /// Human-readable proxy name: the document name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Sparse texture update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
}

/// Sparse note-flag update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFlagsDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(rename = "showBG", skip_serializing_if = "Option::is_none")]
    pub show_bg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_label: Option<bool>,
}

/// Sparse update for a mirrored document. Only present fields changed.
///
/// The reconciler reads current values from the full document; the delta
/// decides which cached visual resources must be regenerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Token/tile texture, or the note icon (`src`/`tint`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_type: Option<FillType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_alpha: Option<f64>,
    /// Drawing pattern image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<NoteFlagsDelta>,
}

impl DocumentDelta {
    /// Whether the token/tile image source changed.
    #[must_use]
    pub fn touches_texture(&self) -> bool {
        self.texture.as_ref().is_some_and(|t| t.src.is_some())
    }

    /// Whether the rasterized drawing shape must be rebuilt.
    #[must_use]
    pub fn touches_shape(&self) -> bool {
        self.shape.is_some()
            || self.stroke_width.is_some()
            || self.stroke_color.is_some()
            || self.stroke_alpha.is_some()
            || self.fill_type.is_some()
            || self.fill_color.is_some()
            || self.fill_alpha.is_some()
            || self.fill_texture.is_some()
    }

    /// Whether the rasterized note composite must be rebuilt.
    #[must_use]
    pub fn touches_note_icon(&self) -> bool {
        self.texture.as_ref().is_some_and(|t| t.src.is_some() || t.tint.is_some())
            || self.icon_size.is_some()
            || self.flags.is_some_and(|f| f.show_bg.is_some())
    }

    /// Merge this delta into `doc`. Fields that do not apply to the document's
    /// variant are ignored.
    pub fn apply(&self, doc: &mut MirroredDocument) {
        if let Some(x) = self.x {
            doc.x = x;
        }
        if let Some(y) = self.y {
            doc.y = y;
        }
        if let Some(e) = self.elevation {
            doc.elevation = e;
        }
        if let Some(s) = self.sort {
            doc.sort = s;
        }
        if let Some(r) = self.rotation {
            doc.rotation = r;
        }
        if let Some(h) = self.hidden {
            doc.hidden = h;
        }
        if let Some(a) = self.alpha {
            doc.alpha = Some(a);
        }

        match &mut doc.body {
            DocumentBody::Token(data) | DocumentBody::Tile(data) => {
                if let Some(w) = self.width {
                    data.width = w;
                }
                if let Some(h) = self.height {
                    data.height = h;
                }
                if let Some(ref tex) = self.texture {
                    if let Some(ref src) = tex.src {
                        data.texture.src = Some(src.clone());
                    }
                    if let Some(ref tint) = tex.tint {
                        data.texture.tint = Some(tint.clone());
                    }
                    if let Some(sx) = tex.scale_x {
                        data.texture.scale_x = sx;
                    }
                    if let Some(sy) = tex.scale_y {
                        data.texture.scale_y = sy;
                    }
                }
            }
            DocumentBody::Drawing(data) => self.apply_drawing(data),
            DocumentBody::Note(data) => self.apply_note(data),
        }
    }

    fn apply_drawing(&self, data: &mut DrawingData) {
        if let Some(ref shape) = self.shape {
            data.shape = shape.clone();
        }
        if let Some(i) = self.interface {
            data.interface = i;
        }
        if let Some(w) = self.stroke_width {
            data.stroke_width = w;
        }
        if let Some(ref c) = self.stroke_color {
            data.stroke_color = Some(c.clone());
        }
        if let Some(a) = self.stroke_alpha {
            data.stroke_alpha = a;
        }
        if let Some(t) = self.fill_type {
            data.fill_type = t;
        }
        if let Some(ref c) = self.fill_color {
            data.fill_color = Some(c.clone());
        }
        if let Some(a) = self.fill_alpha {
            data.fill_alpha = a;
        }
        if let Some(ref t) = self.fill_texture {
            data.texture = Some(t.clone());
        }
        self.apply_text(&mut data.text, &mut data.font_family, &mut data.font_size, &mut data.text_color);
    }

    fn apply_note(&self, data: &mut NoteData) {
        if let Some(ref tex) = self.texture {
            if let Some(ref src) = tex.src {
                data.icon = Some(src.clone());
            }
            if let Some(ref tint) = tex.tint {
                data.tint = Some(tint.clone());
            }
        }
        if let Some(size) = self.icon_size {
            data.icon_size = Some(size);
        }
        if let Some(flags) = self.flags {
            if let Some(show) = flags.show {
                data.flags.show = show;
            }
            if let Some(bg) = flags.show_bg {
                data.flags.show_bg = bg;
            }
            if let Some(label) = flags.show_label {
                data.flags.show_label = label;
            }
        }
        self.apply_text(&mut data.text, &mut data.font_family, &mut data.font_size, &mut data.text_color);
    }

    fn apply_text(
        &self,
        text: &mut Option<String>,
        family: &mut Option<String>,
        size: &mut Option<f64>,
        color: &mut Option<String>,
    ) {
        if let Some(ref t) = self.text {
            *text = Some(t.clone());
        }
        if let Some(ref f) = self.font_family {
            *family = Some(f.clone());
        }
        if let Some(s) = self.font_size {
            *size = Some(s);
        }
        if let Some(ref c) = self.text_color {
            *color = Some(c.clone());
        }
    }
}
