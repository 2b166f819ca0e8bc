//! Map markers: GM-placed pins drawn over the mirrored content.
//!
//! Markers live in content space and are anchored at the bottom-center of
//! their icon, so `(x, y)` is the point the pin touches. The marker list is
//! owned by world settings; [`MarkerLayer`] only holds the live sprites and
//! transient pointer state (hover, drag). Mutations go back through settings
//! and arrive again via [`MarkerLayer::set_markers`].

#[cfg(test)]
#[path = "markers_test.rs"]
mod markers_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{DEFAULT_FONT_FAMILY, DEFAULT_MARKER_FONT_SIZE, DEFAULT_MARKER_SIZE, WHITE};
use crate::host::{LoadTicket, RenderBackend, TextureLoad};
use crate::sprite::{Sprite, TextLabel};
use crate::viewport::Point;

/// Icon used when a marker is created without one.
pub const DEFAULT_MARKER_ICON: &str = "modules/miniature-map/assets/map markers/marker.svg";

/// Which side of the icon the label sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAlign {
    Top,
    #[default]
    Bottom,
}

/// A persisted map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapMarker {
    pub id: String,
    pub label: String,
    /// Show the label without hovering.
    pub show_label: bool,
    pub tint: String,
    pub icon: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub drop_shadow: bool,
    pub label_align: LabelAlign,
    pub font_family: String,
    pub font_size: f64,
    pub font_color: String,
}

impl Default for MapMarker {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: String::new(),
            show_label: false,
            tint: WHITE.to_owned(),
            icon: DEFAULT_MARKER_ICON.to_owned(),
            x: 0.0,
            y: 0.0,
            width: DEFAULT_MARKER_SIZE,
            height: DEFAULT_MARKER_SIZE,
            drop_shadow: true,
            label_align: LabelAlign::default(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_size: DEFAULT_MARKER_FONT_SIZE,
            font_color: WHITE.to_owned(),
        }
    }
}

impl MapMarker {
    /// A new marker with a fresh id, placed at `point` rounded to whole pixels.
    #[must_use]
    pub fn at(point: Point) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            x: point.x.round(),
            y: point.y.round(),
            ..Self::default()
        }
    }

    /// Whether `point` (content space) lies on the icon.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let left = self.x - self.width / 2.0;
        let top = self.y - self.height;
        point.x >= left && point.x <= left + self.width && point.y >= top && point.y <= self.y
    }

    /// Whether the label is drawn, given the hover state.
    #[must_use]
    pub fn label_visible(&self, hovered: bool) -> bool {
        !self.label.is_empty() && (self.show_label || hovered)
    }

    fn text_label(&self, hovered: bool, zoom: f64) -> TextLabel {
        let (anchor_y, offset_y) = match self.label_align {
            LabelAlign::Top => (1.0, -self.height),
            LabelAlign::Bottom => (0.0, 0.0),
        };
        // Hovered labels keep a constant on-screen size regardless of zoom.
        let font_size = if hovered && zoom > 0.0 { self.font_size / zoom } else { self.font_size };
        TextLabel {
            text: self.label.clone(),
            font_family: self.font_family.clone(),
            font_size,
            color: self.font_color.clone(),
            word_wrap_width: Some(self.width),
            anchor: Point::new(0.5, anchor_y),
            offset: Point::new(0.0, offset_y),
            renderable: self.label_visible(hovered),
        }
    }
}

/// `markers` with `marker` replacing the entry of the same id.
/// Returns `None` if no such entry exists.
#[must_use]
pub fn replaced(markers: &[MapMarker], marker: MapMarker) -> Option<Vec<MapMarker>> {
    let index = markers.iter().position(|m| m.id == marker.id)?;
    let mut next = markers.to_vec();
    next[index] = marker;
    Some(next)
}

/// `markers` without the entry `id`. Returns `None` if no such entry exists.
#[must_use]
pub fn without(markers: &[MapMarker], id: &str) -> Option<Vec<MapMarker>> {
    if !markers.iter().any(|m| m.id == id) {
        return None;
    }
    Some(markers.iter().filter(|m| m.id != id).cloned().collect())
}

/// Live marker sprites plus hover and drag state.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<MapMarker>,
    sprites: HashMap<String, Sprite>,
    pending: HashMap<LoadTicket, String>,
    hovered: Option<String>,
    dragging: Option<String>,
    zoom: f64,
}

impl MarkerLayer {
    #[must_use]
    pub fn new() -> Self {
        Self { zoom: 1.0, ..Self::default() }
    }

    #[must_use]
    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    #[must_use]
    pub fn sprite(&self, id: &str) -> Option<&Sprite> {
        self.sprites.get(id)
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&MapMarker> {
        let id = self.hovered.as_deref()?;
        self.markers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Replace every marker. Hover and drag survive if their marker does.
    pub fn set_markers<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, markers: Vec<MapMarker>) {
        self.clear_sprites(gfx);
        for marker in &markers {
            let hovered = self.hovered.as_deref() == Some(marker.id.as_str());
            let mut sprite = Sprite::new(format!("Map Marker {}", marker.id));
            sprite.anchor = Point::new(0.5, 1.0);
            place(&mut sprite, marker, hovered, self.zoom);
            match gfx.load_texture(&marker.icon) {
                Ok(TextureLoad::Ready(texture)) => sprite.replace_texture(gfx, texture),
                Ok(TextureLoad::Pending(ticket)) => {
                    self.pending.insert(ticket, marker.id.clone());
                }
                Err(e) => warn!(marker = %marker.id, error = %e, "marker icon unavailable"),
            }
            self.sprites.insert(marker.id.clone(), sprite);
        }
        if self.hovered.as_ref().is_some_and(|id| !markers.iter().any(|m| &m.id == id)) {
            self.hovered = None;
        }
        if self.dragging.as_ref().is_some_and(|id| !markers.iter().any(|m| &m.id == id)) {
            self.dragging = None;
        }
        self.markers = markers;
    }

    /// Destroy every sprite and forget all markers.
    pub fn clear<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        self.clear_sprites(gfx);
        self.markers.clear();
        self.hovered = None;
        self.dragging = None;
    }

    fn clear_sprites<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        for sprite in self.sprites.values_mut() {
            sprite.destroy(gfx);
        }
        self.sprites.clear();
        self.pending.clear();
    }

    /// Finish a deferred icon load. Returns `false` for unknown or stale tickets.
    pub fn asset_ready<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, ticket: LoadTicket) -> bool {
        let Some(id) = self.pending.remove(&ticket) else {
            return false;
        };
        let Some(marker) = self.markers.iter().find(|m| m.id == id) else {
            debug!(marker = %id, "dropping icon load for removed marker");
            return false;
        };
        let texture = match gfx.load_texture(&marker.icon) {
            Ok(TextureLoad::Ready(texture)) => texture,
            Ok(TextureLoad::Pending(ticket)) => {
                self.pending.insert(ticket, id);
                return false;
            }
            Err(e) => {
                warn!(marker = %id, error = %e, "marker icon unavailable");
                return false;
            }
        };
        match self.sprites.get_mut(&id) {
            Some(sprite) => {
                sprite.replace_texture(gfx, texture);
                true
            }
            None => {
                gfx.release_texture(texture.id);
                false
            }
        }
    }

    /// Topmost marker under `point` (content space). Later markers draw on top.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&MapMarker> {
        self.markers.iter().rev().find(|m| m.contains(point))
    }

    /// Update the hovered marker for a pointer at `point`, or `None` when the
    /// pointer left the widget. Returns whether the hover target changed.
    pub fn hover(&mut self, point: Option<Point>, zoom: f64) -> bool {
        self.zoom = zoom;
        let next = point.and_then(|p| self.hit_test(p)).map(|m| m.id.clone());
        if next == self.hovered {
            return false;
        }
        let previous = std::mem::replace(&mut self.hovered, next);
        let touched: Vec<String> = previous.into_iter().chain(self.hovered.clone()).collect();
        for id in &touched {
            self.relabel(id);
        }
        true
    }

    fn relabel(&mut self, id: &str) {
        let hovered = self.hovered.as_deref() == Some(id);
        let Some(marker) = self.markers.iter().find(|m| m.id == id) else {
            return;
        };
        if let Some(sprite) = self.sprites.get_mut(id) {
            place(sprite, marker, hovered, self.zoom);
        }
    }

    /// Start dragging marker `id`. Returns `false` if there is no such marker.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        if !self.markers.iter().any(|m| m.id == id) {
            return false;
        }
        self.dragging = Some(id.to_owned());
        true
    }

    /// Move the dragged marker to `point`, rounded to whole pixels.
    /// Returns whether anything moved.
    pub fn drag_to(&mut self, point: Point) -> bool {
        let Some(id) = self.dragging.clone() else {
            return false;
        };
        let hovered = self.hovered.as_deref() == Some(id.as_str());
        let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        let (x, y) = (point.x.round(), point.y.round());
        if marker.x == x && marker.y == y {
            return false;
        }
        marker.x = x;
        marker.y = y;
        if let Some(sprite) = self.sprites.get_mut(&id) {
            place(sprite, marker, hovered, self.zoom);
        }
        true
    }

    /// Stop dragging. Returns the marker list to persist, if a drag was active.
    pub fn end_drag(&mut self) -> Option<Vec<MapMarker>> {
        self.dragging.take()?;
        Some(self.markers.clone())
    }

    /// Marker sprites in draw order, paired with their marker.
    #[must_use]
    pub fn painted(&self) -> Vec<(&MapMarker, &Sprite)> {
        self.markers.iter().filter_map(|m| self.sprites.get(&m.id).map(|s| (m, s))).collect()
    }
}

fn place(sprite: &mut Sprite, marker: &MapMarker, hovered: bool, zoom: f64) {
    sprite.x = marker.x;
    sprite.y = marker.y;
    sprite.width = marker.width;
    sprite.height = marker.height;
    sprite.tint.clone_from(&marker.tint);
    if marker.label.is_empty() {
        sprite.remove_label();
    } else {
        sprite.set_label(marker.text_label(hovered, zoom));
    }
}
