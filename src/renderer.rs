//! Scene renderer: mirrors host documents into owned proxies.
//!
//! The renderer is the single owner of the active scene, the "active" flag,
//! the entity registry, the backdrop layers and the weather layer. Hosts feed
//! it lifecycle events (`set_scene`, `upsert`, `remove`, `on_scene_updated`)
//! and completed texture loads (`asset_ready`); it answers with a paint list.
//!
//! Texture decodes never block. A load that comes back
//! [`TextureLoad::Pending`] leaves the proxy provisional and parks a
//! continuation keyed by its ticket. When the ticket fires the continuation
//! first checks that the proxy is still registered, so a document deleted
//! mid-load is never resurrected.

#[cfg(test)]
#[path = "renderer_test.rs"]
mod renderer_test;

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::consts::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_NOTE_ICON_SIZE, WHITE};
use crate::doc::{DocumentBody, DocumentDelta, DocumentId, DocumentKind, FillType, MirroredDocument, NoteFlags, SceneId};
use crate::error::RenderError;
use crate::host::{LoadTicket, NotePanel, Raster, RenderBackend, ShapeStyle, TextureLoad, Viewer};
use crate::layers::{ImageSlot, SceneLayers};
use crate::registry::Registry;
use crate::scene::{Scene, SceneDelta, SceneSnapshot};
use crate::shape::build_path;
use crate::sprite::{Sprite, TextLabel};
use crate::viewport::Point;
use crate::weather::{ActiveEffect, WeatherCatalog, WeatherLayer};

const NOTE_PANEL_COLOR: &str = "#000000";
const DEFAULT_STROKE_COLOR: &str = "#000000";

/// Per-element visibility toggles from the world configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowFlags {
    pub weather: bool,
    pub darkness: bool,
    pub drawings: bool,
    pub notes: bool,
    pub grid: bool,
}

impl Default for ShowFlags {
    fn default() -> Self {
        Self { weather: true, darkness: true, drawings: true, notes: true, grid: true }
    }
}

impl ShowFlags {
    /// Whether documents of `kind` are mirrored at all.
    #[must_use]
    pub fn mirrors(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Token | DocumentKind::Tile => true,
            DocumentKind::Drawing => self.drawings,
            DocumentKind::Note => self.notes,
        }
    }
}

/// Whether `viewer` may see a note with these flags.
#[must_use]
pub fn note_visible(viewer: &Viewer, flags: &NoteFlags) -> bool {
    viewer.is_gm || flags.show
}

/// What to redo when a deferred texture load completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingLoad {
    Document(DocumentId),
    Layer(ImageSlot),
}

/// One entry of the composited output, bottom first.
#[derive(Debug, Clone, Copy)]
pub enum PaintItem<'a> {
    /// Background color, background image, foreground or grid.
    Underlay(&'a Sprite),
    Document(DocumentId, &'a Sprite),
    Weather(&'a ActiveEffect),
    Darkness(&'a Sprite),
}

/// Mirrors the active scene.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    active: bool,
    scene: Option<Scene>,
    /// Latest snapshot of every document in the active scene, mirrored or not.
    documents: HashMap<DocumentId, MirroredDocument>,
    /// Snapshot order of `documents`.
    order: Vec<DocumentId>,
    show: ShowFlags,
    viewer: Viewer,
    catalog: WeatherCatalog,
    registry: Registry,
    layers: SceneLayers,
    weather: WeatherLayer,
    pending: HashMap<LoadTicket, PendingLoad>,
}

impl SceneRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    #[must_use]
    pub fn show(&self) -> ShowFlags {
        self.show
    }

    #[must_use]
    pub fn layers(&self) -> &SceneLayers {
        &self.layers
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherLayer {
        &self.weather
    }

    /// Number of live document proxies.
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.registry.len()
    }

    /// The live proxy for `id`, if any.
    pub fn proxy(&mut self, id: &DocumentId) -> Option<&Sprite> {
        self.registry.get(id)
    }

    /// Number of texture loads still in flight.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    pub fn set_weather_catalog(&mut self, catalog: WeatherCatalog) {
        self.catalog = catalog;
    }

    /// Start or stop mirroring. Starting with a scene set rebuilds it;
    /// stopping releases every proxy and layer.
    pub fn set_active<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, active: bool) {
        if active == self.active {
            return;
        }
        self.active = active;
        if active {
            self.initialize_scene(gfx);
        } else {
            self.teardown(gfx);
        }
    }

    /// Switch to a new scene. Every proxy of the previous scene is destroyed
    /// before any proxy of the new one is created.
    pub fn set_scene<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, snapshot: SceneSnapshot) {
        self.teardown(gfx);
        self.order = snapshot.documents.iter().map(|d| d.id).collect();
        self.documents = snapshot.documents.into_iter().map(|d| (d.id, d)).collect();
        self.scene = Some(snapshot.scene);
        if self.active {
            self.initialize_scene(gfx);
        }
    }

    /// Update the local viewer. Note visibility depends on it.
    pub fn set_viewer(&mut self, viewer: Viewer) {
        if viewer == self.viewer {
            return;
        }
        self.viewer = viewer;
        let notes: Vec<DocumentId> = self
            .order
            .iter()
            .filter(|id| self.documents.get(id).is_some_and(|d| d.kind() == DocumentKind::Note))
            .copied()
            .collect();
        for id in notes {
            self.refresh_transform(&id);
        }
    }

    /// Apply new show toggles, adding or dropping proxies and layers as needed.
    pub fn set_show<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, show: ShowFlags) {
        if show == self.show {
            return;
        }
        let previous = std::mem::replace(&mut self.show, show);
        if !self.active {
            return;
        }
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        self.layers.apply_show(gfx, scene, show);
        if previous.weather != show.weather {
            if show.weather {
                self.weather.initialize(gfx, &self.catalog, scene);
            } else {
                self.weather.clear(gfx);
            }
        }

        for kind in [DocumentKind::Drawing, DocumentKind::Note] {
            if previous.mirrors(kind) == show.mirrors(kind) {
                continue;
            }
            let ids: Vec<DocumentId> =
                self.order.iter().filter(|id| self.documents.get(id).is_some_and(|d| d.kind() == kind)).copied().collect();
            for id in ids {
                if show.mirrors(kind) {
                    self.reconcile_cached(gfx, &id);
                } else {
                    self.registry.remove(gfx, &id);
                }
            }
        }
        self.registry.resort();
    }

    /// Create or update the proxy for `doc`. `delta` lists only changed
    /// fields; `None` means a full refresh.
    ///
    /// Silently ignored unless mirroring is active, `doc` belongs to the
    /// active scene and its kind is shown.
    pub fn upsert<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, doc: &MirroredDocument, delta: Option<&DocumentDelta>) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        if doc.scene_id != scene.id {
            trace!(id = %doc.id, "document outside the mirrored scene");
            if self.documents.remove(&doc.id).is_some() {
                self.order.retain(|other| other != &doc.id);
            }
            if self.registry.remove(gfx, &doc.id) {
                self.registry.resort();
            }
            return;
        }
        if self.documents.insert(doc.id, doc.clone()).is_none() {
            self.order.push(doc.id);
        }
        if !self.active || !self.show.mirrors(doc.kind()) {
            trace!(id = %doc.id, "mirroring disabled for document");
            return;
        }
        if let Err(e) = self.reconcile(gfx, doc, delta) {
            warn!(error = %e, id = %doc.id, kind = ?doc.kind(), "document reconcile failed");
        }
        self.registry.resort();
    }

    /// Forget a deleted document. Unknown ids are a no-op.
    pub fn remove<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, id: &DocumentId) {
        if self.documents.remove(id).is_none() {
            return;
        }
        self.order.retain(|other| other != id);
        if self.registry.remove(gfx, id) {
            debug!(%id, "removed proxy");
            self.registry.resort();
        }
    }

    /// Apply a scene-level change, redrawing only what it touches.
    /// Updates for any scene other than the mirrored one are ignored.
    pub fn on_scene_updated<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, scene_id: SceneId, delta: &SceneDelta) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if scene.id != scene_id {
            trace!(%scene_id, "update for a scene that is not mirrored");
            return;
        }
        let grid_size_changed = delta.grid.as_ref().is_some_and(|g| g.size != scene.grid.size);
        delta.apply(scene);
        if !self.active {
            return;
        }

        for (slot, ticket) in self.layers.refresh(gfx, scene, Some(delta), self.show) {
            self.pending.insert(ticket, PendingLoad::Layer(slot));
        }
        if delta.weather.is_some() {
            if self.show.weather {
                self.weather.initialize(gfx, &self.catalog, scene);
            } else {
                self.weather.clear(gfx);
            }
        } else if delta.touches_dimensions() {
            self.weather.resize(scene.width, scene.height);
        }

        if grid_size_changed {
            let ids = self.order.clone();
            for id in ids {
                self.refresh_transform(&id);
            }
        }
    }

    /// A deferred texture load finished. Stale continuations are dropped.
    pub fn asset_ready<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, ticket: LoadTicket) {
        let Some(load) = self.pending.remove(&ticket) else {
            debug!(?ticket, "unknown load ticket");
            return;
        };
        if !self.active {
            return;
        }
        match load {
            PendingLoad::Document(id) => {
                if !self.registry.contains(&id) {
                    debug!(%id, "dropping continuation for removed proxy");
                    return;
                }
                self.reconcile_cached(gfx, &id);
                self.registry.resort();
            }
            PendingLoad::Layer(slot) => {
                let Some(scene) = self.scene.as_ref() else {
                    return;
                };
                match self.layers.draw_image(gfx, slot, scene) {
                    Ok(Some(ticket)) => {
                        self.pending.insert(ticket, PendingLoad::Layer(slot));
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, ?slot, "image layer failed"),
                }
            }
        }
    }

    /// The composited output, bottom first. Empty while inactive.
    #[must_use]
    pub fn paint_list(&self) -> Vec<PaintItem<'_>> {
        if !self.active || self.scene.is_none() {
            return Vec::new();
        }
        let visible = |s: &Sprite| s.renderable && !s.is_provisional();
        let mut out: Vec<PaintItem<'_>> =
            self.layers.underlays().into_iter().filter(|s| visible(*s)).map(PaintItem::Underlay).collect();
        out.extend(
            self.registry.painted().into_iter().filter(|(_, s)| visible(*s)).map(|(id, s)| PaintItem::Document(id, s)),
        );
        let mut effects: Vec<&ActiveEffect> = self.weather.effects().iter().collect();
        effects.sort_by_key(|e| e.z_index);
        out.extend(effects.into_iter().map(PaintItem::Weather));
        let darkness = self.layers.darkness();
        if visible(darkness) {
            out.push(PaintItem::Darkness(darkness));
        }
        out
    }

    // --- Internals ---

    fn teardown<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        self.registry.clear(gfx);
        self.pending.clear();
        self.weather.clear(gfx);
        self.layers.clear(gfx);
    }

    fn initialize_scene<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        if !self.active {
            return;
        }
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        info!(scene = %scene.id, name = %scene.name, documents = self.order.len(), "initializing mirrored scene");
        self.registry.clear(gfx);
        self.pending.clear();

        for (slot, ticket) in self.layers.draw_all(gfx, scene, self.show) {
            self.pending.insert(ticket, PendingLoad::Layer(slot));
        }
        if self.show.weather {
            self.weather.initialize(gfx, &self.catalog, scene);
        } else {
            self.weather.clear(gfx);
        }

        let ids = self.order.clone();
        for id in ids {
            let mirrored = self.documents.get(&id).is_some_and(|d| self.show.mirrors(d.kind()));
            if mirrored {
                self.reconcile_cached(gfx, &id);
            }
        }
        self.registry.resort();
    }

    /// Full refresh of a cached document, logging failures.
    fn reconcile_cached<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, id: &DocumentId) {
        let Some(doc) = self.documents.get(id).cloned() else {
            return;
        };
        if let Err(e) = self.reconcile(gfx, &doc, None) {
            warn!(error = %e, %id, kind = ?doc.kind(), "document reconcile failed");
        }
    }

    fn refresh_transform(&mut self, id: &DocumentId) {
        let (Some(scene), Some(doc)) = (self.scene.as_ref(), self.documents.get(id)) else {
            return;
        };
        if let Some(sprite) = self.registry.get_mut(id) {
            apply_transform(scene, &self.viewer, doc, sprite);
        }
    }

    fn reconcile<R: RenderBackend + ?Sized>(
        &mut self,
        gfx: &mut R,
        doc: &MirroredDocument,
        delta: Option<&DocumentDelta>,
    ) -> Result<(), RenderError> {
        let Some(scene) = self.scene.as_ref() else {
            return Ok(());
        };

        let created = if self.registry.contains(&doc.id) {
            self.registry.set_key(&doc.id, doc.sort_key());
            false
        } else {
            if let DocumentBody::Token(data) | DocumentBody::Tile(data) = &doc.body {
                if data.texture.src.as_deref().is_none_or(str::is_empty) {
                    trace!(id = %doc.id, "textured document without a source");
                    return Ok(());
                }
            }
            self.registry.add(gfx, doc.id, Sprite::centered(doc.display_name()), doc.sort_key());
            debug!(id = %doc.id, kind = ?doc.kind(), "created proxy");
            true
        };

        let Some(sprite) = self.registry.get_mut(&doc.id) else {
            return Ok(());
        };
        apply_transform(scene, &self.viewer, doc, sprite);

        let rebuild = created || sprite.is_provisional() || delta.is_none_or(|d| touches_visual(doc, d));
        if rebuild {
            if let Some(ticket) = build_visual(gfx, doc, sprite)? {
                debug!(id = %doc.id, ?ticket, "proxy waiting on texture");
                self.pending.insert(ticket, PendingLoad::Document(doc.id));
            }
        }
        Ok(())
    }
}

/// Whether `delta` changes the baked texture of `doc`'s proxy.
fn touches_visual(doc: &MirroredDocument, delta: &DocumentDelta) -> bool {
    match doc.kind() {
        DocumentKind::Token | DocumentKind::Tile => delta.touches_texture(),
        DocumentKind::Drawing => delta.touches_shape(),
        DocumentKind::Note => delta.touches_note_icon(),
    }
}

/// Load or rasterize the texture for `doc`. Returns a ticket if a source
/// image is still decoding; the sprite keeps its previous texture meanwhile.
fn build_visual<R: RenderBackend + ?Sized>(
    gfx: &mut R,
    doc: &MirroredDocument,
    sprite: &mut Sprite,
) -> Result<Option<LoadTicket>, RenderError> {
    match &doc.body {
        DocumentBody::Token(data) | DocumentBody::Tile(data) => {
            let Some(src) = data.texture.src.as_deref().filter(|s| !s.is_empty()) else {
                sprite.clear_texture(gfx);
                return Ok(None);
            };
            match gfx.load_texture(src)? {
                TextureLoad::Pending(ticket) => Ok(Some(ticket)),
                TextureLoad::Ready(texture) => {
                    if texture.video {
                        gfx.play_video(texture.id, true);
                    }
                    sprite.replace_texture(gfx, texture);
                    Ok(None)
                }
            }
        }
        DocumentBody::Drawing(data) => {
            let fill_texture = match (data.fill_type, data.texture.as_deref()) {
                (FillType::Pattern, Some(src)) if !src.is_empty() => match gfx.load_texture(src)? {
                    TextureLoad::Pending(ticket) => return Ok(Some(ticket)),
                    TextureLoad::Ready(texture) => Some(texture),
                },
                _ => None,
            };
            let raster = Raster::Shape {
                path: build_path(&data.shape),
                width: data.shape.width,
                height: data.shape.height,
                style: ShapeStyle {
                    stroke_width: data.stroke_width,
                    stroke_color: data.stroke_color.clone().unwrap_or_else(|| DEFAULT_STROKE_COLOR.to_owned()),
                    stroke_alpha: data.stroke_alpha,
                    fill_type: data.fill_type,
                    fill_color: data.fill_color.clone().unwrap_or_else(|| WHITE.to_owned()),
                    fill_alpha: data.fill_alpha,
                    fill_texture,
                },
            };
            let baked = gfx.rasterize(&raster);
            if let Some(pattern) = fill_texture {
                gfx.release_texture(pattern.id);
            }
            sprite.replace_texture(gfx, baked?);
            Ok(None)
        }
        DocumentBody::Note(data) => {
            let Some(src) = data.icon.as_deref().filter(|s| !s.is_empty()) else {
                sprite.clear_texture(gfx);
                return Ok(None);
            };
            let icon = match gfx.load_texture(src)? {
                TextureLoad::Pending(ticket) => return Ok(Some(ticket)),
                TextureLoad::Ready(texture) => texture,
            };
            let size = data.icon_size.unwrap_or(DEFAULT_NOTE_ICON_SIZE);
            let raster = Raster::Note {
                icon,
                size,
                tint: data.tint.clone().unwrap_or_else(|| WHITE.to_owned()),
                panel: data.flags.show_bg.then(|| NotePanel { color: NOTE_PANEL_COLOR.to_owned(), corner_radius: size / 4.0 }),
            };
            let baked = gfx.rasterize(&raster);
            gfx.release_texture(icon.id);
            sprite.replace_texture(gfx, baked?);
            Ok(None)
        }
    }
}

fn non_empty(text: Option<&String>) -> Option<&str> {
    text.map(String::as_str).filter(|t| !t.trim().is_empty())
}

/// Recompute position, size, rotation, opacity, tint, flip, visibility and
/// labels. Safe to repeat: the result depends only on the inputs.
fn apply_transform(scene: &Scene, viewer: &Viewer, doc: &MirroredDocument, sprite: &mut Sprite) {
    let (width, height, centered_origin) = match &doc.body {
        DocumentBody::Token(d) => {
            (d.width * scene.grid.size * d.texture.scale_x.abs(), d.height * scene.grid.size * d.texture.scale_y.abs(), false)
        }
        DocumentBody::Tile(d) => (d.width, d.height, false),
        DocumentBody::Drawing(d) => (d.shape.width, d.shape.height, false),
        DocumentBody::Note(d) => {
            let size = d.icon_size.unwrap_or(DEFAULT_NOTE_ICON_SIZE);
            (size, size, true)
        }
    };
    sprite.width = width;
    sprite.height = height;
    let (half_w, half_h) = if centered_origin { (0.0, 0.0) } else { (width / 2.0, height / 2.0) };
    sprite.x = doc.x - scene.scene_x + half_w;
    sprite.y = doc.y - scene.scene_y + half_h;
    sprite.rotation_deg = doc.rotation;
    sprite.alpha = doc.alpha.unwrap_or(1.0);

    match &doc.body {
        DocumentBody::Token(d) | DocumentBody::Tile(d) => {
            sprite.tint = d.texture.tint.clone().unwrap_or_else(|| WHITE.to_owned());
            sprite.apply_scale_sign(d.texture.scale_x, d.texture.scale_y);
            sprite.renderable = !doc.hidden;
        }
        DocumentBody::Drawing(d) => {
            sprite.tint = WHITE.to_owned();
            sprite.renderable = !doc.hidden;
            match non_empty(d.text.as_ref()) {
                Some(text) => sprite.set_label(TextLabel {
                    text: text.to_owned(),
                    font_family: d.font_family.clone().unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_owned()),
                    font_size: d.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                    color: d.text_color.clone().unwrap_or_else(|| WHITE.to_owned()),
                    word_wrap_width: Some(d.shape.width),
                    anchor: Point::new(0.5, 0.5),
                    offset: Point::new(0.0, 0.0),
                    renderable: true,
                }),
                None => sprite.remove_label(),
            }
        }
        DocumentBody::Note(d) => {
            sprite.tint = WHITE.to_owned();
            sprite.renderable = note_visible(viewer, &d.flags);
            match non_empty(d.text.as_ref()) {
                Some(text) => sprite.set_label(TextLabel {
                    text: text.to_owned(),
                    font_family: d.font_family.clone().unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_owned()),
                    font_size: d.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                    color: d.text_color.clone().unwrap_or_else(|| WHITE.to_owned()),
                    word_wrap_width: None,
                    anchor: Point::new(0.5, 0.0),
                    offset: Point::new(0.0, height / 2.0),
                    renderable: d.flags.show_label,
                }),
                None => sprite.remove_label(),
            }
        }
    }
}
