//! Top-level compositor: one minimap widget on one client.
//!
//! [`Minimap`] owns the frame, the viewport, the scene mirror, the static
//! image and the marker layer. The host drives it with settings changes,
//! document events, pointer input and sync messages. Anything that must
//! leave the widget (setting writes, dialogs, toasts) comes back as
//! [`Action`]s for the host to perform; view persistence and sync sends go
//! straight through the injected [`Host`].

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::doc::{DocumentDelta, DocumentId, MirroredDocument, SceneId};
use crate::error::{MinimapError, SyncError};
use crate::frame::{Frame, Slice};
use crate::host::{Host, LoadTicket, RenderBackend, TextureLoad, Viewer};
use crate::input::{Button, DragMode, DragTracker, PointerEvent, WheelEvent};
use crate::markers::{replaced, without, MapMarker, MarkerLayer};
use crate::menu::{self, ContextMenu, MenuCommand, MenuContext};
use crate::renderer::{PaintItem, SceneRenderer};
use crate::scene::{SceneDelta, SceneSnapshot};
use crate::settings::{effective_settings, MapMode, MinimapSettings};
use crate::sprite::Sprite;
use crate::sync::{broadcast, recipients, Audience, SocketMessage};
use crate::viewport::{Point, ViewState, Viewport};
use crate::weather::WeatherCatalog;

/// World setting keys written through [`Action::SaveSetting`].
pub const SETTING_SHOW: &str = "show";
pub const SETTING_MARKERS: &str = "markers";
pub const SETTING_LOCK_GM_VIEW: &str = "lockGMView";

/// A question the host must put to the user before the minimap proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    RemoveMarker(String),
    ClearMarkers,
}

/// Work the host performs on the widget's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write a world setting. The host feeds the result back through
    /// [`Minimap::apply_settings`].
    SaveSetting { key: &'static str, value: Value },
    /// Render this context menu; report the choice with [`Minimap::run_command`].
    ShowMenu(ContextMenu),
    /// Open the world settings sheet on the minimap tab.
    OpenSettings,
    /// Open the marker dialog; report the result with [`Minimap::submit_marker`].
    EditMarker { marker: MapMarker, is_new: bool },
    /// Ask the user; on yes call [`Minimap::confirm`].
    Confirm(Confirmation),
    /// Show a localized error toast.
    Notify { key: String, message: String },
    /// Hand over a snapshot of this scene through [`Minimap::set_scene`];
    /// `None` means the scene the user is viewing.
    LoadScene(Option<SceneId>),
}

impl Action {
    fn notify(err: &MinimapError) -> Self {
        Self::Notify { key: err.localization_key(), message: err.to_string() }
    }
}

/// Everything the host needs to draw one frame of the widget.
#[derive(Debug)]
pub struct MinimapPaint<'a> {
    /// Top-left corner of the frame on screen.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub background_color: &'a str,
    pub mask: &'a Sprite,
    /// Transform applied to `image`, `scene` and `markers`.
    pub view: ViewState,
    pub image: Option<&'a Sprite>,
    pub scene: Vec<PaintItem<'a>>,
    pub markers: Vec<(&'a MapMarker, &'a Sprite)>,
    pub overlay: &'a Sprite,
    pub overlay_slices: Vec<Slice>,
}

/// The minimap widget.
#[derive(Debug)]
pub struct Minimap {
    settings: MinimapSettings,
    viewport: Viewport,
    renderer: SceneRenderer,
    markers: MarkerLayer,
    frame: Frame,
    drag: DragTracker,
    image: Sprite,
    image_src: String,
    image_ticket: Option<LoadTicket>,
    has_scene: bool,
}

impl Default for Minimap {
    fn default() -> Self {
        Self::new()
    }
}

impl Minimap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: MinimapSettings::default(),
            viewport: Viewport::new(),
            renderer: SceneRenderer::new(),
            markers: MarkerLayer::new(),
            frame: Frame::new(),
            drag: DragTracker::default(),
            image: Sprite::new("Static Image Sprite"),
            image_src: String::new(),
            image_ticket: None,
            has_scene: false,
        }
    }

    /// Effective settings currently applied.
    #[must_use]
    pub fn settings(&self) -> &MinimapSettings {
        &self.settings
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    #[must_use]
    pub fn image(&self) -> &Sprite {
        &self.image
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.settings.show
    }

    #[must_use]
    pub fn drag_mode(&self) -> DragMode {
        self.drag.mode()
    }

    pub fn set_weather_catalog(&mut self, catalog: WeatherCatalog) {
        self.renderer.set_weather_catalog(catalog);
    }

    // --- Lifecycle ---

    /// Apply settings, load the scene and restore this client's last view.
    /// Returns [`Action::LoadScene`] if a configured scene differs from `scene`.
    ///
    /// # Errors
    ///
    /// Returns [`MinimapError::Config`] if the scene override is malformed.
    pub fn start<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        world: &MinimapSettings,
        scene_flags: Option<&Value>,
        scene: Option<SceneSnapshot>,
    ) -> Result<Vec<Action>, MinimapError> {
        let mut actions = self.apply_settings(host, world, scene_flags)?;
        let wanted = self.settings.scene_id();
        if scene.as_ref().is_some_and(|s| wanted.is_some_and(|id| id == s.scene.id)) {
            actions.retain(|a| !matches!(a, Action::LoadScene(_)));
        }
        self.set_scene(host, scene);
        self.restore_view(host);
        Ok(actions)
    }

    /// Re-apply world settings, merged with the viewed scene's override
    /// flags. Called on start-up and after every settings write.
    ///
    /// A change of the configured scene asks the host for that scene with
    /// [`Action::LoadScene`]; the old mirror is dropped until it arrives.
    ///
    /// # Errors
    ///
    /// Returns [`MinimapError::Config`] if the scene override is malformed;
    /// the previous settings stay in force.
    pub fn apply_settings<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        world: &MinimapSettings,
        scene_flags: Option<&Value>,
    ) -> Result<Vec<Action>, MinimapError> {
        let settings = effective_settings(world, scene_flags)?;
        let mut actions = Vec::new();
        if settings.scene != self.settings.scene {
            let wanted = settings.scene_id();
            let mirrored = self.renderer.scene().map(|s| s.id);
            if wanted.is_some() && wanted != mirrored {
                self.has_scene = false;
            }
            info!(scene = %settings.scene, "mirrored scene changed");
            actions.push(Action::LoadScene(wanted));
        }

        self.frame.configure(host, &settings);
        self.frame.layout(host.screen_bounds());
        self.viewport.set_zoom_step(settings.zoom_step);
        self.renderer.set_viewer(host.viewer());
        self.renderer.set_show(host, settings.show_flags());

        if settings.image != self.image_src {
            self.image_src.clone_from(&settings.image);
            self.load_image(host);
        }
        if settings.markers.as_slice() != self.markers.markers() {
            self.markers.set_markers(host, settings.markers.clone());
        }

        let mode_changed = settings.mode != self.settings.mode;
        self.settings = settings;
        self.sync_activation(host);
        if mode_changed {
            info!(mode = ?self.settings.mode, "minimap mode changed");
        }
        Ok(actions)
    }

    /// Mirror `scene`, or nothing. While a scene is configured, snapshots
    /// of any other scene are ignored.
    pub fn set_scene<H: Host + ?Sized>(&mut self, host: &mut H, scene: Option<SceneSnapshot>) {
        match scene {
            Some(snapshot) if self.settings.scene_id().is_some_and(|id| id != snapshot.scene.id) => {
                debug!(scene = %snapshot.scene.id, wanted = %self.settings.scene, "snapshot is not the configured scene");
                return;
            }
            Some(snapshot) => {
                self.has_scene = true;
                self.renderer.set_scene(host, snapshot);
            }
            None => self.has_scene = false,
        }
        self.sync_activation(host);
    }

    fn sync_activation<H: Host + ?Sized>(&mut self, host: &mut H) {
        let active = self.settings.mode == MapMode::Scene && self.has_scene;
        self.renderer.set_active(host, active);
    }

    /// Restore the view this client persisted last. Returns whether it changed.
    pub fn restore_view<H: Host + ?Sized>(&mut self, host: &H) -> bool {
        let Some(view) = host.load_view() else {
            return false;
        };
        self.viewport.set_view(view)
    }

    /// Re-pin the frame after the host's UI moved or the window resized.
    pub fn layout<H: Host + ?Sized>(&mut self, host: &H) -> Point {
        self.frame.layout(host.screen_bounds())
    }

    fn load_image<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        self.image_ticket = None;
        if self.image_src.is_empty() {
            self.image.clear_texture(gfx);
            return;
        }
        match gfx.load_texture(&self.image_src) {
            Ok(TextureLoad::Ready(texture)) => {
                if texture.video {
                    gfx.play_video(texture.id, true);
                }
                self.image.replace_texture(gfx, texture);
                self.image.width = texture.width;
                self.image.height = texture.height;
            }
            Ok(TextureLoad::Pending(ticket)) => self.image_ticket = Some(ticket),
            Err(e) => warn!(error = %e, src = %self.image_src, "map image unavailable"),
        }
    }

    // --- Host document events ---

    pub fn upsert_document<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        doc: &MirroredDocument,
        delta: Option<&DocumentDelta>,
    ) {
        self.renderer.upsert(host, doc, delta);
    }

    pub fn remove_document<H: Host + ?Sized>(&mut self, host: &mut H, id: &DocumentId) {
        self.renderer.remove(host, id);
    }

    /// A scene changed. Only the mirrored scene's changes are applied.
    pub fn update_scene<H: Host + ?Sized>(&mut self, host: &mut H, scene_id: SceneId, delta: &SceneDelta) {
        self.renderer.on_scene_updated(host, scene_id, delta);
    }

    /// Route a finished texture load to whichever part is waiting for it.
    pub fn asset_ready<H: Host + ?Sized>(&mut self, host: &mut H, ticket: LoadTicket) {
        if self.image_ticket == Some(ticket) {
            self.load_image(host);
        }
        self.frame.asset_ready(host, ticket);
        self.markers.asset_ready(host, ticket);
        self.renderer.asset_ready(host, ticket);
    }

    // --- View ---

    /// Natural size of what is shown: the image in image mode, the scene
    /// in scene mode.
    #[must_use]
    pub fn content_size(&self) -> (f64, f64) {
        match self.settings.mode {
            MapMode::Image => self.image.texture().map_or((0.0, 0.0), |t| (t.width, t.height)),
            MapMode::Scene => match self.renderer.scene() {
                Some(scene) if self.has_scene => (scene.width, scene.height),
                _ => (0.0, 0.0),
            },
        }
    }

    /// Reset pan and shrink the zoom so the content fits the frame.
    pub fn fit<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<Action> {
        let (w, h) = self.content_size();
        let changed = self.viewport.fit_to_content(w, h, self.frame.width(), self.frame.height());
        let mut actions = if changed { self.persist_view(host) } else { Vec::new() };
        actions.extend(self.follow_if_locked(host));
        actions
    }

    /// Set the view programmatically, as local input would.
    pub fn set_view<H: Host + ?Sized>(&mut self, host: &mut H, view: ViewState) -> Vec<Action> {
        if !self.viewport.set_view(view) {
            return Vec::new();
        }
        let mut actions = self.persist_view(host);
        actions.extend(self.follow_if_locked(host));
        actions
    }

    fn persist_view<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<Action> {
        match host.save_view(self.viewport.view()) {
            Ok(()) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to persist view");
                vec![Action::notify(&MinimapError::from(e))]
            }
        }
    }

    /// While the GM view is locked, push the GM's view to everyone else.
    fn follow_if_locked<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<Action> {
        if !self.settings.broadcasts_view(&host.viewer()) {
            return Vec::new();
        }
        match self.broadcast_view(host, Audience::Others) {
            Ok(()) => Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to broadcast locked view");
                vec![Action::notify(&MinimapError::from(e))]
            }
        }
    }

    fn broadcast_view<H: Host + ?Sized>(&self, host: &mut H, audience: Audience) -> Result<(), SyncError> {
        let viewer = host.viewer();
        let users = recipients(host.active_users(), &viewer.user_id, audience);
        let message = SocketMessage::sync(viewer.user_id, users, self.viewport.view());
        broadcast(host, &message)
    }

    /// Push the current view to every active user. GM only; others are ignored.
    ///
    /// # Errors
    ///
    /// Fails fast with [`SyncError::TransportNotInitialized`] before the
    /// channel is ready, or with the transport's error.
    pub fn synchronize<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<(), MinimapError> {
        if !host.viewer().is_gm {
            return Ok(());
        }
        self.broadcast_view(host, Audience::Everyone)?;
        Ok(())
    }

    /// Handle a payload from the sync channel. Returns whether the view changed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] for payloads that are not sync messages.
    pub fn receive_message<H: Host + ?Sized>(&mut self, host: &mut H, payload: Value) -> Result<bool, MinimapError> {
        let message = SocketMessage::decode(payload)?;
        let user = host.viewer().user_id;
        let Some(view) = message.view_for(&user) else {
            debug!(id = %message.id, "sync not addressed to this client");
            return Ok(false);
        };
        if !self.viewport.set_view(view) {
            return Ok(false);
        }
        debug!(id = %message.id, sender = %message.sender, "applied synced view");
        if let Err(e) = host.save_view(self.viewport.view()) {
            warn!(error = %e, "failed to persist synced view");
        }
        Ok(true)
    }

    // --- Pointer input ---

    fn content_point(&self, screen: Point) -> Point {
        self.viewport.frame_to_content(self.frame.to_local(screen))
    }

    fn hit(&self, screen: Point) -> bool {
        self.is_visible() && self.frame.contains_screen(screen)
    }

    pub fn pointer_down<H: Host + ?Sized>(&mut self, host: &mut H, event: PointerEvent) -> Vec<Action> {
        if !self.hit(event.position) {
            return Vec::new();
        }
        match event.button {
            Button::Primary => {
                let viewer = host.viewer();
                let content = self.content_point(event.position);
                if viewer.is_gm {
                    let marker = self.markers.hit_test(content).map(|m| m.id.clone());
                    if let Some(id) = marker {
                        if self.markers.begin_drag(&id) {
                            self.drag.start(DragMode::Marker);
                        }
                        return Vec::new();
                    }
                }
                if self.settings.can_navigate(&viewer) {
                    self.drag.start(DragMode::Pan);
                }
                Vec::new()
            }
            Button::Secondary => self.open_menu(host, event.position),
            Button::Other(_) => Vec::new(),
        }
    }

    pub fn pointer_move<H: Host + ?Sized>(&mut self, host: &mut H, event: PointerEvent) -> Vec<Action> {
        let content = self.content_point(event.position);
        let hovering = self.hit(event.position).then_some(content);
        self.markers.hover(hovering, self.viewport.zoom());

        match self.drag.mode() {
            DragMode::Pan => {
                if self.viewport.pan_by(event.movement.x, event.movement.y) {
                    let mut actions = self.persist_view(host);
                    actions.extend(self.follow_if_locked(host));
                    return actions;
                }
            }
            DragMode::Marker => {
                if host.viewer().is_gm {
                    self.markers.drag_to(content);
                }
            }
            DragMode::None => {}
        }
        Vec::new()
    }

    /// End any drag. A marker drop persists the moved marker.
    pub fn pointer_up(&mut self) -> Vec<Action> {
        match self.drag.finish() {
            DragMode::Marker => self.markers.end_drag().map_or_else(Vec::new, |list| save_markers(&list)),
            DragMode::Pan | DragMode::None => Vec::new(),
        }
    }

    /// Zoom one notch about the pointer.
    pub fn wheel<H: Host + ?Sized>(&mut self, host: &mut H, event: WheelEvent) -> Vec<Action> {
        if !self.hit(event.position) || !self.settings.can_navigate(&host.viewer()) {
            return Vec::new();
        }
        let anchor = self.frame.to_local(event.position);
        if !self.viewport.wheel(anchor, event.delta_y) {
            return Vec::new();
        }
        let mut actions = self.persist_view(host);
        actions.extend(self.follow_if_locked(host));
        actions
    }

    // --- Context menu ---

    /// Build the context menu for a right-click at `screen`.
    ///
    /// # Errors
    ///
    /// Returns [`MinimapError::ResourceNotFound`] if the host cannot mount a menu.
    pub fn context_menu<H: Host + ?Sized>(&self, host: &H, screen: Point) -> Result<Option<ContextMenu>, MinimapError> {
        let viewer = host.viewer();
        let content = self.content_point(screen);
        let hovered = self.markers.hit_test(content).map(|m| m.id.as_str());
        let ctx = MenuContext {
            viewer: &viewer,
            hovered_marker: hovered,
            marker_count: self.markers.markers().len(),
            can_navigate: self.settings.can_navigate(&viewer),
            lock_gm_view: self.settings.lock_gm_view,
            content_point: Point::new(content.x.round(), content.y.round()),
        };
        menu::open(&ctx, screen, host.menu_mount_available())
    }

    fn open_menu<H: Host + ?Sized>(&self, host: &H, screen: Point) -> Vec<Action> {
        match self.context_menu(host, screen) {
            Ok(Some(menu)) => vec![Action::ShowMenu(menu)],
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, code = %e.localization_key(), "context menu unavailable");
                Vec::new()
            }
        }
    }

    /// Carry out a chosen menu entry.
    pub fn run_command<H: Host + ?Sized>(&mut self, host: &mut H, command: MenuCommand) -> Vec<Action> {
        let viewer = host.viewer();
        if !self.permits(&viewer, &command) {
            debug!(?command, user = %viewer.user_id, "menu command not permitted");
            return Vec::new();
        }
        match command {
            MenuCommand::OpenSettings => vec![Action::OpenSettings],
            MenuCommand::AddMarker(point) => vec![Action::EditMarker { marker: MapMarker::at(point), is_new: true }],
            MenuCommand::EditMarker(id) => self
                .markers
                .markers()
                .iter()
                .find(|m| m.id == id)
                .map(|m| vec![Action::EditMarker { marker: m.clone(), is_new: false }])
                .unwrap_or_default(),
            MenuCommand::RemoveMarker(id) => vec![Action::Confirm(Confirmation::RemoveMarker(id))],
            MenuCommand::ClearMarkers if self.markers.markers().is_empty() => Vec::new(),
            MenuCommand::ClearMarkers => vec![Action::Confirm(Confirmation::ClearMarkers)],
            MenuCommand::Fit => self.fit(host),
            MenuCommand::Synchronize => match self.synchronize(host) {
                Ok(()) => Vec::new(),
                Err(e) => {
                    error!(error = %e, "manual synchronize failed");
                    vec![Action::notify(&e)]
                }
            },
            MenuCommand::LockGmView => vec![save_bool(SETTING_LOCK_GM_VIEW, true)],
            MenuCommand::UnlockGmView => vec![save_bool(SETTING_LOCK_GM_VIEW, false)],
            MenuCommand::Hide => vec![save_bool(SETTING_SHOW, false)],
        }
    }

    fn permits(&self, viewer: &Viewer, command: &MenuCommand) -> bool {
        match command {
            MenuCommand::OpenSettings | MenuCommand::Hide => viewer.can_modify_settings,
            MenuCommand::Fit => self.settings.can_navigate(viewer),
            MenuCommand::AddMarker(_)
            | MenuCommand::EditMarker(_)
            | MenuCommand::RemoveMarker(_)
            | MenuCommand::ClearMarkers
            | MenuCommand::Synchronize
            | MenuCommand::LockGmView
            | MenuCommand::UnlockGmView => viewer.is_gm,
        }
    }

    /// The marker dialog was submitted.
    #[must_use]
    pub fn submit_marker(&self, marker: MapMarker, is_new: bool) -> Vec<Action> {
        let current = self.markers.markers();
        let next = if is_new {
            let mut next = current.to_vec();
            next.push(marker);
            Some(next)
        } else {
            replaced(current, marker)
        };
        next.map_or_else(Vec::new, |list| save_markers(&list))
    }

    /// The user confirmed a destructive marker action.
    #[must_use]
    pub fn confirm(&self, confirmation: Confirmation) -> Vec<Action> {
        let current = self.markers.markers();
        match confirmation {
            Confirmation::RemoveMarker(id) => without(current, &id).map_or_else(Vec::new, |list| save_markers(&list)),
            Confirmation::ClearMarkers if current.is_empty() => Vec::new(),
            Confirmation::ClearMarkers => save_markers(&[]),
        }
    }

    /// Flip the `show` world setting.
    #[must_use]
    pub fn toggle_visible(&self) -> Vec<Action> {
        vec![save_bool(SETTING_SHOW, !self.settings.show)]
    }

    // --- Output ---

    /// What to draw, or `None` while the widget is hidden.
    #[must_use]
    pub fn paint(&self) -> Option<MinimapPaint<'_>> {
        if !self.is_visible() {
            return None;
        }
        let image_shown = self.settings.mode == MapMode::Image && !self.image.is_provisional();
        Some(MinimapPaint {
            origin: self.frame.origin(),
            width: self.frame.width(),
            height: self.frame.height(),
            background_color: &self.settings.bg_color,
            mask: self.frame.mask(),
            view: self.viewport.view(),
            image: image_shown.then_some(&self.image),
            scene: self.renderer.paint_list(),
            markers: self.markers.painted(),
            overlay: self.frame.overlay(),
            overlay_slices: self.frame.overlay_slices(),
        })
    }
}

fn save_bool(key: &'static str, value: bool) -> Action {
    Action::SaveSetting { key, value: Value::Bool(value) }
}

fn save_markers(markers: &[MapMarker]) -> Vec<Action> {
    save_setting(SETTING_MARKERS, markers)
}

fn save_setting<T: Serialize + ?Sized>(key: &'static str, value: &T) -> Vec<Action> {
    match serde_json::to_value(value) {
        Ok(value) => vec![Action::SaveSetting { key, value }],
        Err(e) => {
            warn!(error = %e, key, "failed to encode setting");
            let err = MinimapError::from(crate::error::ConfigError::from(e));
            vec![Action::notify(&err)]
        }
    }
}
