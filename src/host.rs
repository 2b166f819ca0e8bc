//! Host boundary: everything the minimap consumes from the embedding
//! application, expressed as traits so the core runs without a live host.
//!
//! | Trait | Concern |
//! |-------|---------|
//! | [`RenderBackend`] | Textures, rasterization, weather effects |
//! | [`MessageBus`] | Cross-client publish/subscribe channel |
//! | [`ClientStore`] | Per-client persisted view |
//! | [`Session`] | Current user, privileges, connected users, UI surfaces |
//!
//! [`Host`] is blanket-implemented for any type providing all four.

use serde::{Deserialize, Serialize};

use crate::doc::FillType;
use crate::error::{RenderError, StorageError, SyncError};
use crate::frame::ScreenBounds;
use crate::scene::GridSettings;
use crate::shape::ShapePath;
use crate::viewport::ViewState;
use crate::weather::EffectDefinition;

/// Backend handle for a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// A decoded texture and its natural size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub width: f64,
    pub height: f64,
    /// Video textures must be started and looped by the caller.
    pub video: bool,
}

/// Ticket identifying an in-flight texture decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

/// Result of asking the backend for a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureLoad {
    /// Decoded and ready.
    Ready(Texture),
    /// Still decoding; the host calls back with this ticket when done.
    Pending(LoadTicket),
}

/// Backend handle for a running weather effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

/// Stroke and fill of a rasterized drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub stroke_width: f64,
    pub stroke_color: String,
    pub stroke_alpha: f64,
    pub fill_type: FillType,
    pub fill_color: String,
    pub fill_alpha: f64,
    /// Pattern texture for [`FillType::Pattern`].
    pub fill_texture: Option<Texture>,
}

/// Rounded background panel drawn behind a note icon.
#[derive(Debug, Clone, PartialEq)]
pub struct NotePanel {
    pub color: String,
    pub corner_radius: f64,
}

/// Frame mask geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    Rectangle,
    Circle,
    Diamond,
}

/// A request to bake vector content into a texture.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// Solid color rectangle (scene background color, darkness overlay).
    SolidRect { color: String, width: f64, height: f64 },
    /// A drawing outline with its style.
    Shape { path: ShapePath, width: f64, height: f64, style: ShapeStyle },
    /// A note: optional panel plus a tinted icon.
    Note { icon: Texture, size: f64, tint: String, panel: Option<NotePanel> },
    /// Grid lines covering the scene.
    Grid { grid: GridSettings, width: f64, height: f64 },
    /// White-on-transparent frame mask.
    Mask { shape: MaskShape, width: f64, height: f64 },
}

/// Textures, rasterization and effects provided by the host renderer.
pub trait RenderBackend {
    /// Resolve a texture by source path, possibly asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TextureUnavailable`] if the source cannot be resolved at all.
    fn load_texture(&mut self, src: &str) -> Result<TextureLoad, RenderError>;

    /// Bake vector content into a new texture.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Rasterize`] if the backend cannot draw the content.
    fn rasterize(&mut self, raster: &Raster) -> Result<Texture, RenderError>;

    /// Free a texture. Called exactly once per texture the minimap owns.
    fn release_texture(&mut self, id: TextureId);

    /// Start playback of a video texture.
    fn play_video(&mut self, id: TextureId, looped: bool);

    /// Instantiate a weather effect sized to `width` × `height`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Effect`] if the effect cannot be constructed.
    fn create_effect(&mut self, def: &EffectDefinition, width: f64, height: f64) -> Result<EffectId, RenderError>;

    /// Start an effect's animation loop.
    fn play_effect(&mut self, id: EffectId);

    /// Stop and free an effect.
    fn destroy_effect(&mut self, id: EffectId);

    /// Current rendering performance tier (0 = lowest).
    fn performance_mode(&self) -> u8;
}

/// Host publish/subscribe channel.
pub trait MessageBus {
    /// Whether the channel can be used yet.
    fn is_ready(&self) -> bool;

    /// Publish a JSON payload on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the transport rejects the message.
    fn emit(&mut self, channel: &str, payload: serde_json::Value) -> Result<(), SyncError>;
}

/// Per-client persisted state.
pub trait ClientStore {
    /// Last saved view, if any.
    fn load_view(&self) -> Option<ViewState>;

    /// Persist the current view.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    fn save_view(&mut self, view: ViewState) -> Result<(), StorageError>;
}

/// Identity and privileges of the local user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Viewer {
    pub user_id: String,
    /// The user is a game master.
    pub is_gm: bool,
    /// The user may modify world settings.
    pub can_modify_settings: bool,
}

/// Session and UI-surface queries answered by the host.
pub trait Session {
    /// The local user.
    fn viewer(&self) -> Viewer;

    /// Ids of all currently connected users, including the local one.
    fn active_users(&self) -> Vec<String>;

    /// Screen area not covered by the host's own UI.
    fn screen_bounds(&self) -> ScreenBounds;

    /// Whether the element the context menu mounts on exists.
    fn menu_mount_available(&self) -> bool;
}

/// Everything the minimap needs from its host.
pub trait Host: RenderBackend + MessageBus + ClientStore + Session {}

impl<T: RenderBackend + MessageBus + ClientStore + Session> Host for T {}
