//! Persisted world configuration and per-scene overrides.
//!
//! Settings are camelCase JSON with every field defaulted, so partial or
//! older payloads still load. A scene may carry an override object; when its
//! `override` flag is set it is deep-merged over the world settings.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::consts::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_ZOOM_STEP};
use crate::doc::SceneId;
use crate::error::ConfigError;
use crate::host::Viewer;
use crate::markers::MapMarker;
use crate::renderer::ShowFlags;
use crate::viewport::clamp_zoom_step;

/// Screen corner the widget is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapPosition {
    BottomLeft,
    #[default]
    BottomRight,
    TopLeft,
    TopRight,
}

/// Outline of the widget frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapShape {
    #[default]
    Rectangle,
    Circle,
    Diamond,
    /// Alpha of a user-provided image.
    Mask,
}

/// What the widget shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    /// A static image.
    #[default]
    Image,
    /// A live mirror of a scene.
    Scene,
}

/// Nine-slice border drawn over the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub visible: bool,
    pub file: String,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinimapSettings {
    pub show: bool,
    pub position: MapPosition,
    pub shape: MapShape,
    /// Mask image for [`MapShape::Mask`].
    pub mask: String,
    pub width: f64,
    pub height: f64,
    pub mode: MapMode,
    /// Image shown in [`MapMode::Image`].
    pub image: String,
    /// Scene id mirrored in [`MapMode::Scene`]; empty means the viewed scene.
    pub scene: String,
    pub bg_color: String,
    pub pad_x: f64,
    pub pad_y: f64,
    pub show_weather: bool,
    pub show_darkness: bool,
    pub show_drawings: bool,
    pub show_notes: bool,
    pub show_grid: bool,
    /// Let players pan and zoom.
    pub unlock_players: bool,
    /// Force every client to follow the GM's view.
    #[serde(rename = "lockGMView")]
    pub lock_gm_view: bool,
    pub zoom_step: f64,
    pub overlay_settings: OverlaySettings,
    pub markers: Vec<MapMarker>,
}

impl Default for MinimapSettings {
    fn default() -> Self {
        Self {
            show: false,
            position: MapPosition::default(),
            shape: MapShape::default(),
            mask: String::new(),
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            mode: MapMode::default(),
            image: String::new(),
            scene: String::new(),
            bg_color: "#000000".into(),
            pad_x: 0.0,
            pad_y: 0.0,
            show_weather: true,
            show_darkness: true,
            show_drawings: true,
            show_notes: true,
            show_grid: true,
            unlock_players: false,
            lock_gm_view: false,
            zoom_step: DEFAULT_ZOOM_STEP,
            overlay_settings: OverlaySettings::default(),
            markers: Vec::new(),
        }
    }
}

impl MinimapSettings {
    /// Parse persisted settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a present field has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let mut settings: Self = serde_json::from_value(value)?;
        settings.zoom_step = clamp_zoom_step(settings.zoom_step);
        Ok(settings)
    }

    /// Per-element visibility toggles for the renderer.
    /// The configured scene, or `None` to follow the viewed scene. An id
    /// that does not parse is treated as unset.
    #[must_use]
    pub fn scene_id(&self) -> Option<SceneId> {
        if self.scene.is_empty() {
            return None;
        }
        match Uuid::parse_str(&self.scene) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, scene = %self.scene, "configured scene id is not a uuid");
                None
            }
        }
    }

    pub fn show_flags(&self) -> ShowFlags {
        ShowFlags {
            weather: self.show_weather,
            darkness: self.show_darkness,
            drawings: self.show_drawings,
            notes: self.show_notes,
            grid: self.show_grid,
        }
    }

    /// Whether `viewer` may pan and zoom the widget.
    ///
    /// With the GM view locked only the GM may; otherwise players need the
    /// world unlock or settings-modification rights.
    #[must_use]
    pub fn can_navigate(&self, viewer: &Viewer) -> bool {
        if self.lock_gm_view {
            viewer.is_gm
        } else {
            viewer.is_gm || viewer.can_modify_settings || self.unlock_players
        }
    }

    /// Whether `viewer`'s view changes are pushed to every other client.
    #[must_use]
    pub fn broadcasts_view(&self, viewer: &Viewer) -> bool {
        self.lock_gm_view && viewer.is_gm
    }
}

/// Recursively merge `patch` into `base`. Objects merge key by key; any other
/// value replaces what was there.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Settings in force for a scene: the world settings, or the scene's
/// override merged over them when the override is enabled.
///
/// # Errors
///
/// Returns [`ConfigError::NotAnObject`] if the override is not a JSON object,
/// or [`ConfigError::Invalid`] if the merged result does not parse.
pub fn effective_settings(world: &MinimapSettings, scene_override: Option<&Value>) -> Result<MinimapSettings, ConfigError> {
    let Some(flags) = scene_override else {
        return Ok(world.clone());
    };
    let Value::Object(map) = flags else {
        return Err(ConfigError::NotAnObject);
    };
    if map.get("override").and_then(Value::as_bool) != Some(true) {
        return Ok(world.clone());
    }
    let mut patch = map.clone();
    patch.remove("override");

    let mut merged = serde_json::to_value(world)?;
    deep_merge(&mut merged, &Value::Object(patch));
    MinimapSettings::from_value(merged)
}
