//! Scene-level render state: dimensions, backdrop, darkness, weather, grid.
//!
//! All of it is a read-only snapshot of the host scene. The minimap never
//! writes scene properties back.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};

use crate::doc::{MirroredDocument, SceneId};

/// Grid geometry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridKind {
    Gridless,
    #[default]
    Square,
    HexOddR,
    HexEvenR,
    HexOddQ,
    HexEvenQ,
}

/// Grid appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridSettings {
    #[serde(rename = "type")]
    pub kind: GridKind,
    /// Grid cell size in pixels; also the token grid unit.
    pub size: f64,
    pub color: String,
    pub alpha: f64,
    pub thickness: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { kind: GridKind::Square, size: 100.0, color: "#000000".into(), alpha: 0.2, thickness: 1.0 }
    }
}

/// Scene properties the minimap renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub name: String,
    /// Scene content width in pixels.
    pub width: f64,
    /// Scene content height in pixels.
    pub height: f64,
    /// Horizontal offset of the scene rectangle inside the padded canvas.
    #[serde(default)]
    pub scene_x: f64,
    /// Vertical offset of the scene rectangle inside the padded canvas.
    #[serde(default)]
    pub scene_y: f64,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub background_src: Option<String>,
    #[serde(default)]
    pub foreground: Option<String>,
    /// Ambient darkness in `0..=1`.
    #[serde(default)]
    pub darkness_level: f64,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub grid: GridSettings,
}

impl Scene {
    /// The weather identifier, treating an empty string as none.
    #[must_use]
    pub fn weather_id(&self) -> Option<&str> {
        self.weather.as_deref().filter(|w| !w.is_empty())
    }

    /// The foreground image, treating an empty string as none.
    #[must_use]
    pub fn foreground_src(&self) -> Option<&str> {
        self.foreground.as_deref().filter(|s| !s.is_empty())
    }

    /// The background image, treating an empty string as none.
    #[must_use]
    pub fn background_image(&self) -> Option<&str> {
        self.background_src.as_deref().filter(|s| !s.is_empty())
    }
}

/// A scene plus the documents it contains, as handed over on scene switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene: Scene,
    #[serde(default)]
    pub documents: Vec<MirroredDocument>,
}

/// Sparse update for scene-level properties. Only present fields changed.
///
/// For image fields an empty string means "cleared".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub darkness_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSettings>,
}

impl SceneDelta {
    /// Whether the scene bounds changed, which resizes every layer.
    #[must_use]
    pub fn touches_dimensions(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Merge this delta into `scene`.
    pub fn apply(&self, scene: &mut Scene) {
        if let Some(w) = self.width {
            scene.width = w;
        }
        if let Some(h) = self.height {
            scene.height = h;
        }
        if let Some(ref c) = self.background_color {
            scene.background_color = Some(c.clone());
        }
        if let Some(ref src) = self.background_src {
            scene.background_src = Some(src.clone());
        }
        if let Some(ref fg) = self.foreground {
            scene.foreground = Some(fg.clone());
        }
        if let Some(d) = self.darkness_level {
            scene.darkness_level = d;
        }
        if let Some(ref w) = self.weather {
            scene.weather = Some(w.clone());
        }
        if let Some(ref g) = self.grid {
            scene.grid = g.clone();
        }
    }
}
