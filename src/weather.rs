//! Weather layer: animated effects keyed by the scene's weather identifier.
//!
//! Effects are host objects; this module only decides which to build, sizes
//! them to the scene and keeps their handles so they can be torn down.

#[cfg(test)]
#[path = "weather_test.rs"]
mod weather_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::host::{EffectId, RenderBackend};
use crate::scene::Scene;

/// One constituent effect of a weather preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDefinition {
    /// Host effect class name.
    pub name: String,
    /// Minimum performance tier needed to run this effect.
    #[serde(default)]
    pub performance_level: u8,
    /// Explicit z-index inside the weather layer.
    #[serde(default)]
    pub z_index: Option<i64>,
    #[serde(default)]
    pub blend_mode: Option<String>,
    /// Opaque effect configuration passed through to the host.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// A named weather preset made of several effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDefinition {
    #[serde(default)]
    pub label: String,
    pub effects: Vec<EffectDefinition>,
}

/// Weather presets known to the host, by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherCatalog {
    presets: HashMap<String, WeatherDefinition>,
}

impl WeatherCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, def: WeatherDefinition) {
        self.presets.insert(id.into(), def);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WeatherDefinition> {
        self.presets.get(id)
    }
}

/// A running effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub id: EffectId,
    pub name: String,
    pub z_index: i64,
    /// `"normal"` unless the definition names another mode.
    pub blend_mode: String,
    pub width: f64,
    pub height: f64,
}

/// The set of weather effects currently playing.
#[derive(Debug, Default)]
pub struct WeatherLayer {
    effects: Vec<ActiveEffect>,
}

impl WeatherLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Destroy every running effect.
    pub fn clear<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        for effect in self.effects.drain(..) {
            gfx.destroy_effect(effect.id);
        }
    }

    /// Tear down and rebuild the effects for `scene`'s weather.
    ///
    /// Effects needing a higher performance tier than the backend offers are
    /// skipped. An effect that fails to construct is logged and skipped.
    pub fn initialize<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, catalog: &WeatherCatalog, scene: &Scene) {
        self.clear(gfx);
        let Some(weather) = scene.weather_id() else {
            return;
        };
        let Some(preset) = catalog.get(weather) else {
            warn!(weather, "unknown weather preset");
            return;
        };

        info!(weather, effects = preset.effects.len(), "initializing weather");
        let budget = gfx.performance_mode();
        let mut next_z = 0_i64;
        for def in &preset.effects {
            if budget < def.performance_level {
                continue;
            }
            let id = match gfx.create_effect(def, scene.width, scene.height) {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, effect = %def.name, "weather effect construction failed");
                    continue;
                }
            };
            let z_index = def.z_index.unwrap_or_else(|| {
                let z = next_z;
                next_z += 1;
                z
            });
            gfx.play_effect(id);
            self.effects.push(ActiveEffect {
                id,
                name: def.name.clone(),
                z_index,
                blend_mode: def.blend_mode.clone().unwrap_or_else(|| "normal".to_owned()),
                width: scene.width,
                height: scene.height,
            });
        }
    }

    /// Resize running effects to new scene bounds.
    pub fn resize(&mut self, width: f64, height: f64) {
        for effect in &mut self.effects {
            effect.width = width;
            effect.height = height;
        }
    }
}
