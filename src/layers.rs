//! Scene backdrop layers: background color, background image, foreground,
//! grid and the darkness overlay.
//!
//! Every layer covers the scene rectangle at the content origin. Background,
//! foreground and grid paint below the mirrored documents; darkness paints
//! above everything except UI. Updates are selective: a [`SceneDelta`] only
//! redraws the layers whose inputs it touches.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use tracing::{debug, warn};

use crate::consts::{DARKNESS_ALPHA_CAP, DEFAULT_BACKGROUND_COLOR};
use crate::error::RenderError;
use crate::host::{LoadTicket, Raster, RenderBackend, TextureLoad};
use crate::renderer::ShowFlags;
use crate::scene::{GridKind, Scene, SceneDelta};
use crate::sprite::Sprite;

const DARKNESS_COLOR: &str = "#000000";

/// Which image layer a deferred load belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    BackgroundImage,
    Foreground,
}

impl ImageSlot {
    fn src(self, scene: &Scene) -> Option<&str> {
        match self {
            Self::BackgroundImage => scene.background_image(),
            Self::Foreground => scene.foreground_src(),
        }
    }
}

/// The backdrop and overlay sprites of one scene.
#[derive(Debug)]
pub struct SceneLayers {
    background_color: Sprite,
    background_image: Sprite,
    foreground: Sprite,
    grid: Sprite,
    darkness: Sprite,
}

impl Default for SceneLayers {
    fn default() -> Self {
        Self {
            background_color: Sprite::new("background-color"),
            background_image: Sprite::new("background-image"),
            foreground: Sprite::new("foreground"),
            grid: Sprite::new("grid"),
            darkness: Sprite::new("darkness"),
        }
    }
}

fn resize(sprite: &mut Sprite, scene: &Scene) {
    sprite.width = scene.width;
    sprite.height = scene.height;
}

impl SceneLayers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn background_color(&self) -> &Sprite {
        &self.background_color
    }

    #[must_use]
    pub fn background_image(&self) -> &Sprite {
        &self.background_image
    }

    #[must_use]
    pub fn foreground(&self) -> &Sprite {
        &self.foreground
    }

    #[must_use]
    pub fn grid(&self) -> &Sprite {
        &self.grid
    }

    #[must_use]
    pub fn darkness(&self) -> &Sprite {
        &self.darkness
    }

    /// Layers painted beneath the documents, bottom first.
    #[must_use]
    pub fn underlays(&self) -> [&Sprite; 4] {
        [&self.background_color, &self.background_image, &self.foreground, &self.grid]
    }

    /// Regenerate the solid background rectangle.
    ///
    /// # Errors
    ///
    /// Returns the backend error if rasterization fails.
    pub fn draw_background_color<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, scene: &Scene) -> Result<(), RenderError> {
        let color = scene.background_color.clone().unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_owned());
        let texture = gfx.rasterize(&Raster::SolidRect { color, width: scene.width, height: scene.height })?;
        self.background_color.replace_texture(gfx, texture);
        resize(&mut self.background_color, scene);
        self.background_color.renderable = true;
        Ok(())
    }

    fn image_sprite(&mut self, slot: ImageSlot) -> &mut Sprite {
        match slot {
            ImageSlot::BackgroundImage => &mut self.background_image,
            ImageSlot::Foreground => &mut self.foreground,
        }
    }

    /// Load and apply an image layer. An empty source hides the layer.
    ///
    /// Returns the ticket when the image is still decoding; the layer keeps
    /// its previous texture until the load completes.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the source cannot be resolved.
    pub fn draw_image<R: RenderBackend + ?Sized>(
        &mut self,
        gfx: &mut R,
        slot: ImageSlot,
        scene: &Scene,
    ) -> Result<Option<LoadTicket>, RenderError> {
        let Some(src) = slot.src(scene).map(str::to_owned) else {
            let sprite = self.image_sprite(slot);
            sprite.clear_texture(gfx);
            sprite.renderable = false;
            return Ok(None);
        };
        match gfx.load_texture(&src)? {
            TextureLoad::Pending(ticket) => {
                debug!(?slot, %src, "image layer waiting on decode");
                Ok(Some(ticket))
            }
            TextureLoad::Ready(texture) => {
                if texture.video {
                    gfx.play_video(texture.id, true);
                }
                let sprite = self.image_sprite(slot);
                sprite.replace_texture(gfx, texture);
                resize(sprite, scene);
                sprite.renderable = true;
                Ok(None)
            }
        }
    }

    /// Set the darkness overlay to `level × 0.8` over the scene bounds.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the overlay texture cannot be created.
    pub fn draw_darkness<R: RenderBackend + ?Sized>(
        &mut self,
        gfx: &mut R,
        scene: &Scene,
        show: bool,
    ) -> Result<(), RenderError> {
        if self.darkness.is_provisional() {
            let texture = gfx.rasterize(&Raster::SolidRect {
                color: DARKNESS_COLOR.to_owned(),
                width: scene.width,
                height: scene.height,
            })?;
            self.darkness.replace_texture(gfx, texture);
        }
        resize(&mut self.darkness, scene);
        self.darkness.alpha = scene.darkness_level * DARKNESS_ALPHA_CAP;
        self.darkness.renderable = show;
        Ok(())
    }

    /// Rebuild the grid mesh, or hide it for gridless scenes.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the grid cannot be rasterized.
    pub fn draw_grid<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, scene: &Scene, show: bool) -> Result<(), RenderError> {
        if !show || scene.grid.kind == GridKind::Gridless {
            self.grid.clear_texture(gfx);
            self.grid.renderable = false;
            return Ok(());
        }
        let texture = gfx.rasterize(&Raster::Grid { grid: scene.grid.clone(), width: scene.width, height: scene.height })?;
        self.grid.replace_texture(gfx, texture);
        resize(&mut self.grid, scene);
        self.grid.renderable = true;
        Ok(())
    }

    /// Redraw every layer. Returns image loads still in flight.
    pub fn draw_all<R: RenderBackend + ?Sized>(
        &mut self,
        gfx: &mut R,
        scene: &Scene,
        show: ShowFlags,
    ) -> Vec<(ImageSlot, LoadTicket)> {
        self.refresh(gfx, scene, None, show)
    }

    /// Redraw the layers affected by `delta`, or all of them when `delta`
    /// is `None`. Per-layer failures are logged and do not stop the others.
    pub fn refresh<R: RenderBackend + ?Sized>(
        &mut self,
        gfx: &mut R,
        scene: &Scene,
        delta: Option<&SceneDelta>,
        show: ShowFlags,
    ) -> Vec<(ImageSlot, LoadTicket)> {
        let all = delta.is_none();
        let dims = delta.is_some_and(SceneDelta::touches_dimensions);
        let touched = |f: fn(&SceneDelta) -> bool| all || delta.is_some_and(f);

        if dims || touched(|d| d.background_color.is_some()) {
            if let Err(e) = self.draw_background_color(gfx, scene) {
                warn!(error = %e, "background color layer failed");
            }
        }

        let mut pending = Vec::new();
        for (slot, changed) in [
            (ImageSlot::BackgroundImage, touched(|d| d.background_src.is_some())),
            (ImageSlot::Foreground, touched(|d| d.foreground.is_some())),
        ] {
            if changed {
                match self.draw_image(gfx, slot, scene) {
                    Ok(Some(ticket)) => pending.push((slot, ticket)),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, ?slot, "image layer failed"),
                }
            } else if dims {
                resize(self.image_sprite(slot), scene);
            }
        }

        if dims || touched(|d| d.darkness_level.is_some()) {
            if let Err(e) = self.draw_darkness(gfx, scene, show.darkness) {
                warn!(error = %e, "darkness layer failed");
            }
        }
        if dims || touched(|d| d.grid.is_some()) {
            if let Err(e) = self.draw_grid(gfx, scene, show.grid) {
                warn!(error = %e, "grid layer failed");
            }
        }
        pending
    }

    /// Apply new show toggles without touching scene-driven state.
    pub fn apply_show<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, scene: &Scene, show: ShowFlags) {
        self.darkness.renderable = show.darkness;
        if show.grid != self.grid.renderable {
            if let Err(e) = self.draw_grid(gfx, scene, show.grid) {
                warn!(error = %e, "grid layer failed");
            }
        }
    }

    /// Release every layer texture.
    pub fn clear<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        for sprite in [
            &mut self.background_color,
            &mut self.background_image,
            &mut self.foreground,
            &mut self.grid,
            &mut self.darkness,
        ] {
            sprite.clear_texture(gfx);
            sprite.renderable = false;
        }
    }
}
