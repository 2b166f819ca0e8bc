//! In-memory host used by unit tests. Records every backend call in order.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use uuid::Uuid;

use crate::doc::{
    DocumentBody, DrawingData, FillType, MirroredDocument, NoteData, NoteFlags, ShapeData, ShapeKind, TextureRef,
    TexturedData,
};
use crate::error::{RenderError, StorageError, SyncError};
use crate::frame::ScreenBounds;
use crate::host::{
    ClientStore, EffectId, LoadTicket, MessageBus, Raster, RenderBackend, Session, Texture, TextureId, TextureLoad,
    Viewer,
};
use crate::scene::{GridSettings, Scene};
use crate::viewport::ViewState;
use crate::weather::EffectDefinition;

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Load(String),
    Rasterize(&'static str, TextureId),
    Release(TextureId),
    PlayVideo(TextureId),
    CreateEffect(String, EffectId),
    PlayEffect(EffectId),
    DestroyEffect(EffectId),
    Emit(String, Value),
    SaveView(ViewState),
}

#[derive(Debug)]
pub struct FakeHost {
    pub events: Vec<HostEvent>,
    next_id: u64,
    /// Sources that decode asynchronously.
    pub pending: HashSet<String>,
    /// Sources that cannot be resolved at all.
    pub missing: HashSet<String>,
    /// Tickets handed out for pending sources.
    pub tickets: HashMap<String, LoadTicket>,
    /// Natural texture sizes; unknown sources are 100×100.
    pub sizes: HashMap<String, (f64, f64)>,
    pub fail_rasterize: bool,
    pub failing_effects: HashSet<String>,
    pub performance: u8,
    pub bus_ready: bool,
    pub bus_rejects: bool,
    pub storage_fails: bool,
    pub stored_view: Option<ViewState>,
    pub viewer: Viewer,
    pub users: Vec<String>,
    pub screen: ScreenBounds,
    pub menu_mount: bool,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            pending: HashSet::new(),
            missing: HashSet::new(),
            tickets: HashMap::new(),
            sizes: HashMap::new(),
            fail_rasterize: false,
            failing_effects: HashSet::new(),
            performance: 2,
            bus_ready: true,
            bus_rejects: false,
            storage_fails: false,
            stored_view: None,
            viewer: Viewer { user_id: "gm".into(), is_gm: true, can_modify_settings: true },
            users: vec!["gm".into(), "player".into()],
            screen: ScreenBounds { left: 0.0, top: 0.0, right: 1300.0, bottom: 900.0 },
            menu_mount: true,
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose local user is an ordinary player.
    pub fn player() -> Self {
        Self {
            viewer: Viewer { user_id: "player".into(), is_gm: false, can_modify_settings: false },
            ..Self::default()
        }
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Mark a pending source as decoded and return its ticket.
    pub fn finish_load(&mut self, src: &str) -> Option<LoadTicket> {
        self.pending.remove(src);
        self.tickets.get(src).copied()
    }

    pub fn released(&self) -> Vec<TextureId> {
        self.events
            .iter()
            .filter_map(|e| if let HostEvent::Release(id) = e { Some(*id) } else { None })
            .collect()
    }

    pub fn loads(&self, src: &str) -> usize {
        self.events.iter().filter(|e| matches!(e, HostEvent::Load(s) if s == src)).count()
    }

    pub fn rasterized(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| matches!(e, HostEvent::Rasterize(k, _) if *k == kind)).count()
    }

    pub fn emitted(&self) -> Vec<Value> {
        self.events
            .iter()
            .filter_map(|e| if let HostEvent::Emit(_, v) = e { Some(v.clone()) } else { None })
            .collect()
    }

    pub fn saved_views(&self) -> Vec<ViewState> {
        self.events
            .iter()
            .filter_map(|e| if let HostEvent::SaveView(v) = e { Some(*v) } else { None })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl RenderBackend for FakeHost {
    fn load_texture(&mut self, src: &str) -> Result<TextureLoad, RenderError> {
        self.events.push(HostEvent::Load(src.to_owned()));
        if self.missing.contains(src) {
            return Err(RenderError::TextureUnavailable(src.to_owned()));
        }
        if self.pending.contains(src) {
            let ticket = match self.tickets.get(src) {
                Some(t) => *t,
                None => {
                    let t = LoadTicket(self.next());
                    self.tickets.insert(src.to_owned(), t);
                    t
                }
            };
            return Ok(TextureLoad::Pending(ticket));
        }
        let (width, height) = self.sizes.get(src).copied().unwrap_or((100.0, 100.0));
        let video = src.ends_with(".webm") || src.ends_with(".mp4");
        Ok(TextureLoad::Ready(Texture { id: TextureId(self.next()), width, height, video }))
    }

    fn rasterize(&mut self, raster: &Raster) -> Result<Texture, RenderError> {
        if self.fail_rasterize {
            return Err(RenderError::Rasterize("backend lost".into()));
        }
        let (kind, width, height) = match raster {
            Raster::SolidRect { width, height, .. } => ("solid", *width, *height),
            Raster::Shape { width, height, .. } => ("shape", *width, *height),
            Raster::Note { size, .. } => ("note", *size, *size),
            Raster::Grid { width, height, .. } => ("grid", *width, *height),
            Raster::Mask { width, height, .. } => ("mask", *width, *height),
        };
        let id = TextureId(self.next());
        self.events.push(HostEvent::Rasterize(kind, id));
        Ok(Texture { id, width, height, video: false })
    }

    fn release_texture(&mut self, id: TextureId) {
        self.events.push(HostEvent::Release(id));
    }

    fn play_video(&mut self, id: TextureId, _looped: bool) {
        self.events.push(HostEvent::PlayVideo(id));
    }

    fn create_effect(&mut self, def: &EffectDefinition, _width: f64, _height: f64) -> Result<EffectId, RenderError> {
        if self.failing_effects.contains(&def.name) {
            return Err(RenderError::Effect(def.name.clone()));
        }
        let id = EffectId(self.next());
        self.events.push(HostEvent::CreateEffect(def.name.clone(), id));
        Ok(id)
    }

    fn play_effect(&mut self, id: EffectId) {
        self.events.push(HostEvent::PlayEffect(id));
    }

    fn destroy_effect(&mut self, id: EffectId) {
        self.events.push(HostEvent::DestroyEffect(id));
    }

    fn performance_mode(&self) -> u8 {
        self.performance
    }
}

impl MessageBus for FakeHost {
    fn is_ready(&self) -> bool {
        self.bus_ready
    }

    fn emit(&mut self, channel: &str, payload: Value) -> Result<(), SyncError> {
        if self.bus_rejects {
            return Err(SyncError::Transport("socket closed".into()));
        }
        self.events.push(HostEvent::Emit(channel.to_owned(), payload));
        Ok(())
    }
}

impl ClientStore for FakeHost {
    fn load_view(&self) -> Option<ViewState> {
        self.stored_view
    }

    fn save_view(&mut self, view: ViewState) -> Result<(), StorageError> {
        if self.storage_fails {
            return Err(StorageError("quota exceeded".into()));
        }
        self.stored_view = Some(view);
        self.events.push(HostEvent::SaveView(view));
        Ok(())
    }
}

impl Session for FakeHost {
    fn viewer(&self) -> Viewer {
        self.viewer.clone()
    }

    fn active_users(&self) -> Vec<String> {
        self.users.clone()
    }

    fn screen_bounds(&self) -> ScreenBounds {
        self.screen
    }

    fn menu_mount_available(&self) -> bool {
        self.menu_mount
    }
}

// --- Fixtures ---

pub fn make_scene() -> Scene {
    Scene {
        id: Uuid::new_v4(),
        name: "Keep".into(),
        width: 2000.0,
        height: 1000.0,
        scene_x: 200.0,
        scene_y: 100.0,
        background_color: Some("#223344".into()),
        background_src: None,
        foreground: None,
        darkness_level: 0.0,
        weather: None,
        grid: GridSettings::default(),
    }
}

fn make_doc(scene: &Scene, body: DocumentBody) -> MirroredDocument {
    MirroredDocument {
        id: Uuid::new_v4(),
        scene_id: scene.id,
        name: None,
        x: 400.0,
        y: 300.0,
        elevation: 0.0,
        sort: 0,
        rotation: 0.0,
        hidden: false,
        alpha: None,
        body,
    }
}

pub fn make_token(scene: &Scene, src: &str) -> MirroredDocument {
    make_doc(
        scene,
        DocumentBody::Token(TexturedData {
            texture: TextureRef { src: Some(src.into()), ..TextureRef::default() },
            width: 1.0,
            height: 1.0,
        }),
    )
}

pub fn make_tile(scene: &Scene, src: &str) -> MirroredDocument {
    make_doc(
        scene,
        DocumentBody::Tile(TexturedData {
            texture: TextureRef { src: Some(src.into()), ..TextureRef::default() },
            width: 300.0,
            height: 150.0,
        }),
    )
}

pub fn make_drawing(scene: &Scene) -> MirroredDocument {
    make_doc(
        scene,
        DocumentBody::Drawing(DrawingData {
            shape: ShapeData { kind: ShapeKind::Rectangle, width: 200.0, height: 100.0, points: Vec::new(), bezier_factor: 0.0 },
            interface: false,
            stroke_width: 4.0,
            stroke_color: Some("#ff0000".into()),
            stroke_alpha: 1.0,
            fill_type: FillType::Solid,
            fill_color: Some("#00ff00".into()),
            fill_alpha: 0.5,
            texture: None,
            text: None,
            font_family: None,
            font_size: None,
            text_color: None,
        }),
    )
}

pub fn make_note(scene: &Scene, show: bool) -> MirroredDocument {
    make_doc(
        scene,
        DocumentBody::Note(NoteData {
            icon: Some("icons/book.svg".into()),
            icon_size: Some(40.0),
            tint: None,
            text: Some("Inn".into()),
            font_family: None,
            font_size: None,
            text_color: None,
            flags: NoteFlags { show, ..NoteFlags::default() },
        }),
    )
}
