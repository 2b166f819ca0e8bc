//! Error taxonomy for the minimap.
//!
//! Each concern owns a small `thiserror` enum. Operation boundaries in
//! [`crate::minimap`] fold them into [`MinimapError`], which knows the
//! localization key the host should display.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Grepable error codes, also used to build localization keys.
pub trait ErrorCode {
    /// Stable upper-case code, e.g. `"SOCKETNOTINITIALIZED"`.
    fn error_code(&self) -> &'static str;
}

/// Failure talking to the host rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The referenced texture could not be resolved at all.
    #[error("texture unavailable: {0}")]
    TextureUnavailable(String),
    /// The backend refused to rasterize a shape, note, grid or color fill.
    #[error("rasterization failed: {0}")]
    Rasterize(String),
    /// A weather effect could not be constructed.
    #[error("weather effect failed: {0}")]
    Effect(String),
}

impl ErrorCode for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TextureUnavailable(_) => "TEXTUREUNAVAILABLE",
            Self::Rasterize(_) => "RASTERIZE",
            Self::Effect(_) => "WEATHEREFFECT",
        }
    }
}

/// Failure sending a sync message.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The host channel is not ready yet.
    #[error("sync channel used before the transport was initialized")]
    TransportNotInitialized,
    /// The message could not be serialized.
    #[error("failed to encode sync message: {0}")]
    Encode(#[from] serde_json::Error),
    /// An incoming message did not match any known shape.
    #[error("failed to decode sync message: {0}")]
    Decode(String),
    /// The transport rejected the message.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TransportNotInitialized => "SOCKETNOTINITIALIZED",
            Self::Encode(_) => "SYNCENCODE",
            Self::Decode(_) => "SYNCDECODE",
            Self::Transport(_) => "SYNCTRANSPORT",
        }
    }
}

/// Failure persisting per-client state.
#[derive(Debug, thiserror::Error)]
#[error("client storage error: {0}")]
pub struct StorageError(pub String);

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        "STORAGE"
    }
}

/// Failure reading persisted configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("scene override must be a JSON object")]
    NotAnObject,
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "INVALIDSETTINGS",
            Self::NotAnObject => "INVALIDOVERRIDE",
        }
    }
}

/// Error raised at a minimap operation boundary.
#[derive(Debug, thiserror::Error)]
pub enum MinimapError {
    /// An expected host element (e.g. the context-menu mount point) is missing.
    #[error("resource not found: {0}")]
    ResourceNotFound(&'static str),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for MinimapError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound(code) => *code,
            Self::Render(e) => e.error_code(),
            Self::Sync(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

impl MinimapError {
    /// Localization key the host resolves for user-facing messages.
    #[must_use]
    pub fn localization_key(&self) -> String {
        format!("MINIMAP.ERRORS.{}", self.error_code())
    }
}
