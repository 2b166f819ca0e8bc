//! Cross-client view synchronization.
//!
//! One JSON message shape travels on a host-provided channel:
//!
//! ```text
//! { id, type: "sync", timestamp, sender, users: [..], view: { x, y, zoom } }
//! ```
//!
//! Senders address an explicit recipient list; receivers apply the view only
//! if they are on it. The transport itself belongs to the host
//! ([`MessageBus`]). Sending before the transport is ready fails fast with
//! [`SyncError::TransportNotInitialized`].

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::SyncError;
use crate::host::MessageBus;
use crate::viewport::ViewState;

/// Channel name on the host message bus.
pub const SYNC_CHANNEL: &str = "module.miniature-map";

/// Typed body of a socket message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    /// Overwrite the recipients' view.
    Sync { view: ViewState },
}

/// A message on [`SYNC_CHANNEL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketMessage {
    pub id: Uuid,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
    /// User id of the sender.
    pub sender: String,
    /// User ids that should act on this message.
    pub users: Vec<String>,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// Who a broadcast is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every active user, sender included.
    Everyone,
    /// Every active user except the sender.
    Others,
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Filter the active user list for `audience`.
#[must_use]
pub fn recipients(active_users: Vec<String>, sender: &str, audience: Audience) -> Vec<String> {
    match audience {
        Audience::Everyone => active_users,
        Audience::Others => active_users.into_iter().filter(|u| u != sender).collect(),
    }
}

impl SocketMessage {
    /// Build a `sync` message carrying `view`.
    #[must_use]
    pub fn sync(sender: impl Into<String>, users: Vec<String>, view: ViewState) -> Self {
        Self { id: Uuid::new_v4(), timestamp: now_ms(), sender: sender.into(), users, body: MessageBody::Sync { view } }
    }

    /// Parse an incoming payload.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] if the payload is not a known message.
    pub fn decode(payload: serde_json::Value) -> Result<Self, SyncError> {
        serde_json::from_value(payload).map_err(|e| SyncError::Decode(e.to_string()))
    }

    /// Whether `user_id` is on the recipient list.
    #[must_use]
    pub fn addressed_to(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }

    /// The view to apply locally, if this message is a sync addressed to `user_id`.
    #[must_use]
    pub fn view_for(&self, user_id: &str) -> Option<ViewState> {
        if !self.addressed_to(user_id) {
            return None;
        }
        match self.body {
            MessageBody::Sync { view } => Some(view),
        }
    }
}

/// Publish `message` on the sync channel.
///
/// # Errors
///
/// Fails fast with [`SyncError::TransportNotInitialized`] before the bus is
/// ready; otherwise propagates encode and transport failures.
pub fn broadcast<B: MessageBus + ?Sized>(bus: &mut B, message: &SocketMessage) -> Result<(), SyncError> {
    if !bus.is_ready() {
        return Err(SyncError::TransportNotInitialized);
    }
    let payload = serde_json::to_value(message)?;
    bus.emit(SYNC_CHANNEL, payload)?;
    info!(id = %message.id, recipients = message.users.len(), "broadcast view sync");
    Ok(())
}
