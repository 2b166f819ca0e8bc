//! Mirror entity registry: document id → owned visual proxy.
//!
//! At most one live proxy exists per document id. A proxy found destroyed
//! (its backend resource freed behind our back) counts as absent and is
//! purged on the next lookup. Removal releases the proxy's texture
//! synchronously.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::collections::HashMap;

use tracing::debug;

use crate::doc::DocumentId;
use crate::host::RenderBackend;
use crate::sort::{self, SortKey};
use crate::sprite::Sprite;

#[derive(Debug)]
struct Entry {
    /// Insertion sequence, used as the stable tie-break in paint order.
    seq: u64,
    key: SortKey,
    sprite: Sprite,
}

/// Owns every document proxy of the active scene.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<DocumentId, Entry>,
    next_seq: u64,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the entry for `id` if its proxy was destroyed.
    fn purge_destroyed(&mut self, id: &DocumentId) {
        if self.entries.get(id).is_some_and(|e| e.sprite.is_destroyed()) {
            debug!(%id, "purging destroyed proxy");
            self.entries.remove(id);
        }
    }

    /// The live proxy for `id`, if any.
    pub fn get(&mut self, id: &DocumentId) -> Option<&Sprite> {
        self.purge_destroyed(id);
        self.entries.get(id).map(|e| &e.sprite)
    }

    /// Mutable access to the live proxy for `id`, if any.
    pub fn get_mut(&mut self, id: &DocumentId) -> Option<&mut Sprite> {
        self.purge_destroyed(id);
        self.entries.get_mut(id).map(|e| &mut e.sprite)
    }

    /// Whether a live proxy exists for `id`.
    pub fn contains(&mut self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// Register `sprite` for `id`. A live proxy already registered under the
    /// same id is destroyed first.
    pub fn add<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, id: DocumentId, sprite: Sprite, key: SortKey) {
        if let Some(mut old) = self.entries.remove(&id) {
            debug!(%id, "replacing existing proxy");
            old.sprite.destroy(gfx);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(id, Entry { seq, key, sprite });
    }

    /// Update the paint-order inputs for `id`. Returns false if absent.
    pub fn set_key(&mut self, id: &DocumentId, key: SortKey) -> bool {
        self.purge_destroyed(id);
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.key = key;
                true
            }
            None => false,
        }
    }

    /// Destroy and forget the proxy for `id`. Unknown ids are a no-op.
    pub fn remove<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R, id: &DocumentId) -> bool {
        match self.entries.remove(id) {
            Some(mut entry) => {
                entry.sprite.destroy(gfx);
                true
            }
            None => false,
        }
    }

    /// Destroy every proxy.
    pub fn clear<R: RenderBackend + ?Sized>(&mut self, gfx: &mut R) {
        for (_, mut entry) in self.entries.drain() {
            entry.sprite.destroy(gfx);
        }
    }

    /// Number of live proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| !e.sprite.is_destroyed()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute paint order over the whole set and write `0..N-1` into each
    /// proxy's `z_index`. Destroyed proxies are purged first.
    pub fn resort(&mut self) -> Vec<DocumentId> {
        self.entries.retain(|_, e| !e.sprite.is_destroyed());
        let items: Vec<(DocumentId, u64, SortKey)> = self.entries.iter().map(|(id, e)| (*id, e.seq, e.key)).collect();
        let order = sort::paint_order(&items);
        for (z, id) in (0_i64..).zip(order.iter()) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.sprite.z_index = z;
            }
        }
        order
    }

    /// Live proxies in ascending `z_index`.
    #[must_use]
    pub fn painted(&self) -> Vec<(DocumentId, &Sprite)> {
        let mut out: Vec<(DocumentId, &Sprite)> =
            self.entries.iter().filter(|(_, e)| !e.sprite.is_destroyed()).map(|(id, e)| (*id, &e.sprite)).collect();
        out.sort_by_key(|(_, s)| s.z_index);
        out
    }
}
