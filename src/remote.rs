//! Remote previews: other actors' in-flight positions.
//!
//! Previews are advisory. They never touch the confirmed store and vanish
//! without side effects, either `grace_ms` after an explicit drag-end (so a
//! trailing position that arrives after the end is still absorbed) or once
//! no update has arrived for `stale_ms` (sender crashed or disconnected).
//! Any position update cancels a pending grace clear.

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;

use std::collections::HashMap;

use crate::doc::{ActorId, ObjectId};
use crate::geom::Point;
use crate::wire::RemoteUpdate;

/// Last broadcast state of one object from one remote actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePreview {
    pub actor: ActorId,
    pub id: ObjectId,
    pub position: Point,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub container_hint: Option<ObjectId>,
    pub received_at: i64,
    /// When set, the preview is dropped at or after this time.
    pub clear_at: Option<i64>,
}

/// All live remote previews keyed by object × actor.
#[derive(Debug, Clone)]
pub struct RemotePreviews {
    grace_ms: i64,
    stale_ms: i64,
    previews: HashMap<(ObjectId, ActorId), RemotePreview>,
}

impl RemotePreviews {
    #[must_use]
    pub fn new(grace_ms: i64, stale_ms: i64) -> Self {
        Self { grace_ms, stale_ms, previews: HashMap::new() }
    }

    /// Apply an inbound update. Returns true if any preview changed.
    pub fn apply(&mut self, update: &RemoteUpdate, now_ms: i64) -> bool {
        let key = (update.id, update.actor);
        let mut changed = false;
        if let Some(position) = update.position {
            let entry = self.previews.entry(key).or_insert(RemotePreview {
                actor: update.actor,
                id: update.id,
                position,
                width: None,
                height: None,
                container_hint: None,
                received_at: now_ms,
                clear_at: None,
            });
            entry.position = position;
            entry.width = update.width.or(entry.width);
            entry.height = update.height.or(entry.height);
            entry.container_hint = update.container_hint;
            entry.received_at = now_ms;
            entry.clear_at = None;
            changed = true;
        }
        if update.is_end
            && let Some(entry) = self.previews.get_mut(&key)
        {
            entry.clear_at = Some(now_ms + self.grace_ms);
            changed = true;
        }
        changed
    }

    /// Drop previews whose grace clear is due or that went stale.
    /// Returns the removed keys, sorted.
    pub fn expire(&mut self, now_ms: i64) -> Vec<(ObjectId, ActorId)> {
        let stale_ms = self.stale_ms;
        let mut removed: Vec<(ObjectId, ActorId)> = self
            .previews
            .iter()
            .filter(|(_, p)| p.clear_at.is_some_and(|at| now_ms >= at) || now_ms - p.received_at >= stale_ms)
            .map(|(k, _)| *k)
            .collect();
        removed.sort_unstable();
        for key in &removed {
            self.previews.remove(key);
        }
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "expired remote previews");
        }
        removed
    }

    /// The most recently received preview for `id` across all actors.
    #[must_use]
    pub fn latest_for(&self, id: &ObjectId) -> Option<&RemotePreview> {
        self.previews
            .values()
            .filter(|p| p.id == *id)
            .max_by(|a, b| a.received_at.cmp(&b.received_at).then_with(|| a.actor.cmp(&b.actor)))
    }

    /// Ids of every object with at least one live preview, sorted.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.previews.keys().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Remove every preview for `id`. Returns true if any existed.
    pub fn clear_object(&mut self, id: &ObjectId) -> bool {
        let before = self.previews.len();
        self.previews.retain(|(obj, _), _| obj != id);
        before != self.previews.len()
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId, actor: &ActorId) -> Option<&RemotePreview> {
        self.previews.get(&(*id, *actor))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}
