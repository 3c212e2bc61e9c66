//! Engine facade: wires store, gestures, merge, broadcast, culling and undo.
//!
//! The host feeds pointer samples, inbound transport frames and timer ticks
//! in, and applies the returned [`Action`]s: persisting commits, sending
//! broadcasts, and scheduling a redraw. Per-frame render input comes from
//! [`Engine::frame`].
//!
//! One gesture runs at a time. A drag on the bulk path never touches the
//! merge overlay; it reports positions as a single
//! [`Action::ScenePositions`] per move, and the store sees exactly one
//! commit per changed object on release.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::broadcast::Throttler;
use crate::config::CoreConfig;
use crate::controller::{self, Commit, DrawOutcome};
use crate::doc::{ActorId, Connector, ObjectId, PartialObject, SpatialObject, SpatialStore};
use crate::geom::{Point, Rect};
use crate::merge::{LiveMerge, Preview, ResolvedConnector, ResolvedObject, Source, resolve_connector};
use crate::remote::RemotePreviews;
use crate::session::{Gesture, ResizeAnchor, Tool};
use crate::undo::{UndoEntry, UndoLog};
use crate::viewport::{Camera, ViewportCuller};
use crate::wire::{self, OutboundMessage, PositionMessage, RemoteUpdate};

/// Side effects the host must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Persist a new object.
    ObjectCreated(SpatialObject),
    /// Persist changed fields of an object.
    ObjectUpdated { id: ObjectId, fields: PartialObject },
    /// Persist a deletion.
    ObjectDeleted { id: ObjectId },
    ConnectorCreated(Connector),
    /// A new undo entry was recorded.
    UndoRecorded(UndoEntry),
    /// Send on the realtime channel.
    Broadcast(OutboundMessage),
    /// Bulk drag: move these objects in the retained scene directly.
    ScenePositions(Vec<(ObjectId, Rect)>),
    RenderNeeded,
}

/// Render input for one frame: merged, culled, stack-ordered.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub objects: Vec<Arc<ResolvedObject>>,
    pub connectors: Vec<ResolvedConnector>,
    pub entering: Vec<(ObjectId, ObjectId)>,
    pub popped_out: Vec<ObjectId>,
}

/// The manipulation core for one local actor.
pub struct Engine {
    pub store: SpatialStore,
    config: CoreConfig,
    actor: ActorId,
    merge: LiveMerge,
    remote: RemotePreviews,
    throttler: Throttler,
    culler: ViewportCuller,
    undo: UndoLog,
    gesture: Gesture,
    selection: Vec<ObjectId>,
    tool: Tool,
    camera: Camera,
    viewport_width: f64,
    viewport_height: f64,
    /// Retained scene positions reported during a bulk drag.
    bulk_scene: HashMap<ObjectId, Rect>,
    /// Bulk overlay snapshots from the previous frame.
    bulk_cache: HashMap<ObjectId, Arc<ResolvedObject>>,
}

impl Engine {
    #[must_use]
    pub fn new(actor: ActorId, config: CoreConfig) -> Self {
        Self {
            store: SpatialStore::new(),
            actor,
            merge: LiveMerge::new(config.hysteresis),
            remote: RemotePreviews::new(config.drag_end_grace_ms, config.preview_stale_ms),
            throttler: Throttler::new(config.broadcast_interval_ms, config.heartbeat_interval_ms),
            culler: ViewportCuller::new(&config),
            undo: UndoLog::new(config.undo_depth),
            gesture: Gesture::Idle,
            selection: Vec::new(),
            tool: Tool::Select,
            camera: Camera::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            bulk_scene: HashMap::new(),
            bulk_cache: HashMap::new(),
            config,
        }
    }

    // --- Confirmed state from collaborators ---

    /// Replace the store with a full snapshot.
    pub fn load_snapshot(&mut self, objects: Vec<SpatialObject>, connectors: Vec<Connector>) {
        self.store.load_snapshot(objects, connectors);
        self.undo.clear();
    }

    /// Apply an object created elsewhere. Not recorded for undo.
    pub fn apply_create(&mut self, object: SpatialObject) {
        self.store.insert(object);
    }

    /// Apply an update made elsewhere. Not recorded for undo.
    pub fn apply_update(&mut self, id: &ObjectId, fields: &PartialObject, now_ms: i64) {
        self.store.apply_partial(id, fields, now_ms);
    }

    /// Apply a deletion made elsewhere. Not recorded for undo.
    pub fn apply_delete(&mut self, id: &ObjectId) {
        self.store.remove(id);
        self.selection.retain(|s| s != id);
    }

    // --- Local state ---

    pub fn set_selection(&mut self, ids: Vec<ObjectId>) {
        self.selection = ids;
    }

    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    #[must_use]
    pub fn remote(&self) -> &RemotePreviews {
        &self.remote
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn culler(&self) -> &ViewportCuller {
        &self.culler
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.culler.update(camera, self.viewport_width, self.viewport_height);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.culler.update(self.camera, width, height);
    }

    // --- Drag ---

    /// Begin dragging `id` with the pointer at `pointer` (canvas units).
    pub fn start_drag(&mut self, id: ObjectId, pointer: Point) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Idle) {
            tracing::debug!(%id, "drag ignored: gesture in progress");
            return Vec::new();
        }
        let Some(session) = controller::start_drag(&self.store, id, &self.selection, pointer, &self.config) else {
            return Vec::new();
        };
        self.gesture = Gesture::Dragging(session);
        vec![Action::RenderNeeded]
    }

    pub fn drag_move(&mut self, pointer: Point, now_ms: i64) -> Vec<Action> {
        let Gesture::Dragging(session) = &mut self.gesture else {
            return Vec::new();
        };
        let frame = controller::drag_move(session, &self.store, pointer, self.config.hysteresis);
        let messages = frame.messages(session.primary, &self.store);

        let mut actions = Vec::new();
        if frame.bulk {
            self.bulk_scene.extend(frame.positions.iter().copied());
            actions.push(Action::ScenePositions(frame.positions));
        } else {
            for (id, rect) in frame.positions {
                self.merge.set_local(id, rect);
            }
            actions.push(Action::RenderNeeded);
        }
        for msg in messages {
            if let Some(out) = self.throttler.offer(msg, now_ms) {
                actions.push(Action::Broadcast(out));
            }
        }
        actions
    }

    /// Release the drag. `pointer` is the release position if known.
    pub fn end_drag(&mut self, pointer: Option<Point>, now_ms: i64) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Dragging(_)) {
            return Vec::new();
        }
        let Gesture::Dragging(mut session) = std::mem::take(&mut self.gesture) else {
            return Vec::new();
        };
        let outcome = controller::end_drag(&mut session, &self.store, pointer, self.config.hysteresis);

        let mut actions = self.commit_all(outcome.commits, now_ms);
        for id in session.ids() {
            self.merge.clear_local(&id);
        }
        self.bulk_scene.clear();
        self.bulk_cache.clear();

        let mut finished: HashSet<ObjectId> = HashSet::new();
        for msg in outcome.finals {
            finished.insert(msg.id);
            actions.extend(self.throttler.finish(msg.id, Some(msg)).into_iter().map(Action::Broadcast));
        }
        for id in session.ids() {
            if !finished.contains(&id) && self.throttler.is_active(&id) {
                actions.extend(self.throttler.finish(id, None).into_iter().map(Action::Broadcast));
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Resize ---

    pub fn start_resize(&mut self, id: ObjectId, anchor: ResizeAnchor, pointer: Point) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Idle) {
            return Vec::new();
        }
        let Some(session) = controller::start_resize(&self.store, id, anchor, pointer) else {
            return Vec::new();
        };
        self.gesture = Gesture::Resizing(session);
        vec![Action::RenderNeeded]
    }

    pub fn resize_move(&mut self, pointer: Point, now_ms: i64) -> Vec<Action> {
        let Gesture::Resizing(session) = &mut self.gesture else {
            return Vec::new();
        };
        let rect = controller::resize_move(session, pointer);
        let id = session.id;
        self.merge.set_local(id, rect);
        let mut actions = vec![Action::RenderNeeded];
        if let Some(out) = self.throttler.offer(self.sized_message(id, rect), now_ms) {
            actions.push(Action::Broadcast(out));
        }
        actions
    }

    pub fn end_resize(&mut self, pointer: Option<Point>, now_ms: i64) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Resizing(_)) {
            return Vec::new();
        }
        let Gesture::Resizing(mut session) = std::mem::take(&mut self.gesture) else {
            return Vec::new();
        };
        let commit = controller::end_resize(&mut session, &self.store, pointer);
        let mut actions = self.commit_all(commit.into_iter().collect(), now_ms);
        self.merge.clear_local(&session.id);
        if self.store.contains(&session.id) {
            let msg = self.sized_message(session.id, session.latest);
            actions.extend(self.throttler.finish(session.id, Some(msg)).into_iter().map(Action::Broadcast));
        } else if self.throttler.is_active(&session.id) {
            actions.extend(self.throttler.finish(session.id, None).into_iter().map(Action::Broadcast));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn sized_message(&self, id: ObjectId, rect: Rect) -> PositionMessage {
        PositionMessage {
            id,
            x: rect.x,
            y: rect.y,
            width: Some(rect.width),
            height: Some(rect.height),
            container_id: self.store.get(&id).and_then(|o| o.container_ref),
        }
    }

    // --- Draw ---

    /// Begin drawing with the active tool.
    pub fn begin_draw(&mut self, pointer: Point) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Idle) {
            return Vec::new();
        }
        let Some(session) = controller::begin_draw(self.tool, pointer) else {
            return Vec::new();
        };
        self.gesture = Gesture::Drawing(session);
        vec![Action::RenderNeeded]
    }

    pub fn update_draw(&mut self, pointer: Point) -> Vec<Action> {
        let Gesture::Drawing(session) = &mut self.gesture else {
            return Vec::new();
        };
        controller::update_draw(session, pointer);
        vec![Action::RenderNeeded]
    }

    /// Rect spanned by the in-progress draw, for the view layer's rubber band.
    #[must_use]
    pub fn draw_preview(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::Drawing(session) => Some(session.rect()),
            _ => None,
        }
    }

    pub fn finish_draw(&mut self, now_ms: i64) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Drawing(_)) {
            return Vec::new();
        }
        let Gesture::Drawing(session) = std::mem::take(&mut self.gesture) else {
            return Vec::new();
        };
        match controller::finish_draw(&session, &self.store, Uuid::new_v4(), self.config.hysteresis) {
            DrawOutcome::Shape(mut obj) => {
                obj.created_by = Some(self.actor);
                obj.created_at = now_ms;
                obj.updated_at = now_ms;
                self.selection = vec![obj.id];
                self.mutate(UndoEntry::Create(obj), now_ms)
            }
            DrawOutcome::Connector(connector) => {
                self.store.insert_connector(connector.clone());
                vec![Action::ConnectorCreated(connector), Action::RenderNeeded]
            }
            DrawOutcome::Nothing => Vec::new(),
        }
    }

    /// Abandon an in-progress draw. The store is untouched.
    pub fn cancel_draw(&mut self) -> Vec<Action> {
        if !matches!(self.gesture, Gesture::Drawing(_)) {
            return Vec::new();
        }
        self.gesture = Gesture::Idle;
        tracing::debug!("draw cancelled");
        vec![Action::RenderNeeded]
    }

    // --- Store mutations with undo ---

    pub fn create_object(&mut self, object: SpatialObject, now_ms: i64) -> Vec<Action> {
        self.mutate(UndoEntry::Create(object), now_ms)
    }

    /// Delete an object. Deleting a container records its members' release
    /// in the same undo step.
    pub fn delete_object(&mut self, id: &ObjectId, now_ms: i64) -> Vec<Action> {
        let Some(obj) = self.store.get(id).cloned() else {
            return Vec::new();
        };
        let mut entries: Vec<UndoEntry> = self
            .store
            .members_of(id)
            .iter()
            .map(|member| UndoEntry::Update {
                id: *member,
                before: PartialObject { container_ref: Some(Some(*id)), ..PartialObject::default() },
                after: PartialObject { container_ref: Some(None), ..PartialObject::default() },
            })
            .collect();
        entries.push(UndoEntry::Delete(obj));
        self.selection.retain(|s| s != id);
        match UndoEntry::batch(entries) {
            Some(entry) => self.mutate(entry, now_ms),
            None => Vec::new(),
        }
    }

    pub fn update_object(&mut self, id: &ObjectId, fields: PartialObject, now_ms: i64) -> Vec<Action> {
        let Some(before) = self.store.capture(id, &fields) else {
            return Vec::new();
        };
        if before == fields {
            return Vec::new();
        }
        self.mutate(UndoEntry::Update { id: *id, before, after: fields }, now_ms)
    }

    /// Undo the newest entry.
    pub fn undo(&mut self, now_ms: i64) -> Vec<Action> {
        let Some(entry) = self.undo.begin_undo() else {
            return Vec::new();
        };
        tracing::debug!(entries = entry.leaf_count(), "undo");
        let actions = self.mutate(entry, now_ms);
        self.undo.end_replay();
        actions
    }

    /// Redo the newest undone entry.
    pub fn redo(&mut self, now_ms: i64) -> Vec<Action> {
        let Some(entry) = self.undo.begin_redo() else {
            return Vec::new();
        };
        tracing::debug!(entries = entry.leaf_count(), "redo");
        let actions = self.mutate(entry, now_ms);
        self.undo.end_replay();
        actions
    }

    /// Apply commits as one undo step.
    fn commit_all(&mut self, commits: Vec<Commit>, now_ms: i64) -> Vec<Action> {
        let entries: Vec<UndoEntry> = commits
            .into_iter()
            .map(|c| UndoEntry::Update { id: c.id, before: c.before, after: c.after })
            .collect();
        match UndoEntry::batch(entries) {
            Some(entry) => self.mutate(entry, now_ms),
            None => Vec::new(),
        }
    }

    /// Apply `entry` to the store and record it. Recording is a no-op
    /// during undo/redo replay.
    fn mutate(&mut self, entry: UndoEntry, now_ms: i64) -> Vec<Action> {
        let mut actions = Vec::new();
        self.apply_entry(&entry, now_ms, &mut actions);
        if self.undo.push(entry.clone()) {
            actions.push(Action::UndoRecorded(entry));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn apply_entry(&mut self, entry: &UndoEntry, now_ms: i64, actions: &mut Vec<Action>) {
        match entry {
            UndoEntry::Create(obj) => {
                self.store.insert(obj.clone());
                if let Some(stored) = self.store.get(&obj.id) {
                    actions.push(Action::ObjectCreated(stored.clone()));
                }
            }
            UndoEntry::Delete(obj) => {
                if self.store.remove(&obj.id).is_some() {
                    self.merge.clear_local(&obj.id);
                    actions.push(Action::ObjectDeleted { id: obj.id });
                }
            }
            UndoEntry::Update { id, after, .. } => {
                if self.store.apply_partial(id, after, now_ms) {
                    actions.push(Action::ObjectUpdated { id: *id, fields: after.clone() });
                }
            }
            UndoEntry::Batch(entries) => {
                for sub in entries {
                    self.apply_entry(sub, now_ms, actions);
                }
            }
        }
    }

    // --- Remote ---

    /// Apply another actor's transient position or drag-end.
    pub fn on_remote_position(&mut self, update: &RemoteUpdate, now_ms: i64) -> Vec<Action> {
        if update.actor == self.actor {
            return Vec::new();
        }
        if self.remote.apply(update, now_ms) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Decode and apply one inbound transport frame. Malformed frames are
    /// logged and dropped.
    pub fn on_remote_frame(&mut self, actor: ActorId, kind: &str, data: &Value, now_ms: i64) -> Vec<Action> {
        match wire::decode(actor, kind, data) {
            Ok(update) => self.on_remote_position(&update, now_ms),
            Err(e) => {
                tracing::warn!(%actor, kind, error = %e, "dropping inbound frame");
                Vec::new()
            }
        }
    }

    // --- Timers ---

    /// Advance throttle flushes, heartbeats, grace clears and stale GC.
    pub fn tick(&mut self, now_ms: i64) -> Vec<Action> {
        let mut actions: Vec<Action> = self.throttler.tick(now_ms).into_iter().map(Action::Broadcast).collect();
        if !self.remote.expire(now_ms).is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Render ---

    /// Ids the local gesture is moving.
    fn dragging(&self) -> HashSet<ObjectId> {
        match &self.gesture {
            Gesture::Dragging(session) => session.ids().collect(),
            Gesture::Resizing(session) => std::iter::once(session.id).collect(),
            Gesture::Idle | Gesture::Drawing(_) => HashSet::new(),
        }
    }

    /// Compose the render input for this frame.
    pub fn frame(&mut self) -> Frame {
        let scene = self.merge.resolve(&self.store, &self.remote);
        let dragging = self.dragging();

        let mut objects = scene.objects;
        if !self.bulk_scene.is_empty() {
            let mut next_cache = HashMap::with_capacity(self.bulk_scene.len());
            for resolved in &mut objects {
                let id = resolved.object.id;
                let Some(rect) = self.bulk_scene.get(&id) else {
                    continue;
                };
                let mut moved = (**resolved).clone();
                moved.object.x = rect.x;
                moved.object.y = rect.y;
                moved.source = Source::Local;
                moved.preview = Preview::None;
                *resolved = match self.bulk_cache.get(&id) {
                    Some(cached) if **cached == moved => Arc::clone(cached),
                    _ => Arc::new(moved),
                };
                next_cache.insert(id, Arc::clone(resolved));
            }
            self.bulk_cache = next_cache;
        }

        let rects: HashMap<ObjectId, Rect> = objects.iter().map(|o| (o.object.id, o.rect())).collect();
        let connectors = self
            .store
            .connectors()
            .into_iter()
            .filter_map(|c| resolve_connector(c, &rects))
            .collect();

        objects.retain(|o| self.culler.is_visible(&o.object.id, &o.rect(), &dragging));
        let visible: HashSet<ObjectId> = objects.iter().map(|o| o.object.id).collect();
        let mut entering = scene.entering;
        entering.retain(|(id, _)| visible.contains(id));
        let mut popped_out = scene.popped_out;
        popped_out.retain(|id| visible.contains(id));
        Frame { objects, connectors, entering, popped_out }
    }
}
