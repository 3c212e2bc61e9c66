//! Document model: spatial objects, connectors, and the confirmed store.
//!
//! This module defines what is on the board (`SpatialObject`, `ObjectKind`,
//! `Connector`), a sparse-update type for incremental edits
//! (`PartialObject`), and the store that owns every confirmed object
//! (`SpatialStore`).
//!
//! Container membership is plain id references: each member carries its
//! `container_ref`, and the store keeps a precomputed container → members
//! index. The index is rebuilt only when membership, kind or stacking order
//! changes; pure position updates leave it alone.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::{Point, Rect, clamp_size, finite_or_zero, normalize_degrees};

/// Unique identifier for a board object or connector.
pub type ObjectId = Uuid;

/// Identifier of a participant (local or remote) on the board.
pub type ActorId = Uuid;

/// The kind of a spatial object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Sticky note with text.
    Note,
    /// Axis-aligned rectangle.
    Rectangle,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// Freehand stroke; the bounding box encloses the stroke.
    #[serde(rename = "line")]
    FreeformLine,
    /// Frame that holds member objects. Containers never nest.
    Container,
}

impl ObjectKind {
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Container)
    }
}

/// A confirmed spatial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Left edge of the bounding box in canvas units.
    pub x: f64,
    /// Top edge of the bounding box in canvas units.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees, normalized to `[0, 360)`.
    pub rotation: f64,
    /// Stacking order; ties are broken by ascending id.
    pub stack_order: i64,
    /// Container this object belongs to. Always `None` for containers.
    pub container_ref: Option<ObjectId>,
    pub created_by: Option<ActorId>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl SpatialObject {
    /// A fresh object at `rect` with default metadata.
    #[must_use]
    pub fn new(id: ObjectId, kind: ObjectKind, rect: Rect) -> Self {
        let mut obj = Self {
            id,
            kind,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotation: 0.0,
            stack_order: 0,
            container_ref: None,
            created_by: None,
            created_at: 0,
            updated_at: 0,
        };
        obj.sanitize();
        obj
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Clamp malformed geometry in place. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = (self.x, self.y, self.width, self.height, self.rotation);
        self.x = finite_or_zero(self.x);
        self.y = finite_or_zero(self.y);
        self.width = clamp_size(self.width);
        self.height = clamp_size(self.height);
        self.rotation = normalize_degrees(self.rotation);
        if self.kind.is_container() {
            self.container_ref = None;
        }
        let after = (self.x, self.y, self.width, self.height, self.rotation);
        // Bitwise compare so NaN inputs register as changed.
        before.0.to_bits() != after.0.to_bits()
            || before.1.to_bits() != after.1.to_bits()
            || before.2.to_bits() != after.2.to_bits()
            || before.3.to_bits() != after.3.to_bits()
            || before.4.to_bits() != after.4.to_bits()
    }
}

/// One end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    /// Anchored to an object's edge; recomputed from geometry every frame.
    Object { id: ObjectId },
    /// Fixed point in canvas units.
    Free { x: f64, y: f64 },
}

/// Visual style of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorStyle {
    Arrow,
    Line,
}

/// A line or arrow between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: ObjectId,
    pub a: Endpoint,
    pub b: Endpoint,
    pub style: ConnectorStyle,
}

/// Sparse update for a spatial object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_order: Option<i64>,
    /// `Some(None)` clears membership; `None` leaves it untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_ref: Option<Option<ObjectId>>,
}

impl PartialObject {
    /// A position-only update.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// A position-and-size update.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether applying this update could change the membership index.
    fn touches_index(&self) -> bool {
        self.container_ref.is_some() || self.stack_order.is_some()
    }
}

/// In-memory store of confirmed objects and connectors.
#[derive(Debug, Default)]
pub struct SpatialStore {
    objects: HashMap<ObjectId, SpatialObject>,
    connectors: HashMap<ObjectId, Connector>,
    /// Container id → member ids in stacking order.
    members: HashMap<ObjectId, Vec<ObjectId>>,
    /// Container ids, topmost first.
    containers: Vec<ObjectId>,
}

impl SpatialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object, clamping malformed geometry and
    /// dropping membership that points at anything but a container.
    pub fn insert(&mut self, mut obj: SpatialObject) {
        if obj.sanitize() {
            tracing::warn!(id = %obj.id, "clamped malformed geometry on insert");
        }
        if let Some(c) = obj.container_ref
            && !self.is_container(&c)
        {
            obj.container_ref = None;
        }
        let was_container = self.objects.get(&obj.id).is_some_and(SpatialObject::is_container);
        let id = obj.id;
        let now_container = obj.is_container();
        self.objects.insert(id, obj);
        if was_container && !now_container {
            self.release_members(&id);
        }
        self.reindex();
    }

    /// Remove an object by id, returning it if it was present.
    ///
    /// Removing a container clears `container_ref` on its members.
    pub fn remove(&mut self, id: &ObjectId) -> Option<SpatialObject> {
        let removed = self.objects.remove(id)?;
        if removed.is_container() {
            self.release_members(id);
        }
        self.reindex();
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SpatialObject> {
        self.objects.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    #[must_use]
    pub fn is_container(&self, id: &ObjectId) -> bool {
        self.objects.get(id).is_some_and(SpatialObject::is_container)
    }

    /// Apply a partial update. Returns false if the object doesn't exist.
    pub fn apply_partial(&mut self, id: &ObjectId, partial: &PartialObject, now_ms: i64) -> bool {
        let container_valid = match partial.container_ref {
            Some(Some(c)) => self.is_container(&c) && c != *id,
            _ => true,
        };
        let Some(obj) = self.objects.get_mut(id) else {
            return false;
        };
        if let Some(x) = partial.x {
            obj.x = x;
        }
        if let Some(y) = partial.y {
            obj.y = y;
        }
        if let Some(w) = partial.width {
            obj.width = w;
        }
        if let Some(h) = partial.height {
            obj.height = h;
        }
        if let Some(r) = partial.rotation {
            obj.rotation = r;
        }
        if let Some(z) = partial.stack_order {
            obj.stack_order = z;
        }
        if let Some(c) = partial.container_ref {
            obj.container_ref = if container_valid { c } else { None };
        }
        if obj.sanitize() {
            tracing::warn!(%id, "clamped malformed geometry on update");
        }
        obj.updated_at = now_ms;
        if partial.touches_index() {
            self.reindex();
        }
        true
    }

    /// Snapshot the current values of exactly the fields `template` sets.
    ///
    /// Used to build the "before" half of an undo entry.
    #[must_use]
    pub fn capture(&self, id: &ObjectId, template: &PartialObject) -> Option<PartialObject> {
        let obj = self.objects.get(id)?;
        Some(PartialObject {
            x: template.x.map(|_| obj.x),
            y: template.y.map(|_| obj.y),
            width: template.width.map(|_| obj.width),
            height: template.height.map(|_| obj.height),
            rotation: template.rotation.map(|_| obj.rotation),
            stack_order: template.stack_order.map(|_| obj.stack_order),
            container_ref: template.container_ref.map(|_| obj.container_ref),
        })
    }

    /// Replace all objects and connectors with a full snapshot.
    pub fn load_snapshot(&mut self, objects: Vec<SpatialObject>, connectors: Vec<Connector>) {
        self.objects.clear();
        self.connectors.clear();
        // Containers first so member references validate.
        let (containers, others): (Vec<_>, Vec<_>) = objects.into_iter().partition(SpatialObject::is_container);
        for mut obj in containers.into_iter().chain(others) {
            obj.sanitize();
            if let Some(c) = obj.container_ref
                && !self.is_container(&c)
            {
                obj.container_ref = None;
            }
            self.objects.insert(obj.id, obj);
        }
        for conn in connectors {
            self.connectors.insert(conn.id, conn);
        }
        self.reindex();
    }

    /// All objects sorted by `(stack_order, id)` for draw order.
    #[must_use]
    pub fn sorted_objects(&self) -> Vec<&SpatialObject> {
        let mut objs: Vec<&SpatialObject> = self.objects.values().collect();
        objs.sort_by(|a, b| stack_cmp(a, b));
        objs
    }

    /// Members of `container` in stacking order. Empty for unknown ids.
    #[must_use]
    pub fn members_of(&self, container: &ObjectId) -> &[ObjectId] {
        self.members.get(container).map_or(&[], Vec::as_slice)
    }

    /// Container ids, topmost first.
    #[must_use]
    pub fn containers(&self) -> &[ObjectId] {
        &self.containers
    }

    /// Topmost object whose bounding box contains `p`.
    #[must_use]
    pub fn top_object_at(&self, p: Point) -> Option<ObjectId> {
        self.objects
            .values()
            .filter(|o| o.rect().contains_point(p))
            .max_by(|a, b| stack_cmp(a, b))
            .map(|o| o.id)
    }

    pub fn insert_connector(&mut self, connector: Connector) {
        self.connectors.insert(connector.id, connector);
    }

    pub fn remove_connector(&mut self, id: &ObjectId) -> Option<Connector> {
        self.connectors.remove(id)
    }

    #[must_use]
    pub fn connector(&self, id: &ObjectId) -> Option<&Connector> {
        self.connectors.get(id)
    }

    /// All connectors sorted by id.
    #[must_use]
    pub fn connectors(&self) -> Vec<&Connector> {
        let mut out: Vec<&Connector> = self.connectors.values().collect();
        out.sort_by_key(|c| c.id);
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn release_members(&mut self, container: &ObjectId) {
        for obj in self.objects.values_mut() {
            if obj.container_ref.as_ref() == Some(container) {
                obj.container_ref = None;
            }
        }
    }

    fn reindex(&mut self) {
        let sorted: Vec<(ObjectId, ObjectKind, Option<ObjectId>)> = self
            .sorted_objects()
            .into_iter()
            .map(|o| (o.id, o.kind, o.container_ref))
            .collect();
        self.members.clear();
        self.containers.clear();
        for (id, kind, container_ref) in sorted {
            if kind.is_container() {
                self.containers.push(id);
                self.members.entry(id).or_default();
            } else if let Some(c) = container_ref {
                self.members.entry(c).or_default().push(id);
            }
        }
        self.containers.reverse();
    }
}

/// Draw-order comparison: `stack_order`, then id ascending.
#[must_use]
pub fn stack_cmp(a: &SpatialObject, b: &SpatialObject) -> std::cmp::Ordering {
    a.stack_order.cmp(&b.stack_order).then_with(|| a.id.cmp(&b.id))
}
