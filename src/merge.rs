//! Live merge: confirmed store + local transient + remote previews.
//!
//! SYSTEM CONTEXT
//! ==============
//! The view layer draws what this module produces. Three sources feed it:
//! the confirmed [`SpatialStore`], this actor's own in-flight positions
//! (`local`), and other actors' broadcast previews ([`RemotePreviews`]).
//!
//! RULES
//! =====
//! - Local beats remote for the same object, so an actor never sees its own
//!   drag fight a stale echo.
//! - A container with a transient delta drags its members along when they
//!   have no transient of their own (a dropped packet for a child must not
//!   leave it behind).
//! - An unowned object whose transient rect passes the entry threshold for
//!   some container renders as *entering* it; a member whose transient rect
//!   fails the exit threshold renders as *popped out*, above everything
//!   else. Neither touches confirmed membership.
//! - Output snapshots are reused by `Arc` when unchanged so downstream
//!   caches keyed on pointer identity stay warm.

#[cfg(test)]
#[path = "merge_test.rs"]
mod merge_test;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Hysteresis;
use crate::containment::{next_inside, overlap_ratio};
use crate::doc::{Connector, ConnectorStyle, Endpoint, ObjectId, SpatialObject, SpatialStore};
use crate::geom::{Point, Rect};
use crate::remote::RemotePreviews;

/// Where a rendered position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Confirmed,
    Local,
    Remote,
    /// Synthesized from the owning container's transient delta.
    Cohesion,
}

/// Containment preview for a transient object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    None,
    /// Would join this container if released now; render clipped to it.
    Entering(ObjectId),
    /// Would leave its container if released now; render unclipped on top.
    PoppedOut,
}

/// A render-ready object: confirmed state with the merged rect applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    pub object: SpatialObject,
    pub source: Source,
    pub preview: Preview,
}

impl ResolvedObject {
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.object.rect()
    }
}

/// Result of one merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergedScene {
    /// Draw order: `(stack_order, id)`, popped-out previews last.
    pub objects: Vec<Arc<ResolvedObject>>,
    /// `(object, container)` pairs rendered as entering.
    pub entering: Vec<(ObjectId, ObjectId)>,
    pub popped_out: Vec<ObjectId>,
}

impl MergedScene {
    /// Merged rect for `id`, if the object is in the scene.
    #[must_use]
    pub fn rect_of(&self, id: &ObjectId) -> Option<Rect> {
        self.objects.iter().find(|o| o.object.id == *id).map(|o| o.rect())
    }

    /// Merged rect of every object, keyed by id.
    #[must_use]
    pub fn rects(&self) -> HashMap<ObjectId, Rect> {
        self.objects.iter().map(|o| (o.object.id, o.rect())).collect()
    }
}

/// A connector with both endpoints resolved to canvas points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedConnector {
    pub id: ObjectId,
    pub style: ConnectorStyle,
    pub from: Point,
    pub to: Point,
}

/// Resolve a connector against merged rects.
///
/// Object endpoints anchor where the segment between the two endpoint
/// centres leaves the object's box. `None` when a referenced object is gone.
#[must_use]
pub fn resolve_connector(connector: &Connector, rects: &HashMap<ObjectId, Rect>) -> Option<ResolvedConnector> {
    let a = endpoint_rect(&connector.a, rects)?;
    let b = endpoint_rect(&connector.b, rects)?;
    let from = match a {
        EndpointGeom::Point(p) => p,
        EndpointGeom::Box(r) => r.boundary_toward(b.center()),
    };
    let to = match b {
        EndpointGeom::Point(p) => p,
        EndpointGeom::Box(r) => r.boundary_toward(a.center()),
    };
    Some(ResolvedConnector { id: connector.id, style: connector.style, from, to })
}

#[derive(Clone, Copy)]
enum EndpointGeom {
    Point(Point),
    Box(Rect),
}

impl EndpointGeom {
    fn center(self) -> Point {
        match self {
            Self::Point(p) => p,
            Self::Box(r) => r.center(),
        }
    }
}

fn endpoint_rect(endpoint: &Endpoint, rects: &HashMap<ObjectId, Rect>) -> Option<EndpointGeom> {
    match endpoint {
        Endpoint::Free { x, y } => Some(EndpointGeom::Point(Point::new(*x, *y))),
        Endpoint::Object { id } => rects.get(id).copied().map(EndpointGeom::Box),
    }
}

/// The merge layer: owns the local overlay and the snapshot cache.
#[derive(Debug, Clone)]
pub struct LiveMerge {
    hysteresis: Hysteresis,
    local: HashMap<ObjectId, Rect>,
    cache: HashMap<ObjectId, Arc<ResolvedObject>>,
}

impl LiveMerge {
    #[must_use]
    pub fn new(hysteresis: Hysteresis) -> Self {
        Self { hysteresis, local: HashMap::new(), cache: HashMap::new() }
    }

    /// Publish a local transient rect for `id`.
    pub fn set_local(&mut self, id: ObjectId, rect: Rect) {
        self.local.insert(id, rect);
    }

    pub fn clear_local(&mut self, id: &ObjectId) {
        self.local.remove(id);
    }

    pub fn clear_all_local(&mut self) {
        self.local.clear();
    }

    #[must_use]
    pub fn local(&self, id: &ObjectId) -> Option<Rect> {
        self.local.get(id).copied()
    }

    #[must_use]
    pub fn local_count(&self) -> usize {
        self.local.len()
    }

    /// Direct transient rect for one object: local first, then the newest remote preview.
    #[must_use]
    pub fn transient_rect(&self, obj: &SpatialObject, remote: &RemotePreviews) -> Option<(Rect, Source)> {
        if let Some(rect) = self.local.get(&obj.id) {
            return Some((*rect, Source::Local));
        }
        remote.latest_for(&obj.id).map(|p| {
            let rect = Rect::new(
                p.position.x,
                p.position.y,
                p.width.unwrap_or(obj.width),
                p.height.unwrap_or(obj.height),
            );
            (rect.sanitized(), Source::Remote)
        })
    }

    /// Compose the scene for this frame.
    pub fn resolve(&mut self, store: &SpatialStore, remote: &RemotePreviews) -> MergedScene {
        let sorted = store.sorted_objects();

        let mut transient: HashMap<ObjectId, (Rect, Source)> = HashMap::new();
        for obj in &sorted {
            if let Some(t) = self.transient_rect(obj, remote) {
                transient.insert(obj.id, t);
            }
        }

        for container_id in store.containers() {
            let Some(container) = store.get(container_id) else {
                continue;
            };
            let Some((rect, _)) = transient.get(container_id).copied() else {
                continue;
            };
            let dx = rect.x - container.x;
            let dy = rect.y - container.y;
            for member_id in store.members_of(container_id) {
                if transient.contains_key(member_id) {
                    continue;
                }
                if let Some(member) = store.get(member_id) {
                    transient.insert(*member_id, (member.rect().translated(dx, dy), Source::Cohesion));
                }
            }
        }

        let merged_rect = |obj: &SpatialObject| transient.get(&obj.id).map_or(obj.rect(), |(r, _)| *r);

        let mut scene = MergedScene::default();
        let mut popped: Vec<Arc<ResolvedObject>> = Vec::new();
        let mut next_cache = HashMap::with_capacity(sorted.len());

        for obj in &sorted {
            let (rect, source) = transient.get(&obj.id).copied().unwrap_or((obj.rect(), Source::Confirmed));
            let preview = if matches!(source, Source::Local | Source::Remote) && !obj.is_container() {
                self.preview_for(obj, &rect, store, &merged_rect)
            } else {
                Preview::None
            };

            let mut object = (*obj).clone();
            object.x = rect.x;
            object.y = rect.y;
            object.width = rect.width;
            object.height = rect.height;
            let resolved = ResolvedObject { object, source, preview };

            let shared = match self.cache.get(&obj.id) {
                Some(cached) if **cached == resolved => Arc::clone(cached),
                _ => Arc::new(resolved),
            };
            next_cache.insert(obj.id, Arc::clone(&shared));

            match preview {
                Preview::Entering(container) => {
                    scene.entering.push((obj.id, container));
                    scene.objects.push(shared);
                }
                Preview::PoppedOut => {
                    scene.popped_out.push(obj.id);
                    popped.push(shared);
                }
                Preview::None => scene.objects.push(shared),
            }
        }
        scene.objects.extend(popped);
        self.cache = next_cache;
        scene
    }

    fn preview_for(
        &self,
        obj: &SpatialObject,
        rect: &Rect,
        store: &SpatialStore,
        merged_rect: &dyn Fn(&SpatialObject) -> Rect,
    ) -> Preview {
        match obj.container_ref {
            Some(container_id) => {
                let Some(container) = store.get(&container_id) else {
                    return Preview::None;
                };
                let ratio = overlap_ratio(rect, &merged_rect(container));
                if next_inside(true, ratio, self.hysteresis) {
                    Preview::None
                } else {
                    Preview::PoppedOut
                }
            }
            None => store
                .containers()
                .iter()
                .filter_map(|id| store.get(id))
                .find(|c| next_inside(false, overlap_ratio(rect, &merged_rect(c)), self.hysteresis))
                .map_or(Preview::None, |c| Preview::Entering(c.id)),
        }
    }
}
