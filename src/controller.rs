//! Gesture controller: per-frame drag, resize, and draw computation.
//!
//! SYSTEM CONTEXT
//! ==============
//! The engine owns the active [`Gesture`] and hands the relevant session to
//! these functions together with a read-only view of the store. Nothing here
//! writes to the store: moves return a [`DragFrame`] of positions to
//! publish, and releases return [`Commit`]s the engine applies and turns
//! into undo entries.
//!
//! DRAG PATHS
//! ==========
//! - Normal: containment is evaluated for a lone non-container primary, its
//!   position is pushed out of every container it may not join, and members
//!   follow through their frozen offsets.
//! - Group or container drags evaluate no containment while moving.
//! - Bulk (`total_dragged >= bulk_threshold`): offsets only, no containment.
//!
//! Every release re-resolves membership for each dragged non-container.
//!
//! Ids that vanished from the store mid-gesture are skipped.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::HashMap;

use crate::config::{CoreConfig, Hysteresis};
use crate::consts::MIN_SIZE;
use crate::containment::{constrain_against_containers, resolve_container};
use crate::doc::{Connector, Endpoint, ObjectId, PartialObject, SpatialObject, SpatialStore};
use crate::geom::{Point, Rect};
use crate::session::{DragSession, DrawSession, MemberRole, ResizeAnchor, ResizeSession, Tool};
use crate::wire::PositionMessage;

/// Positions computed for one pointer sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragFrame {
    /// Primary first, then members in capture order.
    pub positions: Vec<(ObjectId, Rect)>,
    /// Primary's resolved container after this sample.
    pub container: Option<ObjectId>,
    pub bulk: bool,
}

impl DragFrame {
    /// Outgoing position message for every entry.
    #[must_use]
    pub fn messages(&self, primary: ObjectId, store: &SpatialStore) -> Vec<PositionMessage> {
        self.positions
            .iter()
            .map(|(id, rect)| PositionMessage {
                id: *id,
                x: rect.x,
                y: rect.y,
                width: None,
                height: None,
                container_id: if *id == primary {
                    self.container
                } else {
                    store.get(id).and_then(|o| o.container_ref)
                },
            })
            .collect()
    }
}

/// One confirmed-state change: `before` holds the prior values of exactly
/// the fields `after` sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub id: ObjectId,
    pub before: PartialObject,
    pub after: PartialObject,
}

/// Everything a drag release produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragOutcome {
    /// Only objects whose position or membership changed.
    pub commits: Vec<Commit>,
    /// Final position message for every dragged object still in the store.
    pub finals: Vec<PositionMessage>,
}

/// What a finished draw produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Shape(SpatialObject),
    Connector(Connector),
    /// Select tool or nothing to draw.
    Nothing,
}

// =============================================================
// Drag
// =============================================================

/// Begin a drag on `id`.
///
/// When `id` is in `selection`, every other selected object joins as a
/// group member. Every member of a dragged container (primary or selected)
/// joins as a container child. Returns `None` if `id` is not in the store.
#[must_use]
pub fn start_drag(
    store: &SpatialStore,
    id: ObjectId,
    selection: &[ObjectId],
    pointer: Point,
    config: &CoreConfig,
) -> Option<DragSession> {
    let primary = store.get(&id)?;
    let mut session = DragSession::new(id, primary.rect(), primary.is_container(), pointer);
    session.start_container = primary.container_ref;
    session.container = primary.container_ref;

    let mut containers: Vec<ObjectId> = Vec::new();
    if primary.is_container() {
        containers.push(id);
    }
    if selection.contains(&id) {
        for other in selection.iter().filter(|s| **s != id) {
            let Some(obj) = store.get(other) else {
                continue;
            };
            if session.add_member(obj.id, obj.rect(), MemberRole::Group) && obj.is_container() {
                containers.push(obj.id);
            }
        }
    }
    for container in &containers {
        for member in store.members_of(container) {
            if let Some(obj) = store.get(member) {
                session.add_member(obj.id, obj.rect(), MemberRole::ContainerChild);
            }
        }
    }

    session.bulk = session.total_dragged() >= config.bulk_threshold;
    tracing::debug!(
        %id,
        group = session.count(MemberRole::Group),
        children = session.count(MemberRole::ContainerChild),
        bulk = session.bulk,
        "drag started"
    );
    Some(session)
}

/// Compute positions for a pointer sample and remember them on the session.
pub fn drag_move(session: &mut DragSession, store: &SpatialStore, pointer: Point, hysteresis: Hysteresis) -> DragFrame {
    let evaluate = !session.bulk;
    let frame = compute_frame(session, store, pointer, hysteresis, evaluate);
    tracing::trace!(primary = %session.primary, count = frame.positions.len(), "drag move");
    frame
}

/// Finish a drag, diffing start against final state.
///
/// `pointer` is the release position; `None` reuses the last sampled
/// positions. Containment is always re-resolved here, bulk or not: a lone
/// primary through the move path, every other dragged non-container
/// against the containers' final rects. Container children whose container
/// moved with them keep their membership.
pub fn end_drag(
    session: &mut DragSession,
    store: &SpatialStore,
    pointer: Option<Point>,
    hysteresis: Hysteresis,
) -> DragOutcome {
    let pointer = pointer.or_else(|| {
        session
            .latest(&session.primary)
            .map(|p| p.offset(session.grab.x, session.grab.y))
    });
    let frame = match pointer {
        Some(p) => compute_frame(session, store, p, hysteresis, true),
        None => DragFrame::default(),
    };

    let containers = container_rects_after(store, &frame.positions);
    let primary_resolved = !session.primary_is_container && !session.is_group();
    let mut finals = frame.messages(session.primary, store);
    let mut outcome = DragOutcome::default();
    // `messages` yields one entry per position, in order.
    for ((id, rect), msg) in frame.positions.iter().zip(finals.iter_mut()) {
        let Some(obj) = store.get(id) else {
            continue;
        };
        let container = if *id == session.primary && primary_resolved {
            frame.container
        } else {
            release_container(obj, rect, session, &containers, hysteresis)
        };
        msg.container_id = container;

        let mut after = PartialObject::default();
        if obj.x.to_bits() != rect.x.to_bits() || obj.y.to_bits() != rect.y.to_bits() {
            after.x = Some(rect.x);
            after.y = Some(rect.y);
        }
        if obj.container_ref != container {
            after.container_ref = Some(container);
        }
        if after.is_empty() {
            continue;
        }
        let Some(before) = store.capture(id, &after) else {
            continue;
        };
        outcome.commits.push(Commit { id: *id, before, after });
    }
    outcome.finals = finals;
    tracing::debug!(primary = %session.primary, commits = outcome.commits.len(), "drag ended");
    outcome
}

/// Membership at release for a dragged object other than a lone primary.
fn release_container(
    obj: &SpatialObject,
    rect: &Rect,
    session: &DragSession,
    containers: &[(ObjectId, Rect)],
    hysteresis: Hysteresis,
) -> Option<ObjectId> {
    if obj.is_container() || obj.container_ref.is_some_and(|c| session.contains(&c)) {
        return obj.container_ref;
    }
    resolve_container(rect, obj.container_ref, containers, hysteresis)
}

fn compute_frame(
    session: &mut DragSession,
    store: &SpatialStore,
    pointer: Point,
    hysteresis: Hysteresis,
    evaluate_containment: bool,
) -> DragFrame {
    let Some(start) = session.start_rect(&session.primary) else {
        return DragFrame::default();
    };
    let mut origin = session.candidate_origin(pointer);

    if evaluate_containment && !session.primary_is_container && !session.is_group() {
        let containers = container_rects(store);
        let rect = start.at(origin);
        let resolved = resolve_container(&rect, session.container, &containers, hysteresis);
        origin = constrain_against_containers(&rect, &containers, resolved);
        session.container = resolved;
    }

    let mut frame = DragFrame { container: session.container, bulk: session.bulk, ..DragFrame::default() };
    let mut latest = Vec::with_capacity(session.total_dragged());
    if store.contains(&session.primary) {
        frame.positions.push((session.primary, start.at(origin)));
        latest.push((session.primary, origin));
    }
    for (id, p) in session.member_positions(origin) {
        if !store.contains(&id) {
            continue;
        }
        let Some(rect) = session.start_rect(&id) else {
            continue;
        };
        frame.positions.push((id, rect.at(p)));
        latest.push((id, p));
    }
    for (id, p) in latest {
        session.record_latest(id, p);
    }
    frame
}

/// Like [`container_rects`], with dragged containers at their new rects.
fn container_rects_after(store: &SpatialStore, positions: &[(ObjectId, Rect)]) -> Vec<(ObjectId, Rect)> {
    let moved: HashMap<ObjectId, Rect> = positions.iter().copied().collect();
    container_rects(store)
        .into_iter()
        .map(|(id, rect)| (id, moved.get(&id).copied().unwrap_or(rect)))
        .collect()
}

/// `(id, rect)` for every container in the store, topmost first.
fn container_rects(store: &SpatialStore) -> Vec<(ObjectId, Rect)> {
    store
        .containers()
        .iter()
        .filter_map(|id| store.get(id).map(|c| (*id, c.rect())))
        .collect()
}

// =============================================================
// Resize
// =============================================================

/// Begin resizing `id` from `anchor`. `None` if `id` is not in the store.
#[must_use]
pub fn start_resize(store: &SpatialStore, id: ObjectId, anchor: ResizeAnchor, pointer: Point) -> Option<ResizeSession> {
    let obj = store.get(&id)?;
    tracing::debug!(%id, ?anchor, "resize started");
    Some(ResizeSession::new(id, anchor, pointer, obj.rect()))
}

/// Rect for a pointer sample; remembered on the session.
pub fn resize_move(session: &mut ResizeSession, pointer: Point) -> Rect {
    let rect = session.rect_for(pointer, MIN_SIZE);
    session.latest = rect;
    rect
}

/// Finish a resize. `None` when the object vanished or nothing changed.
pub fn end_resize(session: &mut ResizeSession, store: &SpatialStore, pointer: Option<Point>) -> Option<Commit> {
    if let Some(p) = pointer {
        resize_move(session, p);
    }
    let obj = store.get(&session.id)?;
    if obj.rect() == session.latest {
        return None;
    }
    let after = PartialObject::rect(session.latest);
    let before = store.capture(&session.id, &after)?;
    Some(Commit { id: session.id, before, after })
}

// =============================================================
// Draw
// =============================================================

/// Begin drawing with `tool`. `None` for the select tool.
#[must_use]
pub fn begin_draw(tool: Tool, pointer: Point) -> Option<DrawSession> {
    if tool.shape_kind().is_none() && tool.connector_style().is_none() {
        return None;
    }
    Some(DrawSession::new(tool, pointer))
}

pub fn update_draw(session: &mut DrawSession, pointer: Point) {
    session.current = pointer;
}

/// Build the object or connector a draw produced. `id` names the result.
///
/// A new shape stacks above everything and, unless it is a container,
/// joins the first container passing the entry threshold.
#[must_use]
pub fn finish_draw(session: &DrawSession, store: &SpatialStore, id: ObjectId, hysteresis: Hysteresis) -> DrawOutcome {
    if let Some(kind) = session.tool.shape_kind() {
        let mut obj = SpatialObject::new(id, kind, session.rect());
        obj.stack_order = store.sorted_objects().last().map_or(0, |o| o.stack_order + 1);
        if !kind.is_container() {
            obj.container_ref = resolve_container(&obj.rect(), None, &container_rects(store), hysteresis);
        }
        return DrawOutcome::Shape(obj);
    }
    if let Some(style) = session.tool.connector_style() {
        return DrawOutcome::Connector(Connector {
            id,
            a: endpoint_at(store, session.anchor),
            b: endpoint_at(store, session.current),
            style,
        });
    }
    DrawOutcome::Nothing
}

fn endpoint_at(store: &SpatialStore, p: Point) -> Endpoint {
    store
        .top_object_at(p)
        .map_or(Endpoint::Free { x: p.x, y: p.y }, |id| Endpoint::Object { id })
}
