//! Gesture value objects: drag, resize, and draw sessions.
//!
//! Each session is created on pointer-down, owned by exactly one controller
//! for its lifetime, and destroyed on release (or cancel, for draws). A
//! session carries everything needed to compute per-frame positions and to
//! diff start against final state when it commits.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use crate::doc::{ConnectorStyle, ObjectId, ObjectKind};
use crate::geom::{Point, Rect};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    Note,
    Rectangle,
    Ellipse,
    Container,
    Line,
    Arrow,
}

impl Tool {
    /// The object kind this tool draws, if it draws a shape.
    #[must_use]
    pub fn shape_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Note => Some(ObjectKind::Note),
            Self::Rectangle => Some(ObjectKind::Rectangle),
            Self::Ellipse => Some(ObjectKind::Ellipse),
            Self::Container => Some(ObjectKind::Container),
            Self::Select | Self::Line | Self::Arrow => None,
        }
    }

    /// The connector style this tool draws, if it draws a connector.
    #[must_use]
    pub fn connector_style(self) -> Option<ConnectorStyle> {
        match self {
            Self::Line => Some(ConnectorStyle::Line),
            Self::Arrow => Some(ConnectorStyle::Arrow),
            _ => None,
        }
    }
}

/// Why a member is moving with the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Part of the same multi-selection.
    Group,
    /// Contained in a dragged container.
    ContainerChild,
}

/// A co-dragged object with its offset from the primary, frozen at start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberOffset {
    pub id: ObjectId,
    pub dx: f64,
    pub dy: f64,
    pub role: MemberRole,
}

/// State of one in-progress drag.
///
/// The offset table is frozen for the gesture's lifetime; only
/// `container` (the primary's prospective membership) and the last
/// computed positions change between moves.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub primary: ObjectId,
    pub primary_is_container: bool,
    /// Pointer position minus primary top-left at gesture start.
    pub grab: Point,
    /// Co-dragged members in capture order.
    members: Vec<MemberOffset>,
    /// Start rect for the primary and every member.
    start: HashMap<ObjectId, Rect>,
    /// Primary's container at gesture start.
    pub start_container: Option<ObjectId>,
    /// Primary's container as resolved by the latest move.
    pub container: Option<ObjectId>,
    pub bulk: bool,
    /// Latest top-left per dragged id.
    latest: HashMap<ObjectId, Point>,
}

impl DragSession {
    #[must_use]
    pub fn new(primary: ObjectId, primary_rect: Rect, primary_is_container: bool, pointer: Point) -> Self {
        let mut start = HashMap::new();
        start.insert(primary, primary_rect);
        let mut latest = HashMap::new();
        latest.insert(primary, primary_rect.origin());
        Self {
            primary,
            primary_is_container,
            grab: pointer.delta_from(primary_rect.origin()),
            members: Vec::new(),
            start,
            start_container: None,
            container: None,
            bulk: false,
            latest,
        }
    }

    /// Capture a co-dragged member. Ignored if `id` is already tracked.
    pub fn add_member(&mut self, id: ObjectId, rect: Rect, role: MemberRole) -> bool {
        if self.start.contains_key(&id) {
            return false;
        }
        let Some(primary) = self.start.get(&self.primary) else {
            return false;
        };
        let offset = rect.origin().delta_from(primary.origin());
        self.members.push(MemberOffset { id, dx: offset.x, dy: offset.y, role });
        self.start.insert(id, rect);
        self.latest.insert(id, rect.origin());
        true
    }

    #[must_use]
    pub fn members(&self) -> &[MemberOffset] {
        &self.members
    }

    /// Number of members with `role`.
    #[must_use]
    pub fn count(&self, role: MemberRole) -> usize {
        self.members.iter().filter(|m| m.role == role).count()
    }

    /// Primary plus every member.
    #[must_use]
    pub fn total_dragged(&self) -> usize {
        1 + self.members.len()
    }

    /// Whether the primary moves as part of a multi-selection.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.count(MemberRole::Group) > 0
    }

    #[must_use]
    pub fn start_rect(&self, id: &ObjectId) -> Option<Rect> {
        self.start.get(id).copied()
    }

    /// All dragged ids: primary first, then members in capture order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::once(self.primary).chain(self.members.iter().map(|m| m.id))
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.start.contains_key(id)
    }

    /// Candidate top-left for the primary given the pointer position.
    #[must_use]
    pub fn candidate_origin(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.grab.x, pointer.y - self.grab.y)
    }

    /// Positions for every member given the primary's top-left.
    pub fn member_positions(&self, primary: Point) -> impl Iterator<Item = (ObjectId, Point)> + '_ {
        self.members
            .iter()
            .map(move |m| (m.id, primary.offset(m.dx, m.dy)))
    }

    pub fn record_latest(&mut self, id: ObjectId, p: Point) {
        self.latest.insert(id, p);
    }

    #[must_use]
    pub fn latest(&self, id: &ObjectId) -> Option<Point> {
        self.latest.get(id).copied()
    }
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Which edges this anchor moves: (left, top, right, bottom).
    #[must_use]
    pub fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Self::N => (false, true, false, false),
            Self::Ne => (false, true, true, false),
            Self::E => (false, false, true, false),
            Self::Se => (false, false, true, true),
            Self::S => (false, false, false, true),
            Self::Sw => (true, false, false, true),
            Self::W => (true, false, false, false),
            Self::Nw => (true, true, false, false),
        }
    }
}

/// State of one in-progress resize.
#[derive(Debug, Clone, Copy)]
pub struct ResizeSession {
    pub id: ObjectId,
    pub anchor: ResizeAnchor,
    pub start_pointer: Point,
    pub start_rect: Rect,
    pub latest: Rect,
}

impl ResizeSession {
    #[must_use]
    pub fn new(id: ObjectId, anchor: ResizeAnchor, start_pointer: Point, start_rect: Rect) -> Self {
        Self { id, anchor, start_pointer, start_rect, latest: start_rect }
    }

    /// Rect after moving the anchored edges by the pointer delta.
    ///
    /// Edges never cross: a dragged edge stops `min_size` from its opposite.
    #[must_use]
    pub fn rect_for(&self, pointer: Point, min_size: f64) -> Rect {
        let d = pointer.delta_from(self.start_pointer);
        let (l, t, r, b) = self.anchor.edges();
        let s = self.start_rect;
        let mut left = s.left();
        let mut top = s.top();
        let mut right = s.right();
        let mut bottom = s.bottom();
        if l {
            left = (left + d.x).min(right - min_size);
        }
        if r {
            right = (right + d.x).max(left + min_size);
        }
        if t {
            top = (top + d.y).min(bottom - min_size);
        }
        if b {
            bottom = (bottom + d.y).max(top + min_size);
        }
        Rect::new(left, top, right - left, bottom - top)
    }
}

/// State of one in-progress draw. Cancelling it never touches the store.
#[derive(Debug, Clone, Copy)]
pub struct DrawSession {
    pub tool: Tool,
    pub anchor: Point,
    pub current: Point,
}

impl DrawSession {
    #[must_use]
    pub fn new(tool: Tool, anchor: Point) -> Self {
        Self { tool, anchor, current: anchor }
    }

    /// Normalized rect spanned by anchor and current pointer.
    #[must_use]
    pub fn rect(&self) -> Rect {
        let x = self.anchor.x.min(self.current.x);
        let y = self.anchor.y.min(self.current.y);
        Rect::new(x, y, (self.anchor.x - self.current.x).abs(), (self.anchor.y - self.current.y).abs())
    }
}

/// The gesture currently owned by the local actor.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
    Drawing(DrawSession),
}
