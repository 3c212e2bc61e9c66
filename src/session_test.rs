#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

fn id(n: u128) -> ObjectId {
    Uuid::from_u128(n)
}

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_shape_and_connector_kinds_are_exclusive() {
    for tool in [
        Tool::Select,
        Tool::Note,
        Tool::Rectangle,
        Tool::Ellipse,
        Tool::Container,
        Tool::Line,
        Tool::Arrow,
    ] {
        assert!(!(tool.shape_kind().is_some() && tool.connector_style().is_some()));
    }
    assert_eq!(Tool::Container.shape_kind(), Some(ObjectKind::Container));
    assert_eq!(Tool::Arrow.connector_style(), Some(ConnectorStyle::Arrow));
    assert_eq!(Tool::Select.shape_kind(), None);
}

// =============================================================
// DragSession
// =============================================================

#[test]
fn drag_session_offsets_relative_to_primary() {
    let mut s = DragSession::new(id(1), Rect::new(100.0, 100.0, 50.0, 50.0), false, Point::new(110.0, 120.0));
    assert!(s.add_member(id(2), Rect::new(130.0, 90.0, 10.0, 10.0), MemberRole::Group));
    let m = s.members()[0];
    assert_eq!((m.dx, m.dy), (30.0, -10.0));
    assert_eq!(s.grab, Point::new(10.0, 20.0));
    assert_eq!(s.total_dragged(), 2);
    assert!(s.is_group());
}

#[test]
fn drag_session_ignores_duplicate_members() {
    let mut s = DragSession::new(id(1), Rect::new(0.0, 0.0, 10.0, 10.0), true, Point::new(0.0, 0.0));
    assert!(s.add_member(id(2), Rect::new(1.0, 1.0, 1.0, 1.0), MemberRole::ContainerChild));
    assert!(!s.add_member(id(2), Rect::new(1.0, 1.0, 1.0, 1.0), MemberRole::Group));
    assert!(!s.add_member(id(1), Rect::new(1.0, 1.0, 1.0, 1.0), MemberRole::Group));
    assert_eq!(s.total_dragged(), 2);
    assert_eq!(s.count(MemberRole::ContainerChild), 1);
    assert!(!s.is_group());
}

#[test]
fn drag_session_member_positions_follow_primary() {
    let mut s = DragSession::new(id(1), Rect::new(0.0, 0.0, 10.0, 10.0), false, Point::new(5.0, 5.0));
    s.add_member(id(2), Rect::new(20.0, 0.0, 10.0, 10.0), MemberRole::Group);
    let primary = s.candidate_origin(Point::new(55.0, 80.0));
    assert_eq!(primary, Point::new(50.0, 75.0));
    let positions: Vec<_> = s.member_positions(primary).collect();
    assert_eq!(positions, vec![(id(2), Point::new(70.0, 75.0))]);
}

#[test]
fn drag_session_ids_primary_first() {
    let mut s = DragSession::new(id(5), Rect::new(0.0, 0.0, 10.0, 10.0), false, Point::new(0.0, 0.0));
    s.add_member(id(3), Rect::new(0.0, 0.0, 10.0, 10.0), MemberRole::Group);
    s.add_member(id(4), Rect::new(0.0, 0.0, 10.0, 10.0), MemberRole::Group);
    let ids: Vec<_> = s.ids().collect();
    assert_eq!(ids, vec![id(5), id(3), id(4)]);
    assert!(s.contains(&id(4)));
    assert!(!s.contains(&id(9)));
}

// =============================================================
// ResizeSession
// =============================================================

#[test]
fn resize_se_grows_width_and_height() {
    let s = ResizeSession::new(id(1), ResizeAnchor::Se, Point::new(100.0, 100.0), Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(s.rect_for(Point::new(150.0, 120.0), 1.0), Rect::new(0.0, 0.0, 150.0, 120.0));
}

#[test]
fn resize_nw_moves_origin() {
    let s = ResizeSession::new(id(1), ResizeAnchor::Nw, Point::new(0.0, 0.0), Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(s.rect_for(Point::new(10.0, 20.0), 1.0), Rect::new(10.0, 20.0, 90.0, 80.0));
}

#[test]
fn resize_never_inverts() {
    let s = ResizeSession::new(id(1), ResizeAnchor::E, Point::new(100.0, 50.0), Rect::new(0.0, 0.0, 100.0, 100.0));
    let r = s.rect_for(Point::new(-500.0, 50.0), 1.0);
    assert_eq!(r.width, 1.0);
    assert_eq!(r.x, 0.0);
}

#[test]
fn resize_n_only_touches_top() {
    let s = ResizeSession::new(id(1), ResizeAnchor::N, Point::new(50.0, 0.0), Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(s.rect_for(Point::new(90.0, -10.0), 1.0), Rect::new(0.0, -10.0, 100.0, 110.0));
}

// =============================================================
// DrawSession
// =============================================================

#[test]
fn draw_rect_normalizes_drag_direction() {
    let mut s = DrawSession::new(Tool::Rectangle, Point::new(100.0, 100.0));
    s.current = Point::new(40.0, 160.0);
    assert_eq!(s.rect(), Rect::new(40.0, 100.0, 60.0, 60.0));
}

#[test]
fn gesture_default_is_idle() {
    assert!(matches!(Gesture::default(), Gesture::Idle));
}
