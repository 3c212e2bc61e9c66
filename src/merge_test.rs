#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::doc::ObjectKind;
use crate::wire::RemoteUpdate;

fn id(n: u128) -> ObjectId {
    Uuid::from_u128(n)
}

fn note(n: u128, x: f64, y: f64) -> SpatialObject {
    SpatialObject::new(id(n), ObjectKind::Note, Rect::new(x, y, 20.0, 20.0))
}

fn container(n: u128, x: f64, y: f64) -> SpatialObject {
    SpatialObject::new(id(n), ObjectKind::Container, Rect::new(x, y, 200.0, 200.0))
}

fn child(n: u128, parent: u128, x: f64, y: f64) -> SpatialObject {
    let mut obj = note(n, x, y);
    obj.container_ref = Some(id(parent));
    obj
}

fn near(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

fn merge() -> LiveMerge {
    LiveMerge::new(Hysteresis::default())
}

fn previews() -> RemotePreviews {
    RemotePreviews::new(300, 6000)
}

fn find(scene: &MergedScene, n: u128) -> Arc<ResolvedObject> {
    scene
        .objects
        .iter()
        .find(|o| o.object.id == id(n))
        .cloned()
        .unwrap()
}

// =============================================================
// Source precedence
// =============================================================

#[test]
fn confirmed_only_passes_through() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 5.0, 6.0));
    let scene = merge().resolve(&store, &previews());
    let o = find(&scene, 1);
    assert_eq!(o.source, Source::Confirmed);
    assert_eq!((o.object.x, o.object.y), (5.0, 6.0));
}

#[test]
fn local_overrides_remote_for_same_object() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    let mut remote = previews();
    remote.apply(&RemoteUpdate::position(id(100), id(1), 500.0, 500.0), 10);
    let mut m = merge();
    m.set_local(id(1), Rect::new(40.0, 50.0, 20.0, 20.0));
    let o = find(&m.resolve(&store, &remote), 1);
    assert_eq!(o.source, Source::Local);
    assert_eq!((o.object.x, o.object.y), (40.0, 50.0));
}

#[test]
fn remote_preview_applies_without_local() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    let mut remote = previews();
    let mut update = RemoteUpdate::position(id(100), id(1), 500.0, 400.0);
    update.width = Some(80.0);
    remote.apply(&update, 10);
    let o = find(&merge().resolve(&store, &remote), 1);
    assert_eq!(o.source, Source::Remote);
    assert_eq!((o.object.x, o.object.y, o.object.width, o.object.height), (500.0, 400.0, 80.0, 20.0));
}

#[test]
fn remote_preview_never_mutates_store() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    let mut remote = previews();
    remote.apply(&RemoteUpdate::position(id(100), id(1), 500.0, 400.0), 10);
    merge().resolve(&store, &remote);
    assert_eq!(store.get(&id(1)).unwrap().x, 0.0);
}

#[test]
fn clearing_local_reverts_to_confirmed() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    let mut m = merge();
    m.set_local(id(1), Rect::new(40.0, 50.0, 20.0, 20.0));
    m.clear_local(&id(1));
    assert_eq!(find(&m.resolve(&store, &previews()), 1).source, Source::Confirmed);
    assert_eq!(m.local_count(), 0);
}

// =============================================================
// Cohesion inference
// =============================================================

#[test]
fn child_follows_container_remote_delta() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 0.0, 0.0));
    store.insert(child(1, 10, 50.0, 50.0));
    let mut remote = previews();
    // Container moved by (+100, +30); the child's packet was dropped.
    remote.apply(&RemoteUpdate::position(id(100), id(10), 100.0, 30.0), 10);
    let scene = merge().resolve(&store, &remote);
    let c = find(&scene, 1);
    assert_eq!(c.source, Source::Cohesion);
    assert_eq!((c.object.x, c.object.y), (150.0, 80.0));
}

#[test]
fn child_with_own_transient_is_not_overridden() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 0.0, 0.0));
    store.insert(child(1, 10, 50.0, 50.0));
    let mut remote = previews();
    remote.apply(&RemoteUpdate::position(id(100), id(10), 100.0, 30.0), 10);
    remote.apply(&RemoteUpdate::position(id(100), id(1), 151.0, 81.0), 10);
    let c = find(&merge().resolve(&store, &remote), 1);
    assert_eq!(c.source, Source::Remote);
    assert_eq!((c.object.x, c.object.y), (151.0, 81.0));
}

#[test]
fn cohesion_children_do_not_pop_out() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 0.0, 0.0));
    store.insert(child(1, 10, 50.0, 50.0));
    let mut m = merge();
    m.set_local(id(10), Rect::new(1000.0, 1000.0, 200.0, 200.0));
    let scene = m.resolve(&store, &previews());
    assert!(scene.popped_out.is_empty());
}

// =============================================================
// Entering / popped-out previews
// =============================================================

#[test]
fn unowned_object_entering_container_preview() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 100.0, 100.0));
    store.insert(note(1, 0.0, 0.0));
    let mut m = merge();
    m.set_local(id(1), Rect::new(150.0, 150.0, 20.0, 20.0));
    let scene = m.resolve(&store, &previews());
    assert_eq!(scene.entering, vec![(id(1), id(10))]);
    assert_eq!(find(&scene, 1).preview, Preview::Entering(id(10)));
    // Confirmed membership untouched.
    assert_eq!(store.get(&id(1)).unwrap().container_ref, None);
}

#[test]
fn unowned_object_in_dead_zone_has_no_preview() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 100.0, 100.0));
    store.insert(note(1, 0.0, 0.0));
    let mut m = merge();
    // Half inside horizontally.
    m.set_local(id(1), Rect::new(90.0, 150.0, 20.0, 20.0));
    let scene = m.resolve(&store, &previews());
    assert!(scene.entering.is_empty());
}

#[test]
fn member_leaving_renders_popped_out_on_top() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 0.0, 0.0));
    store.insert(child(1, 10, 50.0, 50.0));
    let mut top = note(2, 900.0, 900.0);
    top.stack_order = 50;
    store.insert(top);
    let mut m = merge();
    m.set_local(id(1), Rect::new(500.0, 500.0, 20.0, 20.0));
    let scene = m.resolve(&store, &previews());
    assert_eq!(scene.popped_out, vec![id(1)]);
    assert_eq!(scene.objects.last().unwrap().object.id, id(1));
    assert_eq!(store.get(&id(1)).unwrap().container_ref, Some(id(10)));
}

#[test]
fn member_in_dead_zone_stays_inside() {
    let mut store = SpatialStore::new();
    store.insert(container(10, 0.0, 0.0));
    store.insert(child(1, 10, 50.0, 50.0));
    let mut m = merge();
    m.set_local(id(1), Rect::new(190.0, 50.0, 20.0, 20.0));
    let scene = m.resolve(&store, &previews());
    assert!(scene.popped_out.is_empty());
}

// =============================================================
// Snapshot reuse
// =============================================================

#[test]
fn unchanged_objects_reuse_snapshot() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    store.insert(note(2, 50.0, 0.0));
    let mut m = merge();
    let first = m.resolve(&store, &previews());
    m.set_local(id(2), Rect::new(60.0, 0.0, 20.0, 20.0));
    let second = m.resolve(&store, &previews());
    assert!(Arc::ptr_eq(&find(&first, 1), &find(&second, 1)));
    assert!(!Arc::ptr_eq(&find(&first, 2), &find(&second, 2)));
    let third = m.resolve(&store, &previews());
    assert!(Arc::ptr_eq(&find(&second, 2), &find(&third, 2)));
}

#[test]
fn draw_order_follows_stack_then_id() {
    let mut store = SpatialStore::new();
    let mut a = note(3, 0.0, 0.0);
    a.stack_order = 1;
    store.insert(a);
    store.insert(note(2, 0.0, 0.0));
    store.insert(note(1, 0.0, 0.0));
    let scene = merge().resolve(&store, &previews());
    let order: Vec<ObjectId> = scene.objects.iter().map(|o| o.object.id).collect();
    assert_eq!(order, vec![id(1), id(2), id(3)]);
    assert_eq!(scene.rect_of(&id(3)), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
}

// =============================================================
// Connectors
// =============================================================

#[test]
fn connector_anchors_on_facing_edges() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    store.insert(note(2, 100.0, 0.0));
    let scene = merge().resolve(&store, &previews());
    let conn = Connector {
        id: id(50),
        a: Endpoint::Object { id: id(1) },
        b: Endpoint::Object { id: id(2) },
        style: ConnectorStyle::Arrow,
    };
    let resolved = resolve_connector(&conn, &scene.rects()).unwrap();
    assert!(near(resolved.from, Point::new(20.0, 10.0)));
    assert!(near(resolved.to, Point::new(100.0, 10.0)));
}

#[test]
fn connector_follows_transient_position() {
    let mut store = SpatialStore::new();
    store.insert(note(1, 0.0, 0.0));
    let mut m = merge();
    m.set_local(id(1), Rect::new(200.0, 0.0, 20.0, 20.0));
    let scene = m.resolve(&store, &previews());
    let conn = Connector {
        id: id(50),
        a: Endpoint::Free { x: 0.0, y: 10.0 },
        b: Endpoint::Object { id: id(1) },
        style: ConnectorStyle::Line,
    };
    let resolved = resolve_connector(&conn, &scene.rects()).unwrap();
    assert!(near(resolved.from, Point::new(0.0, 10.0)));
    assert!(near(resolved.to, Point::new(200.0, 10.0)));
}

#[test]
fn connector_to_missing_object_is_skipped() {
    let conn = Connector {
        id: id(50),
        a: Endpoint::Free { x: 0.0, y: 0.0 },
        b: Endpoint::Object { id: id(9) },
        style: ConnectorStyle::Line,
    };
    assert!(resolve_connector(&conn, &HashMap::new()).is_none());
}
