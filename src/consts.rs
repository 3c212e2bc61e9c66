//! Shared numeric constants for the manipulation core.

// ── Containment ─────────────────────────────────────────────────

/// An object inside a container leaves it only when its overlap ratio drops below this.
pub const EXIT_THRESHOLD: f64 = 0.45;

/// An object outside every container joins one only when its overlap ratio reaches this.
pub const ENTER_THRESHOLD: f64 = 0.55;

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height an object may have, in canvas units.
pub const MIN_SIZE: f64 = 1.0;

// ── Drag sessions ───────────────────────────────────────────────

/// Co-dragged object count at which a drag switches to the bulk path.
pub const BULK_DRAG_THRESHOLD: usize = 20;

// ── Broadcast ───────────────────────────────────────────────────

/// Minimum spacing between position messages for one object.
pub const BROADCAST_INTERVAL_MS: i64 = 50;

/// Re-send period for held gestures with no new movement.
pub const HEARTBEAT_INTERVAL_MS: i64 = 600;

/// Delay between a remote drag-end and clearing its preview.
pub const DRAG_END_GRACE_MS: i64 = 300;

/// Remote previews with no update for this long are dropped.
pub const PREVIEW_STALE_MS: i64 = 6000;

// ── Viewport ────────────────────────────────────────────────────

/// Extra margin around the viewport that still counts as visible.
pub const VIEWPORT_MARGIN: f64 = 200.0;

/// Pan distance in screen pixels before visible bounds are recomputed.
pub const VIEWPORT_PAN_HYSTERESIS_PX: f64 = 100.0;

/// Zoom change before visible bounds are recomputed.
pub const VIEWPORT_ZOOM_HYSTERESIS: f64 = 0.02;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries retained.
pub const UNDO_MAX_DEPTH: usize = 30;
