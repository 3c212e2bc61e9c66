//! Runtime tunables for the manipulation core.
//!
//! DESIGN
//! ======
//! Every threshold and timer the core uses lives in [`CoreConfig`]. Defaults
//! come from [`crate::consts`]; hosts that want to experiment can override
//! individual values through `BOARD_*` environment variables. Unparseable
//! values fall back to the default rather than failing startup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{
    BROADCAST_INTERVAL_MS, BULK_DRAG_THRESHOLD, DRAG_END_GRACE_MS, ENTER_THRESHOLD, EXIT_THRESHOLD,
    HEARTBEAT_INTERVAL_MS, PREVIEW_STALE_MS, UNDO_MAX_DEPTH, VIEWPORT_MARGIN, VIEWPORT_PAN_HYSTERESIS_PX,
    VIEWPORT_ZOOM_HYSTERESIS,
};

/// Hysteresis pair used for every containment decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    /// Ratio below which a member leaves its container.
    pub exit: f64,
    /// Ratio at or above which a non-member joins a container.
    pub enter: f64,
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self { exit: EXIT_THRESHOLD, enter: ENTER_THRESHOLD }
    }
}

/// All tunables consumed by the engine and its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreConfig {
    pub hysteresis: Hysteresis,
    /// Co-dragged count that switches a drag to the bulk path.
    pub bulk_threshold: usize,
    pub broadcast_interval_ms: i64,
    pub heartbeat_interval_ms: i64,
    pub drag_end_grace_ms: i64,
    pub preview_stale_ms: i64,
    /// Viewport margin in canvas units at zoom 1.
    pub viewport_margin: f64,
    pub pan_hysteresis_px: f64,
    pub zoom_hysteresis: f64,
    pub undo_depth: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hysteresis: Hysteresis::default(),
            bulk_threshold: BULK_DRAG_THRESHOLD,
            broadcast_interval_ms: BROADCAST_INTERVAL_MS,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            drag_end_grace_ms: DRAG_END_GRACE_MS,
            preview_stale_ms: PREVIEW_STALE_MS,
            viewport_margin: VIEWPORT_MARGIN,
            pan_hysteresis_px: VIEWPORT_PAN_HYSTERESIS_PX,
            zoom_hysteresis: VIEWPORT_ZOOM_HYSTERESIS,
            undo_depth: UNDO_MAX_DEPTH,
        }
    }
}

impl CoreConfig {
    /// Build a config from defaults overridden by `BOARD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let hysteresis = Hysteresis {
            exit: env_parse("BOARD_EXIT_THRESHOLD", defaults.hysteresis.exit),
            enter: env_parse("BOARD_ENTER_THRESHOLD", defaults.hysteresis.enter),
        };
        let config = Self {
            hysteresis,
            bulk_threshold: env_parse("BOARD_BULK_THRESHOLD", defaults.bulk_threshold),
            broadcast_interval_ms: env_parse("BOARD_BROADCAST_INTERVAL_MS", defaults.broadcast_interval_ms),
            heartbeat_interval_ms: env_parse("BOARD_HEARTBEAT_INTERVAL_MS", defaults.heartbeat_interval_ms),
            drag_end_grace_ms: env_parse("BOARD_DRAG_END_GRACE_MS", defaults.drag_end_grace_ms),
            preview_stale_ms: env_parse("BOARD_PREVIEW_STALE_MS", defaults.preview_stale_ms),
            viewport_margin: env_parse("BOARD_VIEWPORT_MARGIN", defaults.viewport_margin),
            pan_hysteresis_px: env_parse("BOARD_PAN_HYSTERESIS_PX", defaults.pan_hysteresis_px),
            zoom_hysteresis: env_parse("BOARD_ZOOM_HYSTERESIS", defaults.zoom_hysteresis),
            undo_depth: env_parse("BOARD_UNDO_DEPTH", defaults.undo_depth),
        };
        tracing::debug!(?config, "core config loaded");
        config
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
