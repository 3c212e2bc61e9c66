//! Camera and viewport culling.
//!
//! The culler narrows the render set to objects near the screen. Visible
//! bounds are the viewport in canvas units, grown by a margin. They are only
//! recomputed after the pan moves more than `pan_hysteresis_px` screen
//! pixels or zoom changes by more than `zoom_hysteresis`, so recomputation
//! frequency is bounded by camera movement rather than pointer sampling.
//! Anything in the active drag set is always visible.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::collections::HashSet;

use crate::config::CoreConfig;
use crate::doc::ObjectId;
use crate::geom::{Point, Rect};

/// Camera state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in screen pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to canvas coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a canvas point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Copy with non-finite pan reset to 0 and a non-positive or non-finite
    /// zoom reset to 1.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            pan_x: finite_or(self.pan_x, 0.0),
            pan_y: finite_or(self.pan_y, 0.0),
            zoom: if self.zoom > 0.0 && self.zoom.is_finite() { self.zoom } else { 1.0 },
        }
    }

    /// Canvas-space rect covered by a `width` × `height` screen viewport.
    #[must_use]
    pub fn world_rect(&self, width: f64, height: f64) -> Rect {
        let origin = self.screen_to_world(Point::new(0.0, 0.0));
        Rect::new(origin.x, origin.y, width / self.zoom, height / self.zoom)
    }
}

/// Hysteresis-gated visibility filter.
#[derive(Debug, Clone)]
pub struct ViewportCuller {
    margin: f64,
    pan_hysteresis_px: f64,
    zoom_hysteresis: f64,
    /// Camera and viewport size the current bounds were computed from.
    anchor: Option<(Camera, f64, f64)>,
    bounds: Option<Rect>,
    recomputes: u64,
}

impl ViewportCuller {
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            margin: config.viewport_margin,
            pan_hysteresis_px: config.pan_hysteresis_px,
            zoom_hysteresis: config.zoom_hysteresis,
            anchor: None,
            bounds: None,
            recomputes: 0,
        }
    }

    /// Feed the current camera. Returns true if the visible bounds were recomputed.
    pub fn update(&mut self, camera: Camera, viewport_width: f64, viewport_height: f64) -> bool {
        let camera = camera.sanitized();
        if let Some((last, w, h)) = self.anchor {
            let pan_dx = camera.pan_x - last.pan_x;
            let pan_dy = camera.pan_y - last.pan_y;
            let pan_moved = (pan_dx * pan_dx + pan_dy * pan_dy).sqrt();
            let zoom_moved = (camera.zoom - last.zoom).abs();
            let resized = (w - viewport_width).abs() > f64::EPSILON || (h - viewport_height).abs() > f64::EPSILON;
            if pan_moved <= self.pan_hysteresis_px && zoom_moved <= self.zoom_hysteresis && !resized {
                return false;
            }
        }
        let view = camera.world_rect(viewport_width, viewport_height);
        self.bounds = Some(view.expanded(self.margin / camera.zoom));
        self.anchor = Some((camera, viewport_width, viewport_height));
        self.recomputes += 1;
        tracing::trace!(recomputes = self.recomputes, "visible bounds recomputed");
        true
    }

    /// Current visible bounds, if any camera has been fed.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Number of times the bounds have been recomputed.
    #[must_use]
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Whether an object should be rendered. Before the first camera update
    /// everything is visible.
    #[must_use]
    pub fn is_visible(&self, id: &ObjectId, rect: &Rect, dragging: &HashSet<ObjectId>) -> bool {
        if dragging.contains(id) {
            return true;
        }
        self.bounds.is_none_or(|b| b.intersects(rect))
    }
}
