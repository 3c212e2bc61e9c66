//! Containment geometry: overlap ratios, hysteresis, and push-out.
//!
//! Everything here is a pure function of rectangles. An object belongs to a
//! container when enough of its own area lies inside it. The thresholds are
//! asymmetric: a member leaves only below [`Hysteresis::exit`], a non-member
//! joins only at or above [`Hysteresis::enter`], so an object parked near a
//! container edge does not flicker in and out.
//!
//! Containers never constrain each other. Callers pass only non-container
//! geometry through [`constrain_against_containers`].

#[cfg(test)]
#[path = "containment_test.rs"]
mod containment_test;

use crate::config::Hysteresis;
use crate::doc::ObjectId;
use crate::geom::{Point, Rect};

/// Fraction of `rect`'s own area that lies inside `container`, in `[0, 1]`.
///
/// A zero-area `rect` yields `0.0`.
#[must_use]
pub fn overlap_ratio(rect: &Rect, container: &Rect) -> f64 {
    let area = rect.area();
    if area <= 0.0 || !area.is_finite() {
        return 0.0;
    }
    (rect.intersection_area(container) / area).clamp(0.0, 1.0)
}

/// True when `ratio` has dropped below `threshold`.
#[must_use]
pub fn should_pop_out(ratio: f64, threshold: f64) -> bool {
    ratio < threshold
}

/// True when `ratio` has reached `threshold`.
#[must_use]
pub fn should_pop_in(ratio: f64, threshold: f64) -> bool {
    ratio >= threshold
}

/// Next membership state for one container given the previous state and a new ratio.
#[must_use]
pub fn next_inside(inside: bool, ratio: f64, hysteresis: Hysteresis) -> bool {
    if inside {
        !should_pop_out(ratio, hysteresis.exit)
    } else {
        should_pop_in(ratio, hysteresis.enter)
    }
}

/// Top-left position that moves `rect` just outside `container` along the
/// shortest axis-aligned translation. Returns the input position when the
/// two do not overlap.
#[must_use]
pub fn push_outside_container(rect: &Rect, container: &Rect) -> Point {
    if rect.intersection_area(container) <= 0.0 {
        return rect.origin();
    }
    let candidates = [
        Point::new(container.left() - rect.width, rect.y),
        Point::new(container.right(), rect.y),
        Point::new(rect.x, container.top() - rect.height),
        Point::new(rect.x, container.bottom()),
    ];
    let mut best = candidates[0];
    let mut best_dist = translation(rect, best);
    for candidate in &candidates[1..] {
        let dist = translation(rect, *candidate);
        if dist < best_dist {
            best = *candidate;
            best_dist = dist;
        }
    }
    best
}

fn translation(rect: &Rect, to: Point) -> f64 {
    (to.x - rect.x).abs() + (to.y - rect.y).abs()
}

/// Push `rect` out of every container except `allowed`, returning the
/// adjusted top-left position.
///
/// Containers are applied in the order given; an object already clear of
/// every container comes back unchanged.
#[must_use]
pub fn constrain_against_containers(rect: &Rect, containers: &[(ObjectId, Rect)], allowed: Option<ObjectId>) -> Point {
    let mut current = *rect;
    for (id, container) in containers {
        if Some(*id) == allowed {
            continue;
        }
        current = current.at(push_outside_container(&current, container));
    }
    current.origin()
}

/// Resolve which container `rect` belongs to after a move.
///
/// A current member keeps its container until the exit threshold is crossed.
/// An object without a container (or one that just left, or whose container
/// vanished) joins the first container in `containers` that passes the entry
/// threshold. `containers` is expected topmost first.
#[must_use]
pub fn resolve_container(
    rect: &Rect,
    current: Option<ObjectId>,
    containers: &[(ObjectId, Rect)],
    hysteresis: Hysteresis,
) -> Option<ObjectId> {
    if let Some(current_id) = current
        && let Some((_, container)) = containers.iter().find(|(id, _)| *id == current_id)
        && next_inside(true, overlap_ratio(rect, container), hysteresis)
    {
        return Some(current_id);
    }
    containers
        .iter()
        .find(|(_, container)| next_inside(false, overlap_ratio(rect, container), hysteresis))
        .map(|(id, _)| *id)
}
