//! Position message codec for the realtime channel.
//!
//! DESIGN
//! ======
//! The transport is an external, lossy, unordered channel that carries a
//! message kind plus a JSON payload. Two kinds matter to the core:
//! `object:drag` (a transient position) and `object:drag:end` (the sender
//! released the object). Encoding and decoding live side by side so the
//! outgoing shape is always one the decoder accepts.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::doc::{ActorId, ObjectId};
use crate::geom::Point;

/// Message kind for a transient position.
pub const DRAG_KIND: &str = "object:drag";

/// Message kind for the end of a remote gesture.
pub const DRAG_END_KIND: &str = "object:drag:end";

/// Error returned by [`decode`].
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The message kind is not one the core handles.
    #[error("unknown message kind: {0}")]
    UnknownKind(String),
    /// The payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A coordinate or size was NaN or infinite.
    #[error("non-finite geometry for object {0}")]
    NonFinite(ObjectId),
}

/// Payload of an `object:drag` message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionMessage {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Container the sender currently resolves the object into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ObjectId>,
}

#[derive(Deserialize)]
struct DragEndPayload {
    id: ObjectId,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
}

/// A message the core asks the transport to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundMessage {
    Position(PositionMessage),
    DragEnd { id: ObjectId },
}

impl OutboundMessage {
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Position(p) => p.id,
            Self::DragEnd { id } => *id,
        }
    }

    /// Transport message kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Position(_) => DRAG_KIND,
            Self::DragEnd { .. } => DRAG_END_KIND,
        }
    }

    /// JSON payload for the transport.
    #[must_use]
    pub fn to_data(&self) -> Value {
        match self {
            Self::Position(p) => serde_json::json!({
                "id": p.id,
                "x": p.x,
                "y": p.y,
                "width": p.width,
                "height": p.height,
                "container_id": p.container_id,
            }),
            Self::DragEnd { id } => serde_json::json!({ "id": id }),
        }
    }
}

/// A decoded inbound message from another actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteUpdate {
    pub actor: ActorId,
    pub id: ObjectId,
    /// Absent on a bare drag-end.
    pub position: Option<Point>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub container_hint: Option<ObjectId>,
    pub is_end: bool,
}

impl RemoteUpdate {
    /// A plain position update.
    #[must_use]
    pub fn position(actor: ActorId, id: ObjectId, x: f64, y: f64) -> Self {
        Self {
            actor,
            id,
            position: Some(Point::new(x, y)),
            width: None,
            height: None,
            container_hint: None,
            is_end: false,
        }
    }

    /// A drag-end signal with no final position.
    #[must_use]
    pub fn end(actor: ActorId, id: ObjectId) -> Self {
        Self { actor, id, position: None, width: None, height: None, container_hint: None, is_end: true }
    }
}

/// Decode one inbound transport message.
///
/// # Errors
///
/// Returns [`WireError`] when the kind is unknown, the payload does not
/// parse, or it carries non-finite geometry.
pub fn decode(actor: ActorId, kind: &str, data: &Value) -> Result<RemoteUpdate, WireError> {
    match kind {
        DRAG_KIND => {
            let msg = PositionMessage::deserialize(data)?;
            let sizes_finite = msg.width.is_none_or(f64::is_finite) && msg.height.is_none_or(f64::is_finite);
            if !msg.x.is_finite() || !msg.y.is_finite() || !sizes_finite {
                return Err(WireError::NonFinite(msg.id));
            }
            Ok(RemoteUpdate {
                actor,
                id: msg.id,
                position: Some(Point::new(msg.x, msg.y)),
                width: msg.width,
                height: msg.height,
                container_hint: msg.container_id,
                is_end: false,
            })
        }
        DRAG_END_KIND => {
            let msg = DragEndPayload::deserialize(data)?;
            let position = match (msg.x, msg.y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Point::new(x, y)),
                _ => None,
            };
            Ok(RemoteUpdate { position, ..RemoteUpdate::end(actor, msg.id) })
        }
        other => Err(WireError::UnknownKind(other.to_owned())),
    }
}
