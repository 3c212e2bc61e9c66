//! Outgoing position throttle with heartbeat and drag-end flush.
//!
//! DESIGN
//! ======
//! Each dragged object has its own channel. A position offered within
//! `interval_ms` of the previous send is parked as pending and goes out on
//! the next [`Throttler::tick`] once the interval has elapsed; only the
//! newest pending position survives. While a gesture is held still the tick
//! re-sends the last position every `heartbeat_ms` so remote previews never
//! hit their staleness timeout mid-gesture.
//!
//! [`Throttler::finish`] always emits the true final position before the
//! drag-end, so receivers never see an end signal ahead of the last move.

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod broadcast_test;

use std::collections::HashMap;

use crate::doc::ObjectId;
use crate::wire::{OutboundMessage, PositionMessage};

#[derive(Debug, Clone, Copy)]
struct Channel {
    last_sent_at: i64,
    last: PositionMessage,
    pending: Option<PositionMessage>,
}

/// Per-object rate limiter for outgoing position messages.
#[derive(Debug, Clone)]
pub struct Throttler {
    interval_ms: i64,
    heartbeat_ms: i64,
    channels: HashMap<ObjectId, Channel>,
}

impl Throttler {
    #[must_use]
    pub fn new(interval_ms: i64, heartbeat_ms: i64) -> Self {
        Self { interval_ms, heartbeat_ms, channels: HashMap::new() }
    }

    /// Offer a new position. Returns the message to send now, if the
    /// object's interval has elapsed; otherwise it is parked as pending.
    pub fn offer(&mut self, msg: PositionMessage, now_ms: i64) -> Option<OutboundMessage> {
        let interval = self.interval_ms;
        match self.channels.get_mut(&msg.id) {
            Some(ch) if now_ms - ch.last_sent_at < interval => {
                ch.pending = Some(msg);
                None
            }
            Some(ch) => {
                ch.last_sent_at = now_ms;
                ch.last = msg;
                ch.pending = None;
                Some(OutboundMessage::Position(msg))
            }
            None => {
                self.channels
                    .insert(msg.id, Channel { last_sent_at: now_ms, last: msg, pending: None });
                Some(OutboundMessage::Position(msg))
            }
        }
    }

    /// Flush pending positions whose interval elapsed and emit heartbeats
    /// for channels idle longer than the heartbeat period.
    pub fn tick(&mut self, now_ms: i64) -> Vec<OutboundMessage> {
        let mut ids: Vec<ObjectId> = self.channels.keys().copied().collect();
        ids.sort_unstable();
        let mut out = Vec::new();
        for id in ids {
            let Some(ch) = self.channels.get_mut(&id) else {
                continue;
            };
            let idle = now_ms - ch.last_sent_at;
            if let Some(pending) = ch.pending {
                if idle >= self.interval_ms {
                    ch.last = pending;
                    ch.pending = None;
                    ch.last_sent_at = now_ms;
                    out.push(OutboundMessage::Position(pending));
                }
            } else if idle >= self.heartbeat_ms {
                ch.last_sent_at = now_ms;
                tracing::trace!(%id, "heartbeat");
                out.push(OutboundMessage::Position(ch.last));
            }
        }
        out
    }

    /// Close an object's channel: the final position (or, failing that, any
    /// pending one) followed by a drag-end.
    pub fn finish(&mut self, id: ObjectId, final_position: Option<PositionMessage>) -> Vec<OutboundMessage> {
        let pending = self.channels.remove(&id).and_then(|ch| ch.pending);
        let mut out = Vec::with_capacity(2);
        if let Some(msg) = final_position.or(pending) {
            out.push(OutboundMessage::Position(msg));
        }
        out.push(OutboundMessage::DragEnd { id });
        out
    }

    #[must_use]
    pub fn is_active(&self, id: &ObjectId) -> bool {
        self.channels.contains_key(id)
    }

    #[must_use]
    pub fn has_pending(&self, id: &ObjectId) -> bool {
        self.channels.get(id).is_some_and(|ch| ch.pending.is_some())
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.channels.len()
    }
}
