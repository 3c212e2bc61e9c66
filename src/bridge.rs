//! tokio adapter: drives engine timers and forwards actions to the host.
//!
//! The engine itself is synchronous and clock-agnostic. Hosts running on a
//! tokio runtime share it behind an async mutex, spawn [`spawn_ticker`] to
//! advance throttles, heartbeats and preview GC, and drain the action
//! channel from their transport/persistence tasks.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{Action, Engine};

/// Engine shared between input handlers and the ticker.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Error returned when forwarding actions.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The receiving half of the action channel was dropped.
    #[error("action channel closed")]
    Closed,
}

/// Milliseconds since the Unix epoch from the system clock.
#[must_use]
pub fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Send every action in order. Returns how many were sent.
///
/// # Errors
///
/// Returns [`BridgeError::Closed`] if the receiver is gone.
pub async fn forward(actions: Vec<Action>, tx: &mpsc::Sender<Action>) -> Result<usize, BridgeError> {
    let count = actions.len();
    for action in actions {
        tx.send(action).await.map_err(|_| BridgeError::Closed)?;
    }
    Ok(count)
}

/// Spawn a task that calls [`Engine::tick`] every `period` and forwards the
/// resulting actions. The task ends when the receiver is dropped.
pub fn spawn_ticker<C>(engine: SharedEngine, tx: mpsc::Sender<Action>, period: Duration, clock: C) -> JoinHandle<()>
where
    C: Fn() -> i64 + Send + 'static,
{
    tracing::info!(?period, "engine ticker started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            let actions = engine.lock().await.tick(clock());
            if actions.is_empty() {
                continue;
            }
            if let Err(e) = forward(actions, &tx).await {
                tracing::debug!(error = %e, "engine ticker stopping");
                break;
            }
        }
        tracing::info!("engine ticker stopped");
    })
}
