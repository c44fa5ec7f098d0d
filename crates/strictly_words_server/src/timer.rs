//! Cancellable per-game timers.
//!
//! Each game owns at most one turn timer and one game clock. Scheduling a
//! timer replaces the previous one of the same kind. A firing timer
//! releases its own slot before doing any work, so the work may schedule
//! the next timer without aborting itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, instrument, trace};

/// Which of a game's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    /// Time left for the current turn.
    Turn,
    /// Time left for the whole game.
    GameClock,
}

#[derive(Debug)]
struct Scheduled {
    generation: u64,
    handle: AbortHandle,
}

/// Registry of running timer tasks.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    slots: Arc<Mutex<HashMap<(String, TimerKind), Scheduled>>>,
    generation: Arc<AtomicU64>,
}

impl Timers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `on_expiry` after `delay` unless cancelled or replaced first.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, on_expiry), fields(delay_ms = delay.as_millis() as u64))]
    pub fn schedule<F>(&self, game_id: &str, kind: TimerKind, delay: Duration, on_expiry: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let key = (game_id.to_string(), kind);
        let timers = self.clone();
        let task_key = key.clone();

        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            timers.release(&task_key, generation);
            trace!(game_id = %task_key.0, kind = %task_key.1, "Timer fired");
            on_expiry.await;
        })
        .abort_handle();
        if let Some(previous) = slots.insert(key, Scheduled { generation, handle }) {
            previous.handle.abort();
        }
        debug!(game_id, %kind, generation, "Timer scheduled");
    }

    fn release(&self, key: &(String, TimerKind), generation: u64) {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        if slots.get(key).is_some_and(|s| s.generation == generation) {
            slots.remove(key);
        }
    }

    /// Stops one timer of a game. Returns false if none was running.
    #[instrument(skip(self))]
    pub fn cancel(&self, game_id: &str, kind: TimerKind) -> bool {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&(game_id.to_string(), kind));
        match removed {
            Some(scheduled) => {
                scheduled.handle.abort();
                debug!("Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Stops every timer of a game.
    pub fn cancel_all(&self, game_id: &str) {
        self.cancel(game_id, TimerKind::Turn);
        self.cancel(game_id, TimerKind::GameClock);
    }

    /// True if the timer is scheduled and has not fired.
    pub fn is_scheduled(&self, game_id: &str, kind: TimerKind) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&(game_id.to_string(), kind))
    }
}
