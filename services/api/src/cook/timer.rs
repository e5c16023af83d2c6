//! services/api/src/cook/timer.rs
//!
//! Per-session countdown. Each running timer is one spawned task driven by a
//! `tokio::time::interval` and stopped through its `CancellationToken`.
//! The task never owns the remaining time; it decrements the value stored on
//! the session record, under the session's lock, once per tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dinner_core::domain::{CookSession, SessionStatus};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::broadcast::Broadcaster;
use super::events::CookEvent;
use super::store::SessionStore;

struct ActiveTimer {
    generation: u64,
    token: CancellationToken,
}

pub struct TimerEngine {
    store: Arc<SessionStore>,
    broadcaster: Arc<Broadcaster>,
    tick: Duration,
    timers: Mutex<HashMap<Uuid, ActiveTimer>>,
    next_generation: AtomicU64,
}

impl TimerEngine {
    pub fn new(store: Arc<SessionStore>, broadcaster: Arc<Broadcaster>, tick: Duration) -> Self {
        Self {
            store,
            broadcaster,
            tick,
            timers: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<Uuid, ActiveTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts counting down the session's current step.
    ///
    /// The caller must hold the session's guard. Does nothing when no time
    /// remains; otherwise replaces any running timer for the session and marks
    /// it `Cooking`. Returns whether a timer is now running.
    pub fn start(self: &Arc<Self>, session: &mut CookSession) -> bool {
        if session.timer_remaining_seconds == 0 {
            return false;
        }
        let session_id = session.session_id();
        self.stop(session_id);
        session.status = SessionStatus::Cooking;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.timers().insert(
            session_id,
            ActiveTimer {
                generation,
                token: token.clone(),
            },
        );

        info!(
            %session_id,
            remaining = session.timer_remaining_seconds,
            step = session.current_step_index,
            "Timer started."
        );
        tokio::spawn(self.clone().countdown(session_id, generation, token));
        true
    }

    /// Cancels the session's running timer, if any. Returns whether one was running.
    pub fn stop(&self, session_id: Uuid) -> bool {
        match self.timers().remove(&session_id) {
            Some(active) => {
                active.token.cancel();
                debug!(%session_id, "Timer stopped.");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, session_id: Uuid) -> bool {
        self.timers().contains_key(&session_id)
    }

    pub fn active_count(&self) -> usize {
        self.timers().len()
    }

    async fn countdown(self: Arc<Self>, session_id: Uuid, generation: u64, token: CancellationToken) {
        let mut ticks = interval_at(Instant::now() + self.tick, self.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticks.tick() => {}
            }

            let Ok(mut session) = self.store.lock(session_id).await else {
                debug!(%session_id, "Session gone; timer exiting.");
                break;
            };
            // Checked under the session lock: an action that stopped this timer
            // before mutating the session is always observed here.
            if token.is_cancelled() || session.status != SessionStatus::Cooking {
                break;
            }

            // A count already at zero (set_time 0, negative add_time) only finishes.
            if session.timer_remaining_seconds > 0 {
                session.timer_remaining_seconds -= 1;
                self.broadcaster.publish(
                    session_id,
                    CookEvent::TimerTick {
                        session_id,
                        remaining_seconds: session.timer_remaining_seconds,
                        step_index: session.current_step_index,
                    },
                );
            }

            if session.timer_remaining_seconds == 0 {
                let step_order = session.current_step().order;
                self.broadcaster
                    .publish(session_id, CookEvent::TimerDone { session_id, step_order });
                info!(%session_id, step_order, "Timer done.");
                break;
            }
        }

        self.release(session_id, generation);
    }

    /// Forgets a finished timer, unless it has already been replaced.
    fn release(&self, session_id: Uuid, generation: u64) {
        let mut timers = self.timers();
        if timers
            .get(&session_id)
            .is_some_and(|active| active.generation == generation)
        {
            timers.remove(&session_id);
        }
    }
}
