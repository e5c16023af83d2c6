//! services/api/src/cook/machine.rs
//!
//! The cooking session state machine. `CookService` is the control surface
//! for starting, driving and stopping sessions; it owns the session store,
//! the timer engine and the broadcaster and keeps them consistent.
//!
//! Every action runs entirely under the session's guard, and any running
//! timer is stopped before the step pointer or status changes, so a stale
//! tick can never land on the wrong step.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use dinner_core::domain::{validate_timeline, CookSession, SessionStatus, TimelineStep};
use dinner_core::ports::{PortError, PortResult, RecipeCatalog};
use dinner_core::timeline::placeholder_timeline;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::broadcast::{Broadcaster, Subscription};
use super::events::{CookEvent, SessionSnapshot};
use super::store::SessionStore;
use super::timer::TimerEngine;
use crate::config::CookSettings;

/// Seconds added by `add_time` when no usable value is supplied.
pub const DEFAULT_ADD_SECONDS: i64 = 60;

/// The closed set of commands a cook can issue against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookAction {
    Start,
    Next,
    Prev,
    Pause,
    Resume,
    AddTime,
    SetTime,
    Repeat,
    Stop,
}

impl FromStr for CookAction {
    type Err = PortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let action = match raw.trim().to_ascii_lowercase().as_str() {
            "start" => CookAction::Start,
            "next" => CookAction::Next,
            "prev" | "previous" => CookAction::Prev,
            "pause" => CookAction::Pause,
            "resume" => CookAction::Resume,
            "add_time" => CookAction::AddTime,
            "set_time" => CookAction::SetTime,
            "repeat" => CookAction::Repeat,
            "stop" => CookAction::Stop,
            other => {
                return Err(PortError::InvalidInput(format!(
                    "Unknown cooking action '{}'",
                    other
                )))
            }
        };
        Ok(action)
    }
}

/// What an action did, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub message: String,
    pub current_step_index: usize,
    pub status: SessionStatus,
    pub timer_remaining_seconds: u32,
}

impl ActionOutcome {
    fn new(message: impl Into<String>, session: &CookSession) -> Self {
        Self {
            message: message.into(),
            current_step_index: session.current_step_index,
            status: session.status,
            timer_remaining_seconds: session.timer_remaining_seconds,
        }
    }
}

/// Parses an action value as whole seconds. Accepts surrounding whitespace.
fn parse_seconds(value: Option<&str>) -> Option<i64> {
    value.and_then(|raw| raw.trim().parse::<i64>().ok())
}

fn clamp_seconds(seconds: i64) -> u32 {
    seconds.clamp(0, i64::from(u32::MAX)) as u32
}

pub struct CookService {
    store: Arc<SessionStore>,
    broadcaster: Arc<Broadcaster>,
    timer: Arc<TimerEngine>,
    catalog: Arc<dyn RecipeCatalog>,
    settings: CookSettings,
}

impl CookService {
    pub fn new(catalog: Arc<dyn RecipeCatalog>, settings: CookSettings) -> Self {
        let store = Arc::new(SessionStore::new());
        let broadcaster = Arc::new(Broadcaster::new());
        let timer = Arc::new(TimerEngine::new(
            store.clone(),
            broadcaster.clone(),
            settings.tick,
        ));
        Self {
            store,
            broadcaster,
            timer,
            catalog,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn timer(&self) -> &Arc<TimerEngine> {
        &self.timer
    }

    pub fn settings(&self) -> &CookSettings {
        &self.settings
    }

    //=====================================================================================
    // Session Lifecycle
    //=====================================================================================

    /// Opens a session for a recipe. A missing or broken timeline falls back to
    /// the placeholder, so creation never fails for lack of step data.
    pub async fn start_session(&self, recipe_id: &str, user_id: &str) -> PortResult<CookSession> {
        let recipe_id = recipe_id.trim();
        if recipe_id.is_empty() {
            return Err(PortError::InvalidInput("recipeId is required".to_string()));
        }
        let user_id = match user_id.trim() {
            "" => "anonymous",
            id => id,
        };

        let steps = self.load_timeline(recipe_id).await;
        let session_id = self.store.create(recipe_id, user_id, steps).await?;
        self.store.get(session_id).await
    }

    async fn load_timeline(&self, recipe_id: &str) -> Vec<TimelineStep> {
        match self.catalog.timeline(recipe_id).await {
            Ok(steps) => match validate_timeline(&steps) {
                Ok(()) => steps,
                Err(e) => {
                    warn!(recipe_id, "Unusable timeline ({}); using placeholder.", e);
                    placeholder_timeline()
                }
            },
            Err(e) => {
                warn!(recipe_id, "Timeline lookup failed ({}); using placeholder.", e);
                placeholder_timeline()
            }
        }
    }

    pub async fn stop_session(&self, session_id: Uuid) -> PortResult<ActionOutcome> {
        self.apply_action(session_id, CookAction::Stop, None).await
    }

    pub async fn snapshot(&self, session_id: Uuid) -> PortResult<CookSession> {
        self.store.get(session_id).await
    }

    /// Attaches a live listener to a session.
    pub async fn subscribe(&self, session_id: Uuid) -> PortResult<Subscription> {
        let session = self.store.lock(session_id).await?;
        Ok(self.broadcaster.subscribe(SessionSnapshot::from(&*session)))
    }

    //=====================================================================================
    // Action Dispatch
    //=====================================================================================

    pub async fn apply_action(
        &self,
        session_id: Uuid,
        action: CookAction,
        value: Option<&str>,
    ) -> PortResult<ActionOutcome> {
        let mut session = self.store.lock(session_id).await?;
        let id = session_id;

        let message = match action {
            CookAction::Start => {
                if !self.timer.start(&mut session) {
                    session.status = SessionStatus::Cooking;
                }
                self.broadcaster.publish(id, CookEvent::step_started(&session));
                format!("Started step {}", session.current_step_index + 1)
            }

            CookAction::Next if session.status == SessionStatus::Completed => {
                "Cooking is already complete".to_string()
            }

            CookAction::Next if session.is_on_last_step() => {
                self.timer.stop(id);
                session.status = SessionStatus::Completed;
                self.broadcaster.publish(id, CookEvent::CookComplete { session_id: id });
                "Cooking complete".to_string()
            }

            CookAction::Next => {
                self.timer.stop(id);
                let finished = session.current_step_index;
                self.broadcaster.publish(
                    id,
                    CookEvent::StepCompleted {
                        session_id: id,
                        step_index: finished,
                        step_order: session.current_step().order,
                    },
                );

                session.current_step_index += 1;
                session.timer_remaining_seconds = session.current_step().timer_seconds;
                self.broadcaster.publish(id, CookEvent::step_started(&session));

                if session.status == SessionStatus::Cooking {
                    self.timer.start(&mut session);
                }
                format!("Moved to step {}", session.current_step_index + 1)
            }

            CookAction::Prev if session.current_step_index == 0 => {
                "Already on the first step".to_string()
            }

            CookAction::Prev => {
                self.timer.stop(id);
                session.current_step_index -= 1;
                session.timer_remaining_seconds = session.current_step().timer_seconds;
                self.broadcaster.publish(id, CookEvent::step_started(&session));
                format!("Back to step {}", session.current_step_index + 1)
            }

            CookAction::Pause if session.status == SessionStatus::Completed => {
                "Cooking is already complete".to_string()
            }

            CookAction::Pause => {
                self.timer.stop(id);
                session.status = SessionStatus::Paused;
                self.broadcaster.publish(
                    id,
                    CookEvent::Paused {
                        session_id: id,
                        timer_remaining_seconds: session.timer_remaining_seconds,
                    },
                );
                "Paused".to_string()
            }

            CookAction::Resume if session.status != SessionStatus::Paused => {
                "Session is not paused".to_string()
            }

            CookAction::Resume => {
                if !self.timer.start(&mut session) {
                    session.status = SessionStatus::Cooking;
                }
                self.broadcaster.publish(
                    id,
                    CookEvent::Resumed {
                        session_id: id,
                        timer_remaining_seconds: session.timer_remaining_seconds,
                    },
                );
                "Resumed".to_string()
            }

            CookAction::AddTime => {
                let delta = parse_seconds(value).unwrap_or(DEFAULT_ADD_SECONDS);
                let updated = i64::from(session.timer_remaining_seconds).saturating_add(delta);
                session.timer_remaining_seconds = clamp_seconds(updated);
                self.broadcaster.publish(
                    id,
                    CookEvent::TimerAdjusted {
                        session_id: id,
                        timer_remaining_seconds: session.timer_remaining_seconds,
                    },
                );
                format!("Added {} seconds", delta)
            }

            CookAction::SetTime => match parse_seconds(value).filter(|s| *s >= 0) {
                Some(seconds) => {
                    session.timer_remaining_seconds = clamp_seconds(seconds);
                    self.broadcaster.publish(
                        id,
                        CookEvent::TimerAdjusted {
                            session_id: id,
                            timer_remaining_seconds: session.timer_remaining_seconds,
                        },
                    );
                    format!("Timer set to {} seconds", session.timer_remaining_seconds)
                }
                None => "Timer unchanged".to_string(),
            },

            CookAction::Repeat => {
                self.broadcaster.publish(
                    id,
                    CookEvent::InstructionRepeat {
                        session_id: id,
                        step_index: session.current_step_index,
                        step: session.current_step().clone(),
                    },
                );
                "Repeating the current step".to_string()
            }

            CookAction::Stop => {
                self.timer.stop(id);
                session.status = SessionStatus::Completed;
                self.broadcaster.publish(id, CookEvent::CookStopped { session_id: id });
                self.schedule_removal(id);
                "Cooking stopped".to_string()
            }
        };

        info!(
            session_id = %id,
            ?action,
            step = session.current_step_index,
            status = session.status.as_str(),
            "Cooking action applied."
        );
        Ok(ActionOutcome::new(message, &session))
    }

    /// Removes a stopped session after the grace period, so trailing status
    /// reads still succeed right after `stop`.
    fn schedule_removal(&self, session_id: Uuid) {
        let store = self.store.clone();
        let broadcaster = self.broadcaster.clone();
        let grace = self.settings.stop_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            store.delete(session_id).await;
            broadcaster.close_session(session_id);
        });
    }

    //=====================================================================================
    // Background Maintenance
    //=====================================================================================

    /// Removes sessions nobody has touched within the idle TTL.
    pub async fn reap_idle(&self) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(self.settings.idle_ttl) else {
            return 0;
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };

        let mut reaped = 0;
        for session_id in self.store.idle_before(cutoff).await {
            if !self.store.delete_if_idle(session_id, cutoff).await {
                continue;
            }
            self.timer.stop(session_id);
            self.broadcaster.close_session(session_id);
            reaped += 1;
        }
        if reaped > 0 {
            info!(count = reaped, "Reaped idle cooking sessions.");
        }
        reaped
    }

    /// Runs the idle reaper and the listener keep-alive until `shutdown` fires.
    pub fn spawn_maintenance(self: &Arc<Self>, shutdown: CancellationToken) {
        let service = self.clone();
        let token = shutdown.clone();
        tokio::spawn(async move {
            let mut sweep = tokio::time::interval(service.settings.reap_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sweep.tick() => { service.reap_idle().await; }
                }
            }
        });

        let broadcaster = self.broadcaster.clone();
        let keepalive = self.settings.keepalive;
        tokio::spawn(async move {
            let mut beat = tokio::time::interval(keepalive);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = beat.tick() => { broadcaster.heartbeat(); }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!("next".parse::<CookAction>().unwrap(), CookAction::Next);
        assert_eq!(" ADD_TIME ".parse::<CookAction>().unwrap(), CookAction::AddTime);
        assert_eq!("previous".parse::<CookAction>().unwrap(), CookAction::Prev);
    }

    #[test]
    fn rejects_unknown_action() {
        let err = "flip".parse::<CookAction>().unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[test]
    fn seconds_parsing_is_strict() {
        assert_eq!(parse_seconds(Some(" 45 ")), Some(45));
        assert_eq!(parse_seconds(Some("soon")), None);
        assert_eq!(parse_seconds(None), None);
        assert_eq!(clamp_seconds(-5), 0);
    }
}
