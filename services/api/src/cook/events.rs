//! services/api/src/cook/events.rs
//!
//! Named events pushed to live listeners of a cooking session. Every transport
//! (server-sent events, WebSocket) renders the same enum.

use dinner_core::domain::{CookSession, SessionStatus, TimelineStep};
use serde::Serialize;
use uuid::Uuid;

/// Full view of a session as a newly attached listener needs it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub current_step_index: usize,
    pub status: SessionStatus,
    pub timer_remaining_seconds: u32,
    pub current_step: TimelineStep,
    pub total_steps: usize,
}

impl From<&CookSession> for SessionSnapshot {
    fn from(session: &CookSession) -> Self {
        Self {
            session_id: session.session_id(),
            current_step_index: session.current_step_index,
            status: session.status,
            timer_remaining_seconds: session.timer_remaining_seconds,
            current_step: session.current_step().clone(),
            total_steps: session.steps().len(),
        }
    }
}

/// Represents the events the server pushes to listeners of one session.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum CookEvent {
    /// Acknowledges a new listener.
    Connected { session_id: Uuid },

    /// Current state, sent right after `Connected`.
    StateSync(SessionSnapshot),

    StepStarted {
        session_id: Uuid,
        step_index: usize,
        step: TimelineStep,
    },

    StepCompleted {
        session_id: Uuid,
        step_index: usize,
        step_order: u32,
    },

    /// `next` was issued on the final step.
    CookComplete { session_id: Uuid },

    Paused {
        session_id: Uuid,
        timer_remaining_seconds: u32,
    },

    Resumed {
        session_id: Uuid,
        timer_remaining_seconds: u32,
    },

    TimerAdjusted {
        session_id: Uuid,
        timer_remaining_seconds: u32,
    },

    InstructionRepeat {
        session_id: Uuid,
        step_index: usize,
        step: TimelineStep,
    },

    /// The cook ended the session explicitly.
    CookStopped { session_id: Uuid },

    TimerTick {
        session_id: Uuid,
        remaining_seconds: u32,
        step_index: usize,
    },

    /// The countdown of the current step reached zero. Does not advance the step.
    TimerDone { session_id: Uuid, step_order: u32 },

    Keepalive,
}

impl CookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CookEvent::Connected { .. } => "connected",
            CookEvent::StateSync(_) => "state_sync",
            CookEvent::StepStarted { .. } => "step_started",
            CookEvent::StepCompleted { .. } => "step_completed",
            CookEvent::CookComplete { .. } => "cook_complete",
            CookEvent::Paused { .. } => "paused",
            CookEvent::Resumed { .. } => "resumed",
            CookEvent::TimerAdjusted { .. } => "timer_adjusted",
            CookEvent::InstructionRepeat { .. } => "instruction_repeat",
            CookEvent::CookStopped { .. } => "cook_stopped",
            CookEvent::TimerTick { .. } => "timer_tick",
            CookEvent::TimerDone { .. } => "timer_done",
            CookEvent::Keepalive => "keepalive",
        }
    }

    /// The event body without its name, as sent in an SSE `data:` line.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut value| value.get_mut("data").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null)
    }

    pub fn step_started(session: &CookSession) -> Self {
        CookEvent::StepStarted {
            session_id: session.session_id(),
            step_index: session.current_step_index,
            step: session.current_step().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matches_serialized_tag() {
        let event = CookEvent::TimerTick {
            session_id: Uuid::nil(),
            remaining_seconds: 12,
            step_index: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(event.payload()["remainingSeconds"], 12);
        assert_eq!(event.payload()["stepIndex"], 1);
    }

    #[test]
    fn unit_events_have_null_payload() {
        assert_eq!(CookEvent::Keepalive.payload(), serde_json::Value::Null);
        assert_eq!(CookEvent::Keepalive.name(), "keepalive");
    }
}
