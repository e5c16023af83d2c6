//! services/api/src/cook/mod.rs
//!
//! The stateful cooking subsystem: session store, timer engine, event
//! broadcaster and the state machine that coordinates them.

pub mod broadcast;
pub mod events;
pub mod machine;
pub mod store;
pub mod timer;

pub use broadcast::{Broadcaster, Subscription};
pub use events::{CookEvent, SessionSnapshot};
pub use machine::{ActionOutcome, CookAction, CookService};
pub use store::{SessionGuard, SessionStore};
pub use timer::TimerEngine;
