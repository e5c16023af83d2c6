//! services/api/src/cook/broadcast.rs
//!
//! Fan-out of `CookEvent`s to every live listener of a session. Each listener
//! owns an unbounded channel receiver; the broadcaster keeps the senders.
//! A listener whose receiver is gone is pruned on the next delivery attempt,
//! so one severed connection never affects delivery to the others.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

use super::events::{CookEvent, SessionSnapshot};

type ListenerSet = HashMap<Uuid, UnboundedSender<CookEvent>>;

#[derive(Default)]
pub struct Broadcaster {
    listeners: Mutex<HashMap<Uuid, ListenerSet>>,
}

/// A live listener registration. Dropping it unsubscribes.
pub struct Subscription {
    session_id: Uuid,
    listener_id: Uuid,
    receiver: UnboundedReceiver<CookEvent>,
    broadcaster: Weak<Broadcaster>,
}

impl Subscription {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn listener_id(&self) -> Uuid {
        self.listener_id
    }

    /// Next event for this listener, or `None` once the session's channel closed.
    pub async fn recv(&mut self) -> Option<CookEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<CookEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.unsubscribe(self.session_id, self.listener_id);
        }
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Uuid, ListenerSet>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener and immediately queues `connected` and `state_sync`
    /// for it, so it never needs a separate state fetch.
    pub fn subscribe(self: &Arc<Self>, snapshot: SessionSnapshot) -> Subscription {
        let session_id = snapshot.session_id;
        let listener_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        // The receiver is held right here, so these sends cannot fail.
        let _ = sender.send(CookEvent::Connected { session_id });
        let _ = sender.send(CookEvent::StateSync(snapshot));

        let mut registry = self.registry();
        let set = registry.entry(session_id).or_default();
        set.insert(listener_id, sender);
        info!(%session_id, %listener_id, listeners = set.len(), "Listener subscribed.");

        Subscription {
            session_id,
            listener_id,
            receiver,
            broadcaster: Arc::downgrade(self),
        }
    }

    /// Removes one listener. An emptied listener set is dropped entirely.
    pub fn unsubscribe(&self, session_id: Uuid, listener_id: Uuid) {
        let mut registry = self.registry();
        if let Some(set) = registry.get_mut(&session_id) {
            if set.remove(&listener_id).is_some() {
                info!(%session_id, %listener_id, "Listener unsubscribed.");
            }
            if set.is_empty() {
                registry.remove(&session_id);
            }
        }
    }

    /// Delivers `event` to every current listener of the session.
    /// Returns how many listeners received it.
    pub fn publish(&self, session_id: Uuid, event: CookEvent) -> usize {
        let mut registry = self.registry();
        let Some(set) = registry.get_mut(&session_id) else {
            return 0;
        };

        let name = event.name();
        set.retain(|listener_id, sender| match sender.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!(%session_id, %listener_id, event = name, "Dropping dead listener.");
                false
            }
        });
        let delivered = set.len();
        if set.is_empty() {
            registry.remove(&session_id);
        }
        delivered
    }

    /// Keep-alive hook: pings every listener of every session and prunes the
    /// dead ones. Returns the number of live listeners.
    pub fn heartbeat(&self) -> usize {
        let mut registry = self.registry();
        registry.retain(|_, set| {
            set.retain(|_, sender| sender.send(CookEvent::Keepalive).is_ok());
            !set.is_empty()
        });
        registry.values().map(HashMap::len).sum()
    }

    /// Forgets every listener of a session; their streams end.
    pub fn close_session(&self, session_id: Uuid) {
        if let Some(set) = self.registry().remove(&session_id) {
            info!(%session_id, listeners = set.len(), "Closed all listeners.");
        }
    }

    pub fn listener_count(&self, session_id: Uuid) -> usize {
        self.registry().get(&session_id).map(HashMap::len).unwrap_or(0)
    }

    pub fn has_session(&self, session_id: Uuid) -> bool {
        self.registry().contains_key(&session_id)
    }
}
