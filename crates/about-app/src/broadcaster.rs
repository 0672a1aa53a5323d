//! Payload-free change notifications
//!
//! [`StatusChangeBroadcaster`] tells listeners *that* something changed, never
//! *what*. Listeners re-read whatever they display from the model that owns
//! the broadcaster, so there is no second copy of the state to go stale.
//!
//! The broadcaster is generic on purpose: [`crate::UpdateManager`] uses one
//! for the update status and [`crate::About`] uses another for its composite
//! panel state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use about_core::prelude::*;

use crate::subscription::Subscription;

/// A registered change callback.
///
/// Returning an error does not stop delivery to the remaining listeners.
pub type Listener = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
    closed: bool,
}

/// Ordered set of change listeners, notified synchronously.
///
/// Cloning yields another handle to the same listener set.
#[derive(Clone, Default)]
pub struct StatusChangeBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl StatusChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        trace!("Listener {:?} added ({} total)", id, registry.listeners.len());
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        remove_from(&self.registry, id)
    }

    /// Register a listener and get a [`Subscription`] that removes it on disposal
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let id = self.add_listener(listener);
        let registry: Weak<Mutex<Registry>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                remove_from(&registry, id);
            }
        })
    }

    /// Invoke every listener registered at the moment of the call.
    ///
    /// The listener list is snapshotted first, so listeners may add or remove
    /// listeners (including themselves) from inside the callback. A failing
    /// listener is logged and the rest still run. Once the broadcaster is
    /// closed, no further listener is called, even mid-round.
    pub fn notify(&self) {
        let snapshot: Vec<(ListenerId, Listener)> = {
            let registry = self.registry();
            if registry.closed {
                return;
            }
            registry.listeners.clone()
        };

        for (id, listener) in snapshot {
            if self.is_closed() {
                trace!("Broadcaster closed mid-notify, skipping remaining listeners");
                return;
            }
            if let Err(e) = listener() {
                warn!("Change listener {:?} failed: {}", id, e);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry().listeners.len()
    }

    /// Remove every listener and stop delivering notifications for good
    pub fn close(&self) {
        let mut registry = self.registry();
        registry.closed = true;
        registry.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.registry().closed
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove_from(registry: &Mutex<Registry>, id: ListenerId) -> bool {
    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
    let before = registry.listeners.len();
    registry.listeners.retain(|(existing, _)| *existing != id);
    before != registry.listeners.len()
}

impl fmt::Debug for StatusChangeBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusChangeBroadcaster")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
