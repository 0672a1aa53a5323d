//! [`UpdateChecker`] backed by the host on the other end of stdio
//!
//! Queries answer from the last state the host reported. Commands become
//! `request` lines on stdout. Host events are fanned out to subscribers
//! through [`StdioUpdateChecker::dispatch`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use about_app::{Subscription, UpdateChecker, UpdaterEventHandler};
use about_core::{UpdatePhase, UpdaterEvent};

use super::protocol::HostSnapshot;
use super::{EventWriter, HeadlessEvent};

pub const CHECK_FOR_UPDATE_ACTION: &str = "check-for-update";
pub const RESTART_AND_INSTALL_ACTION: &str = "restart-and-install-update";

type SharedHandler = Arc<dyn Fn(&UpdaterEvent) + Send + Sync>;

struct HostState {
    supported: bool,
    phase: UpdatePhase,
    error_message: String,
    next_id: u64,
    handlers: Vec<(u64, SharedHandler)>,
}

#[derive(Clone)]
pub struct StdioUpdateChecker {
    state: Arc<Mutex<HostState>>,
    writer: EventWriter,
}

impl StdioUpdateChecker {
    pub fn new(writer: EventWriter, supported: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                supported,
                phase: UpdatePhase::Idle,
                error_message: String::new(),
                next_id: 0,
                handlers: Vec::new(),
            })),
            writer,
        }
    }

    /// Take what the host reports as its current state
    pub fn apply_snapshot(&self, snapshot: HostSnapshot) {
        let mut state = self.lock();
        state.supported = snapshot.supported;
        state.phase = snapshot.state;
        if let Some(message) = snapshot.error_message {
            state.error_message = message;
        }
        debug!(
            "Host snapshot: phase {}, supported {}",
            state.phase, state.supported
        );
    }

    /// Deliver `event` to subscribers. The host phase only changes through
    /// [`Self::apply_snapshot`].
    pub fn dispatch(&self, event: &UpdaterEvent) {
        let handlers: Vec<SharedHandler> = self
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        trace!(
            "Dispatching {} to {} handler(s)",
            event.event_type(),
            handlers.len()
        );
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().handlers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UpdateChecker for StdioUpdateChecker {
    fn platform_supports_updates(&self) -> bool {
        self.lock().supported
    }

    fn state(&self) -> UpdatePhase {
        self.lock().phase
    }

    fn error_message(&self) -> String {
        self.lock().error_message.clone()
    }

    fn check_for_update(&self) {
        self.writer
            .emit(&HeadlessEvent::request(CHECK_FOR_UPDATE_ACTION));
    }

    fn restart_and_install_update(&self) {
        self.writer
            .emit(&HeadlessEvent::request(RESTART_AND_INSTALL_ACTION));
    }

    fn subscribe(&self, handler: UpdaterEventHandler) -> Subscription {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.push((id, Arc::from(handler)));
            id
        };
        let state = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.handlers.retain(|(existing, _)| *existing != id);
            }
        })
    }
}
