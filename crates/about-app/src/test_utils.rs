//! Test utilities for update-status tests
//!
//! Available under `cfg(test)` and the `test-helpers` feature so integration
//! tests in other crates can drive an [`UpdateManager`] without a host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use about_core::{UpdatePhase, UpdaterEvent};

use crate::config::{Settings, TomlConfigStore};
use crate::subscription::Subscription;
use crate::update_manager::UpdateManager;
use crate::updater::{UpdateChecker, UpdaterEventHandler};

/// Version the helpers pretend is running
pub const CURRENT_VERSION: &str = "1.7.0";

type SharedHandler = Arc<dyn Fn(&UpdaterEvent) + Send + Sync>;

struct FakeState {
    supported: bool,
    phase: UpdatePhase,
    error_message: String,
    check_calls: usize,
    restart_calls: usize,
    next_id: u64,
    handlers: Vec<(u64, SharedHandler)>,
}

/// Scriptable stand-in for the host updater.
///
/// Commands are only counted; tests decide which events come back by calling
/// [`FakeUpdateChecker::emit`]. Clones share state.
#[derive(Clone)]
pub struct FakeUpdateChecker {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeUpdateChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeUpdateChecker {
    /// A supported platform sitting idle
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                supported: true,
                phase: UpdatePhase::Idle,
                error_message: String::new(),
                check_calls: 0,
                restart_calls: 0,
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn unsupported() -> Self {
        let checker = Self::new();
        checker.set_supported(false);
        checker
    }

    pub fn set_supported(&self, supported: bool) {
        self.lock().supported = supported;
    }

    pub fn set_phase(&self, phase: UpdatePhase) {
        self.lock().phase = phase;
    }

    pub fn set_error_message(&self, message: impl Into<String>) {
        self.lock().error_message = message.into();
    }

    /// Deliver `event` to every current subscriber, synchronously
    pub fn emit(&self, event: UpdaterEvent) {
        for handler in self.handlers() {
            handler(&event);
        }
    }

    /// Snapshot of the registered handlers
    pub fn handlers(&self) -> Vec<SharedHandler> {
        self.lock().handlers.iter().map(|(_, h)| h.clone()).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().handlers.len()
    }

    pub fn check_calls(&self) -> usize {
        self.lock().check_calls
    }

    pub fn restart_calls(&self) -> usize {
        self.lock().restart_calls
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UpdateChecker for FakeUpdateChecker {
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
        self.lock().check_calls += 1;
    }

    fn restart_and_install_update(&self) {
        self.lock().restart_calls += 1;
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

/// Manager wired to a fresh fake checker and an in-memory store with defaults
pub fn test_manager() -> (UpdateManager, FakeUpdateChecker, TomlConfigStore) {
    test_manager_with(FakeUpdateChecker::new(), Settings::default())
}

pub fn test_manager_with(
    checker: FakeUpdateChecker,
    settings: Settings,
) -> (UpdateManager, FakeUpdateChecker, TomlConfigStore) {
    let config = TomlConfigStore::in_memory(settings);
    let manager = UpdateManager::new(
        Arc::new(checker.clone()),
        Arc::new(config.clone()),
        CURRENT_VERSION,
    );
    (manager, checker, config)
}

/// Count change notifications from `manager` until the subscription drops
pub fn count_changes(manager: &UpdateManager) -> (Arc<AtomicUsize>, Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let subscription = manager.on_did_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (count, subscription)
}
