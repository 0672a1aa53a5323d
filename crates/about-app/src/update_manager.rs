//! Update status state machine
//!
//! [`UpdateManager`] mirrors the host updater's lifecycle into a single
//! [`UpdatePhase`] plus the metadata views need (available version, auto-update
//! toggle, error text), and tells listeners whenever any of it changes.
//!
//! # Transitions
//!
//! | Event | Effect |
//! |---|---|
//! | checking-for-update | phase = Checking |
//! | downloading-update | phase = Downloading |
//! | download-completed(v) | available = v; UpdateAvailable if v != current, else UpToDate |
//! | update-not-available | phase = UpToDate |
//! | update-error | phase = Error, message read from the checker |
//! | config changed(b) | auto-updates flag = b |
//!
//! Each row produces exactly one change notification before the handler
//! returns. Nothing here polls or schedules work.
//!
//! # Locking
//!
//! Status fields live behind a mutex that is never held while calling out to
//! the checker, the config store, or listeners, so listeners can freely query
//! the manager or issue commands from inside a notification.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use about_core::prelude::*;
use about_core::{release_notes_url_for_version, UpdatePhase, UpdaterEvent};

use crate::broadcaster::{ListenerId, StatusChangeBroadcaster};
use crate::config::{ConfigStore, AUTO_UPDATE_KEY};
use crate::subscription::{CompositeSubscription, Subscription};
use crate::updater::UpdateChecker;

#[derive(Debug, Clone)]
struct StatusState {
    phase: UpdatePhase,
    available_version: String,
    auto_updates_enabled: bool,
    last_error_message: Option<String>,
}

struct Shared {
    checker: Arc<dyn UpdateChecker>,
    config: Arc<dyn ConfigStore>,
    current_version: String,
    status: Mutex<StatusState>,
    broadcaster: StatusChangeBroadcaster,
    subscriptions: Mutex<CompositeSubscription>,
    disposed: AtomicBool,
}

/// The update status state machine.
///
/// Cloning yields another handle to the same machine; one instance is meant
/// to exist per running application.
#[derive(Clone)]
pub struct UpdateManager {
    shared: Arc<Shared>,
}

/// Point-in-time view of everything a status display needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub phase: UpdatePhase,
    pub current_version: String,
    pub available_version: String,
    pub auto_updates_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub release_notes_url: String,
}

impl UpdateManager {
    /// Build the machine and attach it to its collaborators.
    ///
    /// Primes the phase from the checker. On platforms without update
    /// support the phase is `Unsupported` and no subscriptions are made.
    pub fn new(
        checker: Arc<dyn UpdateChecker>,
        config: Arc<dyn ConfigStore>,
        current_version: impl Into<String>,
    ) -> Self {
        let current_version = current_version.into();
        let manager = Self {
            shared: Arc::new(Shared {
                checker,
                config,
                status: Mutex::new(StatusState {
                    phase: UpdatePhase::default(),
                    available_version: current_version.clone(),
                    auto_updates_enabled: false,
                    last_error_message: None,
                }),
                current_version,
                broadcaster: StatusChangeBroadcaster::new(),
                subscriptions: Mutex::new(CompositeSubscription::new()),
                disposed: AtomicBool::new(false),
            }),
        };

        let supported = manager.prime();
        if supported {
            manager.listen_for_updater_events();
        }

        info!(
            "Update manager ready: version {}, phase {}",
            manager.current_version(),
            manager.state()
        );
        manager
    }

    fn listen_for_updater_events(&self) {
        let weak = Arc::downgrade(&self.shared);
        let events = self
            .shared
            .checker
            .subscribe(Box::new(move |event: &UpdaterEvent| {
                if let Some(manager) = upgrade(&weak) {
                    manager.handle_updater_event(event);
                }
            }));

        // Fires once right away with the stored value
        let weak = Arc::downgrade(&self.shared);
        let config = self.shared.config.observe(
            AUTO_UPDATE_KEY,
            Box::new(move |enabled| {
                if let Some(manager) = upgrade(&weak) {
                    manager.handle_config_change(enabled);
                }
            }),
        );

        let mut subscriptions = self.subscriptions();
        subscriptions.add(events);
        subscriptions.add(config);
    }

    // ─────────────────────────────────────────────────────────
    // Event Handling
    // ─────────────────────────────────────────────────────────

    fn handle_updater_event(&self, event: &UpdaterEvent) {
        if self.is_disposed() {
            trace!("Ignoring {} after dispose", event.event_type());
            return;
        }
        debug!("Updater event: {}", event.event_type());

        match event {
            UpdaterEvent::CheckingForUpdate => self.set_phase(UpdatePhase::Checking),
            UpdaterEvent::DownloadingUpdate => self.set_phase(UpdatePhase::Downloading),
            UpdaterEvent::DownloadCompleted { release_version } => {
                self.set_available_version(release_version)
            }
            UpdaterEvent::UpdateNotAvailable => self.set_phase(UpdatePhase::UpToDate),
            UpdaterEvent::UpdateError => self.set_error(),
        }
    }

    fn handle_config_change(&self, enabled: bool) {
        if self.is_disposed() {
            return;
        }
        self.status().auto_updates_enabled = enabled;
        debug!("Automatic updates preference: {}", enabled);
        self.emit_did_change();
    }

    fn set_phase(&self, phase: UpdatePhase) {
        {
            let mut status = self.status();
            debug!("Update phase: {} -> {}", status.phase, phase);
            status.phase = phase;
        }
        self.emit_did_change();
    }

    fn set_available_version(&self, version: &str) {
        {
            let mut status = self.status();
            let phase = if version != self.shared.current_version {
                UpdatePhase::UpdateAvailable
            } else {
                UpdatePhase::UpToDate
            };
            debug!(
                "Downloaded {}: phase {} -> {}",
                version, status.phase, phase
            );
            status.available_version = version.to_string();
            status.phase = phase;
        }
        self.emit_did_change();
    }

    fn set_error(&self) {
        let message = self.shared.checker.error_message();
        {
            let mut status = self.status();
            warn!("Update failed in phase {}: {}", status.phase, message);
            status.phase = UpdatePhase::Error;
            status.last_error_message = Some(message);
        }
        self.emit_did_change();
    }

    /// Read platform support and the host phase into local state.
    /// Returns whether updates are supported.
    fn prime(&self) -> bool {
        let supported = self.shared.checker.platform_supports_updates();
        let phase = if supported {
            self.shared.checker.state()
        } else {
            UpdatePhase::Unsupported
        };
        self.status().phase = phase;
        supported
    }

    fn emit_did_change(&self) {
        if self.is_disposed() {
            return;
        }
        self.shared.broadcaster.notify();
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Current phase
    pub fn state(&self) -> UpdatePhase {
        self.status().phase
    }

    /// Version of the running application
    pub fn current_version(&self) -> &str {
        &self.shared.current_version
    }

    /// Version last reported as downloaded; the current version until then
    pub fn available_version(&self) -> String {
        self.status().available_version.clone()
    }

    /// The toggle state views should display.
    ///
    /// Always false on unsupported platforms, whatever the stored preference.
    pub fn auto_updates_enabled(&self) -> bool {
        let status = self.status();
        status.auto_updates_enabled && status.phase != UpdatePhase::Unsupported
    }

    /// Latest error text, read live from the checker on every call
    pub fn error_message(&self) -> String {
        self.shared.checker.error_message()
    }

    /// Error text captured when the last error event was handled.
    /// `None` unless the phase is `Error`.
    pub fn last_error_message(&self) -> Option<String> {
        let status = self.status();
        match status.phase {
            UpdatePhase::Error => status.last_error_message.clone(),
            _ => None,
        }
    }

    /// Release notes page for an arbitrary version string
    pub fn release_notes_url_for_version(&self, version: &str) -> String {
        release_notes_url_for_version(version)
    }

    /// Release notes page for the running build
    pub fn release_notes_url_for_current_version(&self) -> String {
        release_notes_url_for_version(self.current_version())
    }

    /// Release notes page for the downloaded update
    pub fn release_notes_url_for_available_version(&self) -> String {
        release_notes_url_for_version(&self.available_version())
    }

    /// Collect the current status in one consistent read
    pub fn snapshot(&self) -> UpdateStatus {
        let status = self.status().clone();
        let error_message = match status.phase {
            UpdatePhase::Error => Some(self.error_message()),
            _ => None,
        };
        UpdateStatus {
            phase: status.phase,
            current_version: self.shared.current_version.clone(),
            release_notes_url: release_notes_url_for_version(&status.available_version),
            available_version: status.available_version,
            auto_updates_enabled: status.auto_updates_enabled
                && status.phase != UpdatePhase::Unsupported,
            error_message,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────

    /// Ask the host to check for an update.
    ///
    /// The phase only changes when the host reports back. Callers should not
    /// offer this while a check is running.
    pub fn check_for_update(&self) {
        debug!("Requesting update check (phase {})", self.state());
        self.shared.checker.check_for_update();
    }

    /// Write the auto-update preference to the config store.
    ///
    /// The local flag follows when the store reports the change, never
    /// before.
    pub fn set_auto_updates_enabled(&self, enabled: bool) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::Disposed);
        }
        self.shared.config.set(AUTO_UPDATE_KEY, enabled)
    }

    /// Ask the host to restart into the downloaded update
    pub fn restart_and_install_update(&self) {
        let phase = self.state();
        if phase != UpdatePhase::UpdateAvailable {
            warn!("Restart requested with no downloaded update (phase {})", phase);
        }
        self.shared.checker.restart_and_install_update();
    }

    /// Re-read platform support and the host phase, then notify.
    ///
    /// Does not touch subscriptions.
    pub fn reset_state(&self) {
        if self.is_disposed() {
            return;
        }
        self.prime();
        debug!("Update state reset to {}", self.state());
        self.emit_did_change();
    }

    // ─────────────────────────────────────────────────────────
    // Listeners & Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Register a change listener; disposing the handle removes it
    pub fn on_did_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.shared.broadcaster.subscribe(listener)
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.shared.broadcaster.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.broadcaster.remove_listener(id)
    }

    /// Detach from the checker and config store. No notification is sent
    /// afterwards. Idempotent.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscriptions().dispose();
        self.shared.broadcaster.close();
        info!("Update manager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }

    fn status(&self) -> MutexGuard<'_, StatusState> {
        self.shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions(&self) -> MutexGuard<'_, CompositeSubscription> {
        self.shared
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<UpdateManager> {
    weak.upgrade().map(|shared| UpdateManager { shared })
}

impl fmt::Debug for UpdateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateManager")
            .field("current_version", &self.shared.current_version)
            .field("status", &*self.status())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
