//! Host update-checker capability
//!
//! The host application owns downloading, verifying, and installing updates.
//! This crate only observes its lifecycle through [`UpdateChecker`].

use about_core::{UpdatePhase, UpdaterEvent};

use crate::subscription::Subscription;

/// Callback receiving host lifecycle events
pub type UpdaterEventHandler = Box<dyn Fn(&UpdaterEvent) + Send + Sync>;

/// The host's update-checker service.
///
/// Commands are fire-and-forget: their outcome arrives later as
/// [`UpdaterEvent`]s delivered to subscribed handlers.
#[cfg_attr(test, mockall::automock)]
pub trait UpdateChecker: Send + Sync {
    /// Whether this platform can self-update at all
    fn platform_supports_updates(&self) -> bool;

    /// The host's current lifecycle phase
    fn state(&self) -> UpdatePhase;

    /// Text of the most recent failure
    fn error_message(&self) -> String;

    /// Start a check; completion is reported through events
    fn check_for_update(&self);

    /// Quit and install the downloaded update
    fn restart_and_install_update(&self);

    /// Deliver every future lifecycle event to `handler`
    fn subscribe(&self, handler: UpdaterEventHandler) -> Subscription;
}
