//! about-app - Update status tracking for the Soldat About panel
//!
//! This crate implements the update status state machine ([`UpdateManager`]),
//! the payload-free change broadcaster it notifies through, the observable
//! preference store, and the view models the About panel renders from.

pub mod about;
pub mod broadcaster;
pub mod config;
pub mod status_bar;
pub mod subscription;
pub mod update_manager;
pub mod update_view;
pub mod updater;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Re-export primary types
pub use about::{About, AboutState, AboutStatePatch, AboutView, AboutViewProps, ABOUT_URI};
pub use broadcaster::{Listener, ListenerId, StatusChangeBroadcaster};
pub use config::{ConfigStore, Settings, TomlConfigStore, AUTO_UPDATE_KEY};
pub use status_bar::AboutStatusBar;
pub use subscription::{CompositeSubscription, Subscription};
pub use update_manager::{UpdateManager, UpdateStatus};
pub use update_view::{check_on_show, UpdatePanel, UpdateViewModel};
pub use updater::{UpdateChecker, UpdaterEventHandler};

pub use about_core::{UpdatePhase, UpdaterEvent};
