//! Update section of the About view
//!
//! [`UpdateViewModel`] is a pure projection of [`UpdateManager`] queries:
//! rebuild it on every change notification and render what it says.

use about_core::prelude::*;
use about_core::UpdatePhase;

use crate::update_manager::UpdateManager;

pub const AUTO_UPDATES_ON_MESSAGE: &str = "Soldat will check for updates automatically";
pub const AUTO_UPDATES_OFF_MESSAGE: &str = "Automatic updates are disabled please check manually";
pub const CHECK_NOW_LABEL: &str = "Check now";
pub const RESTART_AND_INSTALL_LABEL: &str = "Restart and install";

/// Which status panel is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePanel {
    /// Idle or unsupported: explains the auto-update setting
    Default { message: &'static str },
    Checking,
    Downloading,
    Available { version: String },
    UpToDate,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateViewModel {
    pub phase: UpdatePhase,
    pub auto_updates_visible: bool,
    pub auto_updates_checked: bool,
    pub panel: UpdatePanel,
    pub action: ActionButton,
}

impl UpdateViewModel {
    pub fn from_manager(manager: &UpdateManager) -> Self {
        let phase = manager.state();
        let auto_updates_enabled = manager.auto_updates_enabled();

        let panel = match phase {
            UpdatePhase::Idle | UpdatePhase::Unsupported => UpdatePanel::Default {
                message: if auto_updates_enabled {
                    AUTO_UPDATES_ON_MESSAGE
                } else {
                    AUTO_UPDATES_OFF_MESSAGE
                },
            },
            UpdatePhase::Checking => UpdatePanel::Checking,
            UpdatePhase::Downloading => UpdatePanel::Downloading,
            UpdatePhase::UpdateAvailable => UpdatePanel::Available {
                version: manager.available_version(),
            },
            UpdatePhase::UpToDate => UpdatePanel::UpToDate,
            UpdatePhase::Error => UpdatePanel::Error {
                message: manager.error_message(),
            },
        };

        let action = ActionButton {
            label: match phase {
                UpdatePhase::UpdateAvailable => RESTART_AND_INSTALL_LABEL,
                _ => CHECK_NOW_LABEL,
            },
            enabled: !phase.is_busy(),
        };

        Self {
            phase,
            auto_updates_visible: phase != UpdatePhase::Unsupported,
            auto_updates_checked: auto_updates_enabled,
            panel,
            action,
        }
    }

    /// Run whatever the action button currently offers.
    ///
    /// Does nothing while the button is disabled.
    pub fn activate_action(&self, manager: &UpdateManager) {
        if !self.action.enabled {
            trace!("Action button disabled in phase {}", self.phase);
            return;
        }
        match self.phase {
            UpdatePhase::UpdateAvailable => manager.restart_and_install_update(),
            _ => manager.check_for_update(),
        }
    }

    /// Flip the auto-update checkbox through the config store
    pub fn toggle_auto_updates(&self, manager: &UpdateManager) -> Result<()> {
        manager.set_auto_updates_enabled(!self.auto_updates_checked)
    }
}

/// Kick off a check the first time the view appears, but only when the
/// updater is idle and automatic updates are on. Returns whether a check was
/// requested.
pub fn check_on_show(manager: &UpdateManager) -> bool {
    if manager.state() == UpdatePhase::Idle && manager.auto_updates_enabled() {
        debug!("Checking for updates on first show");
        manager.check_for_update();
        true
    } else {
        false
    }
}
