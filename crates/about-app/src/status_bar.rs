//! Status bar tile announcing a downloaded update

use about_core::UpdatePhase;

use crate::about::{About, AboutView, ABOUT_URI};
use crate::update_manager::UpdateManager;

pub const STATUS_BAR_TOOLTIP: &str = "An update will be installed the next time Soldat is relaunched.\n\n\
     Click the squirrel icon for more information.";

/// The squirrel tile. Shown only while an update is waiting to be installed.
#[derive(Debug, Clone)]
pub struct AboutStatusBar {
    manager: UpdateManager,
}

impl AboutStatusBar {
    pub fn new(manager: UpdateManager) -> Self {
        Self { manager }
    }

    pub fn is_visible(&self) -> bool {
        self.manager.state() == UpdatePhase::UpdateAvailable
    }

    pub fn tooltip(&self) -> &'static str {
        STATUS_BAR_TOOLTIP
    }

    pub fn click_target(&self) -> &'static str {
        ABOUT_URI
    }

    /// Open the About view
    pub fn click(&self, about: &About) -> Option<AboutView> {
        about.open(self.click_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::about::AboutState;
    use crate::test_utils::{test_manager, CURRENT_VERSION};
    use about_core::UpdaterEvent;

    #[test]
    fn test_visible_only_when_update_available() {
        let (manager, checker, _) = test_manager();
        let tile = AboutStatusBar::new(manager);
        assert!(!tile.is_visible());

        checker.emit(UpdaterEvent::download_completed("1.8.0"));
        assert!(tile.is_visible());

        checker.emit(UpdaterEvent::CheckingForUpdate);
        assert!(!tile.is_visible());
    }

    #[test]
    fn test_click_opens_about() {
        let (manager, _, _) = test_manager();
        let about = About::new(AboutState::new(CURRENT_VERSION, manager.clone()));
        let tile = AboutStatusBar::new(manager);

        let view = tile.click(&about).unwrap();

        assert_eq!(view.uri(), ABOUT_URI);
        assert!(tile.tooltip().contains("next time Soldat is relaunched"));
    }
}
