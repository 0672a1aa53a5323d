//! Integration tests for the update status machine with on-disk preferences
//!
//! Run with: cargo test --test update_status

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use about_app::test_utils::{count_changes, FakeUpdateChecker};
use about_app::{
    check_on_show, About, AboutState, AboutStatusBar, ConfigStore, TomlConfigStore,
    UpdateManager, UpdatePanel, UpdatePhase, UpdateViewModel, UpdaterEvent, ABOUT_URI,
    AUTO_UPDATE_KEY,
};

const VERSION: &str = "1.7.0";

fn manager_on_disk(
    checker: &FakeUpdateChecker,
    dir: &TempDir,
) -> (UpdateManager, TomlConfigStore) {
    let config = TomlConfigStore::open(dir.path());
    let manager = UpdateManager::new(
        Arc::new(checker.clone()),
        Arc::new(config.clone()),
        VERSION,
    );
    (manager, config)
}

#[test]
fn test_check_download_and_release_notes() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();
    let (manager, _) = manager_on_disk(&checker, &dir);
    assert_eq!(manager.state(), UpdatePhase::Idle);

    checker.emit(UpdaterEvent::CheckingForUpdate);
    assert_eq!(manager.state(), UpdatePhase::Checking);

    checker.emit(UpdaterEvent::download_completed("1.8.0"));
    assert_eq!(manager.state(), UpdatePhase::UpdateAvailable);
    assert_eq!(manager.available_version(), "1.8.0");
    assert!(manager
        .release_notes_url_for_available_version()
        .ends_with("/tag/v1.8.0"));
}

#[test]
fn test_error_scenario() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();
    let (manager, _) = manager_on_disk(&checker, &dir);
    checker.set_error_message("network timeout");

    checker.emit(UpdaterEvent::UpdateError);

    assert_eq!(manager.state(), UpdatePhase::Error);
    assert_eq!(manager.error_message(), "network timeout");
    assert_eq!(
        UpdateViewModel::from_manager(&manager).panel,
        UpdatePanel::Error {
            message: "network timeout".to_string()
        }
    );
}

#[test]
fn test_unsupported_ignores_stored_preference() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::unsupported();
    let (manager, config) = manager_on_disk(&checker, &dir);

    assert!(config.get(AUTO_UPDATE_KEY));
    assert_eq!(manager.state(), UpdatePhase::Unsupported);
    assert!(!manager.auto_updates_enabled());
    assert!(!check_on_show(&manager));
}

#[test]
fn test_preference_survives_restart() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();

    {
        let (manager, _) = manager_on_disk(&checker, &dir);
        manager.set_auto_updates_enabled(false).unwrap();
        assert!(!manager.auto_updates_enabled());
        manager.dispose();
    }

    let (manager, _) = manager_on_disk(&checker, &dir);
    assert!(!manager.auto_updates_enabled());
    assert!(!check_on_show(&manager));
    assert_eq!(checker.check_calls(), 0);
}

#[test]
fn test_flag_never_diverges_from_store() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();
    let (manager, config) = manager_on_disk(&checker, &dir);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let m = manager.clone();
    let c = config.clone();
    let _sub = manager.on_did_change(move || {
        s.lock()
            .unwrap()
            .push((m.auto_updates_enabled(), c.get(AUTO_UPDATE_KEY)));
        Ok(())
    });

    manager.set_auto_updates_enabled(false).unwrap();
    manager.set_auto_updates_enabled(true).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(false, false), (true, true)]);
}

#[test]
fn test_one_notification_per_event() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();
    let (manager, config) = manager_on_disk(&checker, &dir);
    let (count, _sub) = count_changes(&manager);

    checker.emit(UpdaterEvent::CheckingForUpdate);
    checker.emit(UpdaterEvent::DownloadingUpdate);
    checker.emit(UpdaterEvent::download_completed(VERSION));
    checker.emit(UpdaterEvent::UpdateNotAvailable);
    checker.emit(UpdaterEvent::UpdateError);
    config.set(AUTO_UPDATE_KEY, false).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 6);
    assert_eq!(manager.state(), UpdatePhase::Error);
}

#[test]
fn test_about_panel_follows_update_lifecycle() {
    let dir = TempDir::new().unwrap();
    let checker = FakeUpdateChecker::new();
    let (manager, _) = manager_on_disk(&checker, &dir);
    let about = About::new(AboutState::new(VERSION, manager.clone()));
    let tile = AboutStatusBar::new(manager.clone());

    let view = about.open(ABOUT_URI).unwrap();
    assert!(check_on_show(&manager));
    checker.emit(UpdaterEvent::CheckingForUpdate);
    assert!(!UpdateViewModel::from_manager(&manager).action.enabled);
    assert!(!tile.is_visible());

    checker.emit(UpdaterEvent::download_completed("1.8.0"));

    assert!(tile.is_visible());
    assert_eq!(view.props().available_version, "1.8.0");
    assert!(view.release_notes_url().ends_with("/tag/v1.8.0"));
    assert!(about.release_notes_url().ends_with("/tag/v1.7.0"));

    UpdateViewModel::from_manager(&manager).activate_action(&manager);
    assert_eq!(checker.restart_calls(), 1);

    about.destroy();
    assert!(manager.is_disposed());
    assert_eq!(checker.subscriber_count(), 0);
}
