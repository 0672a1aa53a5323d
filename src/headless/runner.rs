//! Headless mode runner - stdin/stdout event loop
//!
//! A blocking thread reads host lines from stdin and forwards parsed messages
//! over a channel. The async loop applies them to the update manager; status
//! lines are written from the manager's change listener.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use about_app::config::default_config_dir;
use about_app::{Settings, TomlConfigStore, UpdateManager};
use about_core::prelude::*;

use super::bridge::StdioUpdateChecker;
use super::protocol::{HostMessage, UserCommand};
use super::{EventWriter, HeadlessEvent};

/// Bound on host messages waiting for the event loop
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    /// Where `config.toml` lives; the platform config dir when unset
    pub config_dir: Option<PathBuf>,
    pub current_version: String,
    /// Start as if the platform cannot self-update
    pub unsupported: bool,
}

/// Run in headless mode on the process's stdin and stdout
pub async fn run_headless(options: HeadlessOptions) -> Result<()> {
    run_session(options, BufReader::new(std::io::stdin()), EventWriter::stdout()).await
}

/// Run one bridge session over `input` until quit or end of input
pub async fn run_session<R>(options: HeadlessOptions, input: R, writer: EventWriter) -> Result<()>
where
    R: BufRead + Send + 'static,
{
    info!("═══════════════════════════════════════════════════════");
    info!("Soldat About starting in HEADLESS mode");
    info!("Version: {}", options.current_version);
    info!("═══════════════════════════════════════════════════════");

    let config = open_config(options.config_dir.clone());
    let checker = StdioUpdateChecker::new(writer.clone(), !options.unsupported);
    let manager = UpdateManager::new(
        Arc::new(checker.clone()),
        Arc::new(config),
        options.current_version,
    );

    let status_writer = writer.clone();
    let status_source = manager.clone();
    let status_subscription = manager.on_did_change(move || {
        status_writer.emit(&HeadlessEvent::status(status_source.snapshot()));
        Ok(())
    });
    writer.emit(&HeadlessEvent::status(manager.snapshot()));

    let (msg_tx, msg_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let reader_writer = writer.clone();
    let reader = std::thread::spawn(move || {
        spawn_stdin_reader_blocking(input, msg_tx, reader_writer);
    });

    let result = headless_event_loop(&manager, &checker, &writer, msg_rx).await;

    // Shutdown
    manager.dispose();
    drop(status_subscription);
    if reader.join().is_err() {
        warn!("Stdin reader thread panicked");
    }

    info!("Soldat About headless mode exiting");
    result
}

fn open_config(config_dir: Option<PathBuf>) -> TomlConfigStore {
    match config_dir.or_else(default_config_dir) {
        Some(dir) => TomlConfigStore::open(dir),
        None => {
            warn!("No config directory available, preferences will not persist");
            TomlConfigStore::in_memory(Settings::default())
        }
    }
}

/// Main headless event loop
async fn headless_event_loop(
    manager: &UpdateManager,
    checker: &StdioUpdateChecker,
    writer: &EventWriter,
    mut msg_rx: mpsc::Receiver<HostMessage>,
) -> Result<()> {
    while let Some(msg) = msg_rx.recv().await {
        if !handle_message(manager, checker, writer, msg) {
            info!("Quit requested");
            return Ok(());
        }
    }

    info!("Message channel closed");
    Ok(())
}

/// Apply one host message. Returns false when the loop should stop.
fn handle_message(
    manager: &UpdateManager,
    checker: &StdioUpdateChecker,
    writer: &EventWriter,
    msg: HostMessage,
) -> bool {
    match msg {
        HostMessage::Updater(event) => checker.dispatch(&event),
        HostMessage::Snapshot(snapshot) => checker.apply_snapshot(snapshot),
        HostMessage::Command(command) => match command {
            UserCommand::Check => manager.check_for_update(),
            UserCommand::Restart => manager.restart_and_install_update(),
            UserCommand::Reset => manager.reset_state(),
            UserCommand::SetAutoUpdate { enabled } => {
                if let Err(e) = manager.set_auto_updates_enabled(enabled) {
                    error!("Failed to set automatic updates: {}", e);
                    writer.emit(&HeadlessEvent::error(e.to_string(), e.is_fatal()));
                }
            }
            UserCommand::Status => writer.emit(&HeadlessEvent::status(manager.snapshot())),
            UserCommand::Quit => return false,
        },
    }
    true
}

/// Read host lines and send parsed messages to the event loop (blocking)
fn spawn_stdin_reader_blocking<R: BufRead>(
    reader: R,
    msg_tx: mpsc::Sender<HostMessage>,
    writer: EventWriter,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let msg = match HostMessage::parse(trimmed) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Skipping host line: {}", e);
                writer.emit(&HeadlessEvent::error(
                    format!("Invalid host message: {}", e),
                    false,
                ));
                continue;
            }
        };

        let quit = matches!(msg, HostMessage::Command(UserCommand::Quit));
        if msg_tx.blocking_send(msg).is_err() {
            warn!("Event loop gone, dropping host input");
            break;
        }
        if quit {
            info!("Stdin: quit requested");
            break;
        }
    }

    info!("Stdin reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::test_support::Capture;
    use std::io::Cursor;
    use tempfile::TempDir;

    async fn run(input: &str, config_dir: &TempDir) -> Vec<serde_json::Value> {
        let capture = Capture::default();
        let options = HeadlessOptions {
            config_dir: Some(config_dir.path().to_path_buf()),
            current_version: "1.7.0".to_string(),
            unsupported: false,
        };
        run_session(
            options,
            Cursor::new(input.to_string()),
            EventWriter::new(capture.clone()),
        )
        .await
        .unwrap();
        capture.lines()
    }

    fn statuses(lines: &[serde_json::Value]) -> Vec<&serde_json::Value> {
        lines.iter().filter(|l| l["event"] == "status").collect()
    }

    #[tokio::test]
    async fn test_initial_status_on_start() {
        let dir = TempDir::new().unwrap();
        let lines = run("", &dir).await;

        let status = statuses(&lines);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0]["phase"], "idle");
        assert_eq!(status[0]["current_version"], "1.7.0");
        assert_eq!(status[0]["auto_updates_enabled"], true);
    }

    #[tokio::test]
    async fn test_update_flow() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            "{\"event\":\"did-begin-checking-for-update\"}\n",
            "{\"event\":\"did-begin-downloading-update\"}\n",
            "{\"event\":\"did-complete-downloading-update\",\"releaseVersion\":\"1.8.0\"}\n",
            "{\"command\":\"restart\"}\n",
        );

        let lines = run(input, &dir).await;

        let phases: Vec<_> = statuses(&lines)
            .iter()
            .map(|s| s["phase"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            phases,
            vec!["idle", "checking", "downloading", "update-available"]
        );
        let last = statuses(&lines).pop().unwrap().clone();
        assert_eq!(last["available_version"], "1.8.0");
        assert!(last["release_notes_url"]
            .as_str()
            .unwrap()
            .ends_with("/tag/v1.8.0"));
        assert!(lines
            .iter()
            .any(|l| l["event"] == "request" && l["action"] == "restart-and-install-update"));
    }

    #[tokio::test]
    async fn test_error_uses_host_message() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            "{\"event\":\"state\",\"state\":\"checking\",\"errorMessage\":\"network timeout\"}\n",
            "{\"event\":\"update-error\"}\n",
        );

        let lines = run(input, &dir).await;

        let last = statuses(&lines).pop().unwrap().clone();
        assert_eq!(last["phase"], "error");
        assert_eq!(last["error_message"], "network timeout");
    }

    #[tokio::test]
    async fn test_set_auto_update_persists() {
        let dir = TempDir::new().unwrap();
        let lines = run("{\"command\":\"set-auto-update\",\"enabled\":false}\n", &dir).await;

        let last = statuses(&lines).pop().unwrap().clone();
        assert_eq!(last["auto_updates_enabled"], false);

        let reopened = TomlConfigStore::open(dir.path());
        assert!(!reopened.settings().core.automatically_update);
    }

    #[tokio::test]
    async fn test_invalid_lines_are_reported_and_skipped() {
        let dir = TempDir::new().unwrap();
        let input = "garbage\n\n{\"command\":\"check\"}\n";

        let lines = run(input, &dir).await;

        assert!(lines.iter().any(|l| l["event"] == "error" && l["fatal"] == false));
        assert!(lines
            .iter()
            .any(|l| l["event"] == "request" && l["action"] == "check-for-update"));
    }

    #[tokio::test]
    async fn test_quit_stops_before_remaining_input() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            "{\"command\":\"quit\"}\n",
            "{\"event\":\"did-begin-checking-for-update\"}\n",
        );

        let lines = run(input, &dir).await;

        assert_eq!(statuses(&lines).len(), 1);
    }

    #[tokio::test]
    async fn test_reset_after_same_version_download_keeps_host_phase() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            "{\"event\":\"did-complete-downloading-update\",\"releaseVersion\":\"1.7.0\"}\n",
            "{\"command\":\"reset\"}\n",
            "{\"event\":\"state\",\"state\":\"no-update-available\"}\n",
            "{\"command\":\"reset\"}\n",
        );

        let lines = run(input, &dir).await;

        let phases: Vec<_> = statuses(&lines)
            .iter()
            .map(|s| s["phase"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            phases,
            vec!["idle", "no-update-available", "idle", "no-update-available"]
        );
        assert!(statuses(&lines)
            .iter()
            .all(|s| s["phase"] != "update-available"));
    }

    #[tokio::test]
    async fn test_reset_rereads_host_snapshot() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            "{\"event\":\"state\",\"state\":\"unsupported\",\"supported\":false}\n",
            "{\"command\":\"reset\"}\n",
        );

        let lines = run(input, &dir).await;

        let last = statuses(&lines).pop().unwrap().clone();
        assert_eq!(last["phase"], "unsupported");
        assert_eq!(last["auto_updates_enabled"], false);
    }
}
