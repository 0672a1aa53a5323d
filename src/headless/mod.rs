//! Headless mode - NDJSON bridge between a host process and the update manager
//!
//! The host writes its updater lifecycle events and user commands to our
//! stdin, one JSON object per line. We write status snapshots, requests for
//! the host, and errors to stdout the same way.
//!
//! # Example Session
//!
//! ```json
//! <- {"event":"did-begin-checking-for-update"}
//! -> {"event":"status","phase":"checking","current_version":"1.7.0",...,"timestamp":1704700001000}
//! <- {"event":"did-complete-downloading-update","releaseVersion":"1.8.0"}
//! -> {"event":"status","phase":"update-available","available_version":"1.8.0",...}
//! <- {"command":"restart"}
//! -> {"event":"request","action":"restart-and-install-update","timestamp":1704700003000}
//! ```

pub mod bridge;
pub mod protocol;
pub mod runner;

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use about_app::UpdateStatus;
use about_core::UpdatePhase;

/// Events written to stdout in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Update status after a change notification
    Status {
        phase: UpdatePhase,
        current_version: String,
        available_version: String,
        auto_updates_enabled: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
        release_notes_url: String,
        timestamp: i64,
    },

    /// Something the host must do (check, restart and install)
    Request { action: String, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn status(status: UpdateStatus) -> Self {
        Self::Status {
            phase: status.phase,
            current_version: status.current_version,
            available_version: status.available_version,
            auto_updates_enabled: status.auto_updates_enabled,
            error_message: status.error_message,
            release_notes_url: status.release_notes_url,
            timestamp: Self::now(),
        }
    }

    pub fn request(action: &str) -> Self {
        Self::Request {
            action: action.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }
}

/// Shared NDJSON output. Clones write to the same sink, one whole line at a
/// time.
#[derive(Clone)]
pub struct EventWriter {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl EventWriter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write `event` as one JSON line and flush
    pub fn emit(&self, event: &HeadlessEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", json) {
            error!("Failed to write headless event: {}", e);
            return;
        }

        // Flush to ensure immediate output
        if let Err(e) = out.flush() {
            error!("Failed to flush headless output: {}", e);
        }
    }
}

impl fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWriter").finish_non_exhaustive()
    }
}
