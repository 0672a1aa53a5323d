//! Update lifecycle events reported by the host updater

use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by the host update-checker service.
///
/// The error event carries no payload: the message is read back from the
/// checker's own error-message query when the event is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum UpdaterEvent {
    #[serde(rename = "did-begin-checking-for-update")]
    CheckingForUpdate,

    #[serde(rename = "did-begin-downloading-update")]
    DownloadingUpdate,

    #[serde(rename = "did-complete-downloading-update")]
    DownloadCompleted {
        #[serde(rename = "releaseVersion")]
        release_version: String,
    },

    #[serde(rename = "update-not-available")]
    UpdateNotAvailable,

    #[serde(rename = "update-error")]
    UpdateError,
}

impl UpdaterEvent {
    pub fn download_completed(release_version: impl Into<String>) -> Self {
        Self::DownloadCompleted {
            release_version: release_version.into(),
        }
    }

    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CheckingForUpdate => "checking_for_update",
            Self::DownloadingUpdate => "downloading_update",
            Self::DownloadCompleted { .. } => "download_completed",
            Self::UpdateNotAvailable => "update_not_available",
            Self::UpdateError => "update_error",
        }
    }
}
