//! Update lifecycle phase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The single authoritative status of the update lifecycle.
///
/// The serialized names are the state strings the host updater reports from
/// its synchronous state query, so a phase read from the host maps 1:1 onto
/// this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdatePhase {
    /// The platform cannot self-update. Terminal for the session.
    #[serde(rename = "unsupported")]
    Unsupported,
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "checking")]
    Checking,
    #[serde(rename = "downloading")]
    Downloading,
    /// A newer build has been downloaded and installs on restart.
    #[serde(rename = "update-available")]
    UpdateAvailable,
    #[serde(rename = "no-update-available")]
    UpToDate,
    #[serde(rename = "error")]
    Error,
}

impl UpdatePhase {
    pub const ALL: [UpdatePhase; 7] = [
        UpdatePhase::Unsupported,
        UpdatePhase::Idle,
        UpdatePhase::Checking,
        UpdatePhase::Downloading,
        UpdatePhase::UpdateAvailable,
        UpdatePhase::UpToDate,
        UpdatePhase::Error,
    ];

    /// The host's wire name for this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Downloading => "downloading",
            Self::UpdateAvailable => "update-available",
            Self::UpToDate => "no-update-available",
            Self::Error => "error",
        }
    }

    /// A check or download is in flight and cannot be cancelled
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Checking | Self::Downloading)
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdatePhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdatePhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| Error::protocol(format!("unknown update state '{}'", s)))
    }
}
