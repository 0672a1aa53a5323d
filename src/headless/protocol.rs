//! Messages the host writes to our stdin

use serde::Deserialize;
use serde_json::Value;

use about_core::prelude::*;
use about_core::{UpdatePhase, UpdaterEvent};

/// Event tag of a host state snapshot
const STATE_EVENT: &str = "state";

/// What the host's updater currently reports
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub state: UpdatePhase,
    #[serde(default = "default_true")]
    pub supported: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

fn default_true() -> bool {
    true
}

/// User actions relayed by the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum UserCommand {
    Check,
    Restart,
    Reset,
    SetAutoUpdate { enabled: bool },
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    Updater(UpdaterEvent),
    Snapshot(HostSnapshot),
    Command(UserCommand),
}

impl HostMessage {
    /// Parse one NDJSON line
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;

        if value.get("command").is_some() {
            return Ok(Self::Command(serde_json::from_value(value)?));
        }

        match value.get("event").and_then(Value::as_str) {
            Some(STATE_EVENT) => Ok(Self::Snapshot(serde_json::from_value(value)?)),
            Some(_) => Ok(Self::Updater(serde_json::from_value(value)?)),
            None => Err(Error::protocol(format!(
                "Expected an \"event\" or \"command\" field: {}",
                line
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updater_events() {
        assert_eq!(
            HostMessage::parse(r#"{"event":"did-begin-checking-for-update"}"#).unwrap(),
            HostMessage::Updater(UpdaterEvent::CheckingForUpdate)
        );
        assert_eq!(
            HostMessage::parse(
                r#"{"event":"did-complete-downloading-update","releaseVersion":"1.8.0"}"#
            )
            .unwrap(),
            HostMessage::Updater(UpdaterEvent::download_completed("1.8.0"))
        );
    }

    #[test]
    fn test_parse_snapshot() {
        let message = HostMessage::parse(
            r#"{"event":"state","state":"error","errorMessage":"network timeout"}"#,
        )
        .unwrap();

        assert_eq!(
            message,
            HostMessage::Snapshot(HostSnapshot {
                state: UpdatePhase::Error,
                supported: true,
                error_message: Some("network timeout".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_unsupported_snapshot() {
        let message =
            HostMessage::parse(r#"{"event":"state","state":"unsupported","supported":false}"#)
                .unwrap();
        assert!(matches!(
            message,
            HostMessage::Snapshot(HostSnapshot {
                supported: false,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            HostMessage::parse(r#"{"command":"check"}"#).unwrap(),
            HostMessage::Command(UserCommand::Check)
        );
        assert_eq!(
            HostMessage::parse(r#"{"command":"set-auto-update","enabled":false}"#).unwrap(),
            HostMessage::Command(UserCommand::SetAutoUpdate { enabled: false })
        );
        assert_eq!(
            HostMessage::parse(r#"{"command":"quit"}"#).unwrap(),
            HostMessage::Command(UserCommand::Quit)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            HostMessage::parse("not json").unwrap_err(),
            Error::Json(_)
        ));
        assert!(matches!(
            HostMessage::parse(r#"{"hello":"world"}"#).unwrap_err(),
            Error::Protocol { .. }
        ));
        assert!(HostMessage::parse(r#"{"event":"did-explode"}"#).is_err());
        assert!(HostMessage::parse(r#"{"command":"dance"}"#).is_err());
        assert!(HostMessage::parse(r#"{"command":"set-auto-update"}"#).is_err());
    }
}
