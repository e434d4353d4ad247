//! Messages exchanged between the extension UI surfaces and the content script.
//!
//! Messages are JSON objects tagged by a `type` field. Adding a variant to
//! [`ExtensionMessage`] forces every dispatcher `match` to handle it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Message sent to the content script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExtensionMessage {
    /// Reload configuration from storage and reapply.
    Refresh,
    /// Query the current transformation / overlay status.
    GetStatus,
    /// Legacy: force the layout feature on.
    Enable,
    /// Legacy: force the layout feature off.
    Disable,
    /// Legacy: flip the debug overlay.
    ToggleDebug,
}

impl ExtensionMessage {
    /// Parse a raw message. Returns `None` for unknown or malformed kinds.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtensionMessage::Refresh => "refresh",
            ExtensionMessage::GetStatus => "getStatus",
            ExtensionMessage::Enable => "enable",
            ExtensionMessage::Disable => "disable",
            ExtensionMessage::ToggleDebug => "toggleDebug",
        }
    }
}

/// Status snapshot of the content script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationStatus {
    /// Whether the layout feature is enabled.
    pub enabled: bool,
    /// Whether the player cards currently sit in the sidebar.
    pub player_cards_extracted: bool,
    /// Whether the companion stylesheet is present.
    pub css_injected: bool,
    /// Whether the lag overlay is running.
    pub lag_overlay: bool,
    /// Orchestrator state name.
    #[serde(default)]
    pub state: String,
}

/// Response to an [`ExtensionMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransformationStatus>,
}

impl MessageResponse {
    /// Plain acknowledgement.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            status: None,
        }
    }

    /// Acknowledgement carrying a status snapshot.
    pub fn with_status(status: TransformationStatus) -> Self {
        Self {
            success: true,
            error: None,
            status: Some(status),
        }
    }

    /// Failure with a reason.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            status: None,
        }
    }

    /// Response for a message kind nobody understands.
    pub fn unknown() -> Self {
        Self::error("Unknown message type")
    }
}
