//! Turn records and turn requests.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::items::{ThreadItem, UserInput};

/// A turn as the server reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Turn id
    pub id: String,
    /// Items, when the server includes them
    #[serde(default)]
    pub items: Vec<ThreadItem>,
    /// Current status
    pub status: TurnStatus,
    /// Turn-level failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

/// Turn status. Statuses newer than this client are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TurnStatus {
    /// Finished normally
    Completed,
    /// Stopped by `turn/interrupt`
    Interrupted,
    /// Failed; see [`Turn::error`]
    Failed,
    /// Still running
    InProgress,
    /// A status this client does not know yet
    Other(String),
}

impl From<String> for TurnStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "completed" => Self::Completed,
            "interrupted" => Self::Interrupted,
            "failed" => Self::Failed,
            "inProgress" => Self::InProgress,
            _ => Self::Other(value),
        }
    }
}

impl From<TurnStatus> for String {
    fn from(status: TurnStatus) -> Self {
        match status {
            TurnStatus::Completed => "completed".to_string(),
            TurnStatus::Interrupted => "interrupted".to_string(),
            TurnStatus::Failed => "failed".to_string(),
            TurnStatus::InProgress => "inProgress".to_string(),
            TurnStatus::Other(other) => other,
        }
    }
}

/// A turn-level error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnError {
    /// Human readable message
    pub message: String,
    /// Structured error classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codex_error_info: Option<Value>,
    /// Extra details, such as an upstream error body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
}

impl TurnError {
    /// An error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            codex_error_info: None,
            additional_details: None,
        }
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.additional_details {
            Some(details) => write!(f, "{} ({details})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Params for `turn/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnStartParams {
    /// Thread to run the turn on
    pub thread_id: String,
    /// What the user sent
    pub input: Vec<UserInput>,
    /// Working directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Approval policy override, passed through as given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_policy: Option<Value>,
}

/// Result of `turn/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnStartResponse {
    /// The turn as it was created
    pub turn: Turn,
}

/// Params for `turn/interrupt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInterruptParams {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
}

/// Result of `turn/interrupt`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInterruptResponse {}
