//! Approval requests the server sends and the decisions the client returns.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::union::{RawVariant, string_union};

/// Params of `item/commandExecution/requestApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandExecutionRequestApprovalParams {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Command item awaiting the decision
    pub item_id: String,
    /// Why the agent wants to run it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Exec policy prefix the server proposes to allow from now on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_execpolicy_amendment: Option<Vec<String>>,
}

/// Result of `item/commandExecution/requestApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecutionRequestApprovalResponse {
    /// The decision
    pub decision: CommandExecutionApprovalDecision,
}

/// Decision on a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandExecutionApprovalDecision {
    /// Run it once
    Accept,
    /// Run it and similar commands for the rest of the session
    AcceptForSession,
    /// Run it and add the given prefix to the exec policy
    AcceptWithExecpolicyAmendment {
        /// Command prefix to allow
        execpolicy_amendment: Vec<String>,
    },
    /// Do not run it; the turn continues
    Decline,
    /// Do not run it and stop the turn
    Cancel,
    /// A decision this client does not know yet
    Unknown(RawVariant),
}

string_union!(CommandExecutionApprovalDecision, {
    "accept" => Accept,
    "acceptForSession" => AcceptForSession,
    "decline" => Decline,
    "cancel" => Cancel,
});

const EXECPOLICY_AMENDMENT: &str = "acceptWithExecpolicyAmendment";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecpolicyAmendment {
    execpolicy_amendment: Vec<String>,
}

impl Serialize for CommandExecutionApprovalDecision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::AcceptWithExecpolicyAmendment {
                execpolicy_amendment,
            } => {
                let mut object = BTreeMap::new();
                object.insert(
                    EXECPOLICY_AMENDMENT,
                    ExecpolicyAmendment {
                        execpolicy_amendment: execpolicy_amendment.clone(),
                    },
                );
                object.serialize(serializer)
            }
            Self::Unknown(raw) => raw.serialize(serializer),
            known => serializer.serialize_str(known.as_str().unwrap_or_default()),
        }
    }
}

impl<'de> Deserialize<'de> for CommandExecutionApprovalDecision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let value: Value = serde_json::from_str(raw.get()).map_err(D::Error::custom)?;
        if let Some(text) = value.as_str()
            && let Some(known) = Self::from_known(text)
        {
            return Ok(known);
        }
        if let Some(amendment) = single_key(&value, EXECPOLICY_AMENDMENT)
            && let Ok(ExecpolicyAmendment {
                execpolicy_amendment,
            }) = serde_json::from_value(amendment.clone())
        {
            return Ok(Self::AcceptWithExecpolicyAmendment {
                execpolicy_amendment,
            });
        }
        Ok(Self::Unknown(RawVariant::new(raw)))
    }
}

fn single_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let object: &Map<String, Value> = value.as_object()?;
    if object.len() == 1 { object.get(key) } else { None }
}

/// Params of `item/fileChange/requestApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeRequestApprovalParams {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// File change item awaiting the decision
    pub item_id: String,
    /// Why the agent wants to write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Directory the agent asks to write under for the rest of the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_root: Option<PathBuf>,
}

/// Result of `item/fileChange/requestApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeRequestApprovalResponse {
    /// The decision
    pub decision: FileChangeApprovalDecision,
}

/// Decision on a file change.
#[derive(Debug, Clone, PartialEq)]
pub enum FileChangeApprovalDecision {
    /// Apply it
    Accept,
    /// Apply it and similar changes for the rest of the session
    AcceptForSession,
    /// Do not apply it; the turn continues
    Decline,
    /// Do not apply it and stop the turn
    Cancel,
    /// A decision this client does not know yet
    Unknown(RawVariant),
}

string_union!(FileChangeApprovalDecision, {
    "accept" => Accept,
    "acceptForSession" => AcceptForSession,
    "decline" => Decline,
    "cancel" => Cancel,
});

/// Decision used by the legacy approval requests.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewDecision {
    /// Approve once
    Approved,
    /// Approve for the rest of the session
    ApprovedForSession,
    /// Deny; the turn continues
    Denied,
    /// Deny and stop the turn
    Abort,
    /// A decision this client does not know yet
    Unknown(RawVariant),
}

string_union!(ReviewDecision, {
    "approved" => Approved,
    "approved_for_session" => ApprovedForSession,
    "denied" => Denied,
    "abort" => Abort,
});

/// Serde for decisions that are bare strings plus an unknown fallback.
macro_rules! string_decision_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                match self {
                    Self::Unknown(raw) => raw.serialize(serializer),
                    known => serializer.serialize_str(known.as_str().unwrap_or_default()),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = Box::<RawValue>::deserialize(deserializer)?;
                let known = serde_json::from_str::<String>(raw.get())
                    .ok()
                    .and_then(|text| Self::from_known(&text));
                Ok(known.unwrap_or_else(|| Self::Unknown(RawVariant::new(raw))))
            }
        }
    };
}

string_decision_serde!(FileChangeApprovalDecision);
string_decision_serde!(ReviewDecision);

/// Params of the legacy `execCommandApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommandApprovalParams {
    /// Conversation (thread) id
    pub conversation_id: String,
    /// Tool call id
    pub call_id: String,
    /// Command argv
    pub command: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Why the agent wants to run it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of the legacy `execCommandApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecCommandApprovalResponse {
    /// The decision
    pub decision: ReviewDecision,
}

/// Params of the legacy `applyPatchApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPatchApprovalParams {
    /// Conversation (thread) id
    pub conversation_id: String,
    /// Tool call id
    pub call_id: String,
    /// Per-file changes, keyed by path
    #[serde(default)]
    pub file_changes: Map<String, Value>,
    /// Why the agent wants to write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Directory the agent asks to write under for the rest of the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_root: Option<PathBuf>,
}

/// Result of the legacy `applyPatchApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPatchApprovalResponse {
    /// The decision
    pub decision: ReviewDecision,
}
