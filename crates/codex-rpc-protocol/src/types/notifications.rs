//! Server notification payloads.

use serde::{Deserialize, Serialize};

use super::items::ThreadItem;
use super::thread::Thread;
use super::turn::{Turn, TurnError};

/// `thread/started`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadStartedNotification {
    /// The new thread
    pub thread: Thread,
}

/// `turn/started`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnStartedNotification {
    /// Thread id
    pub thread_id: String,
    /// The turn
    pub turn: Turn,
}

/// `turn/completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnCompletedNotification {
    /// Thread id
    pub thread_id: String,
    /// The finished turn, with its terminal status and error
    pub turn: Turn,
}

/// `item/started` and `item/completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// The item
    pub item: ThreadItem,
}

/// Streamed text for an item: agent message, command output or patch output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeltaNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Item the text belongs to
    pub item_id: String,
    /// Text fragment
    pub delta: String,
}

/// `item/reasoning/textDelta` and `item/reasoning/summaryTextDelta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningDeltaNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Item the text belongs to
    pub item_id: String,
    /// Text fragment
    pub delta: String,
    /// Paragraph index (content or summary, depending on the method)
    #[serde(default, alias = "contentIndex", alias = "summaryIndex")]
    pub index: i64,
}

/// `turn/diff/updated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnDiffUpdatedNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Unified diff of everything the turn changed so far
    pub diff: String,
}

/// `turn/plan/updated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPlanUpdatedNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Why the plan changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Plan steps
    #[serde(default)]
    pub plan: Vec<PlanStep>,
}

/// One plan step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Step text
    pub step: String,
    /// `pending`, `inProgress` or `completed`
    pub status: String,
}

/// `thread/tokenUsage/updated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageUpdatedNotification {
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
    /// Usage totals
    pub token_usage: ThreadTokenUsage,
}

/// Token usage for a thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadTokenUsage {
    /// Running totals for the thread
    #[serde(default)]
    pub total: TokenUsageBreakdown,
    /// Usage of the last model call
    #[serde(default)]
    pub last: TokenUsageBreakdown,
    /// Context window of the model, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_context_window: Option<i64>,
}

/// Token counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageBreakdown {
    /// All tokens
    #[serde(default)]
    pub total_tokens: i64,
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: i64,
    /// Prompt tokens served from cache
    #[serde(default)]
    pub cached_input_tokens: i64,
    /// Completion tokens
    #[serde(default)]
    pub output_tokens: i64,
    /// Completion tokens spent on reasoning
    #[serde(default)]
    pub reasoning_output_tokens: i64,
}

/// `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotification {
    /// What went wrong
    pub error: TurnError,
    /// Whether the server will retry on its own
    #[serde(default)]
    pub will_retry: bool,
    /// Thread id
    pub thread_id: String,
    /// Turn id
    pub turn_id: String,
}
