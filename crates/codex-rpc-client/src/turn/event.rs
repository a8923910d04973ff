//! Typed turn events and notification filtering

use codex_rpc_protocol::JsonRpcNotification;
use codex_rpc_protocol::methods::server_notification as method;
use codex_rpc_protocol::types::{
    ErrorNotification, ItemDeltaNotification, ItemNotification, ReasoningDeltaNotification,
    TokenUsageUpdatedNotification, TurnCompletedNotification, TurnDiffUpdatedNotification,
    TurnPlanUpdatedNotification, TurnStartedNotification,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Notifications a turn listens to
pub(crate) const TURN_NOTIFICATIONS: [&str; 13] = [
    method::TURN_STARTED,
    method::TURN_COMPLETED,
    method::TURN_DIFF_UPDATED,
    method::TURN_PLAN_UPDATED,
    method::THREAD_TOKEN_USAGE_UPDATED,
    method::ITEM_STARTED,
    method::ITEM_COMPLETED,
    method::AGENT_MESSAGE_DELTA,
    method::REASONING_TEXT_DELTA,
    method::REASONING_SUMMARY_TEXT_DELTA,
    method::COMMAND_EXECUTION_OUTPUT_DELTA,
    method::FILE_CHANGE_OUTPUT_DELTA,
    method::ERROR,
];

/// Something that happened during a turn
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TurnEvent {
    /// `turn/started`
    TurnStarted(TurnStartedNotification),
    /// `item/started`
    ItemStarted(ItemNotification),
    /// `item/completed`
    ItemCompleted(ItemNotification),
    /// `item/agentMessage/delta`
    AgentMessageDelta(ItemDeltaNotification),
    /// `item/reasoning/textDelta`
    ReasoningTextDelta(ReasoningDeltaNotification),
    /// `item/reasoning/summaryTextDelta`
    ReasoningSummaryDelta(ReasoningDeltaNotification),
    /// `item/commandExecution/outputDelta`
    CommandOutputDelta(ItemDeltaNotification),
    /// `item/fileChange/outputDelta`
    FileChangeOutputDelta(ItemDeltaNotification),
    /// `turn/diff/updated`
    DiffUpdated(TurnDiffUpdatedNotification),
    /// `turn/plan/updated`
    PlanUpdated(TurnPlanUpdatedNotification),
    /// `thread/tokenUsage/updated`
    TokenUsageUpdated(TokenUsageUpdatedNotification),
    /// `error`; check `will_retry` before treating it as fatal
    ServerError(ErrorNotification),
    /// `turn/completed`, always the last event of a turn
    TurnCompleted(TurnCompletedNotification),
}

impl TurnEvent {
    /// Convert a notification. `None` for methods a turn does not track.
    pub fn from_notification(notification: &JsonRpcNotification) -> Option<Result<Self>> {
        let event = match notification.method.as_str() {
            method::TURN_STARTED => decode(notification).map(Self::TurnStarted),
            method::TURN_COMPLETED => decode(notification).map(Self::TurnCompleted),
            method::TURN_DIFF_UPDATED => decode(notification).map(Self::DiffUpdated),
            method::TURN_PLAN_UPDATED => decode(notification).map(Self::PlanUpdated),
            method::THREAD_TOKEN_USAGE_UPDATED => {
                decode(notification).map(Self::TokenUsageUpdated)
            }
            method::ITEM_STARTED => decode(notification).map(Self::ItemStarted),
            method::ITEM_COMPLETED => decode(notification).map(Self::ItemCompleted),
            method::AGENT_MESSAGE_DELTA => decode(notification).map(Self::AgentMessageDelta),
            method::REASONING_TEXT_DELTA => decode(notification).map(Self::ReasoningTextDelta),
            method::REASONING_SUMMARY_TEXT_DELTA => {
                decode(notification).map(Self::ReasoningSummaryDelta)
            }
            method::COMMAND_EXECUTION_OUTPUT_DELTA => {
                decode(notification).map(Self::CommandOutputDelta)
            }
            method::FILE_CHANGE_OUTPUT_DELTA => {
                decode(notification).map(Self::FileChangeOutputDelta)
            }
            method::ERROR => decode(notification).map(Self::ServerError),
            _ => return None,
        };
        Some(event)
    }

    /// The wire method this event came from
    pub fn method(&self) -> &'static str {
        match self {
            Self::TurnStarted(_) => method::TURN_STARTED,
            Self::ItemStarted(_) => method::ITEM_STARTED,
            Self::ItemCompleted(_) => method::ITEM_COMPLETED,
            Self::AgentMessageDelta(_) => method::AGENT_MESSAGE_DELTA,
            Self::ReasoningTextDelta(_) => method::REASONING_TEXT_DELTA,
            Self::ReasoningSummaryDelta(_) => method::REASONING_SUMMARY_TEXT_DELTA,
            Self::CommandOutputDelta(_) => method::COMMAND_EXECUTION_OUTPUT_DELTA,
            Self::FileChangeOutputDelta(_) => method::FILE_CHANGE_OUTPUT_DELTA,
            Self::DiffUpdated(_) => method::TURN_DIFF_UPDATED,
            Self::PlanUpdated(_) => method::TURN_PLAN_UPDATED,
            Self::TokenUsageUpdated(_) => method::THREAD_TOKEN_USAGE_UPDATED,
            Self::ServerError(_) => method::ERROR,
            Self::TurnCompleted(_) => method::TURN_COMPLETED,
        }
    }
}

fn decode<P: DeserializeOwned>(notification: &JsonRpcNotification) -> Result<P> {
    let params = notification.params.clone().unwrap_or(Value::Null);
    serde_json::from_value(params).map_err(|e| Error::decode(notification.method.clone(), e))
}

/// The thread a notification belongs to, from `threadId`.
pub(crate) fn thread_id_of(notification: &JsonRpcNotification) -> Option<&str> {
    notification.param_str("threadId")
}

/// The turn a notification belongs to, from `turnId` or `turn.id`.
pub(crate) fn turn_id_of(notification: &JsonRpcNotification) -> Option<&str> {
    notification.param_str("turnId").or_else(|| {
        notification
            .params
            .as_ref()?
            .get("turn")?
            .get("id")?
            .as_str()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_rpc_protocol::types::ThreadItem;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn notification(method: &str, params: Value) -> JsonRpcNotification {
        JsonRpcNotification::new(method, Some(params))
    }

    #[test]
    fn test_every_tracked_method_converts() {
        let samples = [
            (
                method::TURN_STARTED,
                json!({"threadId": "t", "turn": {"id": "u", "status": "inProgress"}}),
            ),
            (
                method::TURN_COMPLETED,
                json!({"threadId": "t", "turn": {"id": "u", "status": "completed"}}),
            ),
            (
                method::TURN_DIFF_UPDATED,
                json!({"threadId": "t", "turnId": "u", "diff": ""}),
            ),
            (
                method::TURN_PLAN_UPDATED,
                json!({"threadId": "t", "turnId": "u", "plan": []}),
            ),
            (
                method::THREAD_TOKEN_USAGE_UPDATED,
                json!({"threadId": "t", "turnId": "u", "tokenUsage": {}}),
            ),
            (
                method::ITEM_STARTED,
                json!({"threadId": "t", "turnId": "u", "item": {"type": "agentMessage", "id": "m", "text": ""}}),
            ),
            (
                method::ITEM_COMPLETED,
                json!({"threadId": "t", "turnId": "u", "item": {"type": "agentMessage", "id": "m", "text": "hi"}}),
            ),
            (
                method::AGENT_MESSAGE_DELTA,
                json!({"threadId": "t", "turnId": "u", "itemId": "m", "delta": "h"}),
            ),
            (
                method::REASONING_TEXT_DELTA,
                json!({"threadId": "t", "turnId": "u", "itemId": "r", "delta": "x", "contentIndex": 0}),
            ),
            (
                method::REASONING_SUMMARY_TEXT_DELTA,
                json!({"threadId": "t", "turnId": "u", "itemId": "r", "delta": "x", "summaryIndex": 1}),
            ),
            (
                method::COMMAND_EXECUTION_OUTPUT_DELTA,
                json!({"threadId": "t", "turnId": "u", "itemId": "c", "delta": "out"}),
            ),
            (
                method::FILE_CHANGE_OUTPUT_DELTA,
                json!({"threadId": "t", "turnId": "u", "itemId": "f", "delta": "ok"}),
            ),
            (
                method::ERROR,
                json!({"threadId": "t", "turnId": "u", "error": {"message": "retrying"}, "willRetry": true}),
            ),
        ];
        assert_eq!(samples.len(), TURN_NOTIFICATIONS.len());

        for (wire_method, params) in samples {
            let event = TurnEvent::from_notification(&notification(wire_method, params))
                .unwrap_or_else(|| panic!("{wire_method} not tracked"))
                .unwrap_or_else(|e| panic!("{wire_method} did not decode: {e}"));
            assert_eq!(event.method(), wire_method);
            assert!(TURN_NOTIFICATIONS.contains(&wire_method));
        }
    }

    #[test]
    fn test_untracked_method_is_none() {
        let n = notification("thread/started", json!({"thread": {"id": "t"}}));
        assert!(TurnEvent::from_notification(&n).is_none());
    }

    #[test]
    fn test_bad_params_are_a_decode_error() {
        let n = notification(method::ITEM_COMPLETED, json!({"threadId": "t"}));
        let error = TurnEvent::from_notification(&n).unwrap().unwrap_err();
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[test]
    fn test_completed_item_converts() {
        let n = notification(
            method::ITEM_COMPLETED,
            json!({"threadId": "t", "turnId": "u", "item": {"type": "agentMessage", "id": "m", "text": "done"}}),
        );
        match TurnEvent::from_notification(&n).unwrap().unwrap() {
            TurnEvent::ItemCompleted(completed) => {
                assert_eq!(completed.item.agent_text(), Some("done"));
                assert!(matches!(completed.item, ThreadItem::AgentMessage(_)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_ids_are_read_from_either_shape() {
        let flat = notification(method::ITEM_STARTED, json!({"threadId": "t", "turnId": "u"}));
        assert_eq!(thread_id_of(&flat), Some("t"));
        assert_eq!(turn_id_of(&flat), Some("u"));

        let nested = notification(
            method::TURN_COMPLETED,
            json!({"threadId": "t", "turn": {"id": "u2"}}),
        );
        assert_eq!(turn_id_of(&nested), Some("u2"));

        let bare = JsonRpcNotification::new(method::ERROR, None);
        assert_eq!(thread_id_of(&bare), None);
        assert_eq!(turn_id_of(&bare), None);
    }
}
