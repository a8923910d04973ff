//! Wire round trips for payload types and discriminated unions.

use codex_rpc_protocol::types::{
    Account, ApiKeyLogin, ChatgptAccount, CommandExecutionApprovalDecision,
    CommandExecutionRequestApprovalResponse, FileChangeApprovalDecision, GetAccountResponse,
    ItemNotification, LoginAccountParams, ReviewDecision, ThreadItem, TurnCompletedNotification,
    TurnStatus, UserInput,
};
use codex_rpc_protocol::{RawVariant, Secret};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn known_thread_item_round_trips() {
    let text = r#"{"type":"agentMessage","id":"msg_1","text":"hello"}"#;
    let item: ThreadItem = serde_json::from_str(text).unwrap();
    assert_eq!(item.agent_text(), Some("hello"));
    assert_eq!(item.id().as_deref(), Some("msg_1"));
    assert_eq!(item.known_tag(), Some("agentMessage"));
    assert_eq!(serde_json::to_string(&item).unwrap(), text);
}

#[test]
fn unknown_thread_item_keeps_exact_bytes() {
    let text = r#"{"type":"hologram", "id":"h1","beams":[1.50,2]}"#;
    let item: ThreadItem = serde_json::from_str(text).unwrap();
    match &item {
        ThreadItem::Unknown(raw) => assert_eq!(raw.tag("type").as_deref(), Some("hologram")),
        other => panic!("expected unknown item, got {other:?}"),
    }
    assert_eq!(item.id().as_deref(), Some("h1"));
    assert_eq!(serde_json::to_string(&item).unwrap(), text);
}

#[test]
fn nested_unknown_item_survives_enclosing_struct() {
    let text = r#"{"threadId":"t","turnId":"u","item":{"type":"futureThing","x":1}}"#;
    let notification: ItemNotification = serde_json::from_str(text).unwrap();
    assert!(matches!(notification.item, ThreadItem::Unknown(_)));
    assert_eq!(serde_json::to_string(&notification).unwrap(), text);
}

#[test]
fn items_decode_from_value() {
    let params = json!({
        "threadId": "t",
        "turnId": "u",
        "item": {"type": "commandExecution", "id": "c1", "command": "ls", "cwd": "/tmp", "status": "completed", "exitCode": 0}
    });
    let notification: ItemNotification = serde_json::from_value(params).unwrap();
    match notification.item {
        ThreadItem::CommandExecution(item) => {
            assert_eq!(item.command, "ls");
            assert_eq!(item.exit_code, Some(0));
        }
        other => panic!("expected command execution, got {other:?}"),
    }
}

#[test]
fn user_input_round_trips() {
    let input = UserInput::text("fix the build");
    let value = serde_json::to_value(&input).unwrap();
    assert_eq!(value, json!({"type": "text", "text": "fix the build"}));
    let back: UserInput = serde_json::from_value(value).unwrap();
    assert_eq!(back, input);
}

#[test]
fn account_union_round_trips() {
    let response: GetAccountResponse = serde_json::from_str(
        r#"{"account":{"type":"chatgpt","email":"dev@example.com","planType":"pro"},"requiresOpenaiAuth":true}"#,
    )
    .unwrap();
    assert_eq!(
        response.account,
        Some(Account::Chatgpt(ChatgptAccount {
            email: Some("dev@example.com".to_string()),
            plan_type: Some("pro".to_string()),
        }))
    );

    let text = r#"{"type":"enterpriseSso","tenant":"acme"}"#;
    let account: Account = serde_json::from_str(text).unwrap();
    assert!(matches!(account, Account::Unknown(_)));
    assert_eq!(serde_json::to_string(&account).unwrap(), text);
}

#[test]
fn command_decisions_round_trip() {
    for (decision, wire) in [
        (CommandExecutionApprovalDecision::Accept, r#""accept""#),
        (
            CommandExecutionApprovalDecision::AcceptForSession,
            r#""acceptForSession""#,
        ),
        (CommandExecutionApprovalDecision::Decline, r#""decline""#),
        (CommandExecutionApprovalDecision::Cancel, r#""cancel""#),
        (
            CommandExecutionApprovalDecision::AcceptWithExecpolicyAmendment {
                execpolicy_amendment: vec!["cargo".to_string(), "test".to_string()],
            },
            r#"{"acceptWithExecpolicyAmendment":{"execpolicyAmendment":["cargo","test"]}}"#,
        ),
    ] {
        assert_eq!(serde_json::to_string(&decision).unwrap(), wire);
        let back: CommandExecutionApprovalDecision = serde_json::from_str(wire).unwrap();
        assert_eq!(back, decision);
    }
}

#[test]
fn unknown_decisions_keep_bytes() {
    let text = r#"{"decision":{"acceptWithSandboxEscape":true}}"#;
    let response: CommandExecutionRequestApprovalResponse = serde_json::from_str(text).unwrap();
    assert!(matches!(
        response.decision,
        CommandExecutionApprovalDecision::Unknown(_)
    ));
    assert_eq!(serde_json::to_string(&response).unwrap(), text);

    let file: FileChangeApprovalDecision = serde_json::from_str(r#""later""#).unwrap();
    assert_eq!(
        file,
        FileChangeApprovalDecision::Unknown(RawVariant::from_value(&json!("later")).unwrap())
    );

    let review: ReviewDecision = serde_json::from_str(r#""approved_for_session""#).unwrap();
    assert_eq!(review, ReviewDecision::ApprovedForSession);
    assert_eq!(
        serde_json::to_string(&ReviewDecision::Abort).unwrap(),
        r#""abort""#
    );
}

#[test]
fn turn_completed_with_error_and_unknown_status() {
    let text = r#"{"threadId":"t","turn":{"id":"u","items":[],"status":"paused","error":{"message":"rate limited"}}}"#;
    let notification: TurnCompletedNotification = serde_json::from_str(text).unwrap();
    assert_eq!(
        notification.turn.status,
        TurnStatus::Other("paused".to_string())
    );
    assert_eq!(
        notification.turn.error.as_ref().map(ToString::to_string),
        Some("rate limited".to_string())
    );
    assert_eq!(serde_json::to_string(&notification).unwrap(), text);
}

#[test]
fn login_params_redact_text_but_not_wire() {
    let params = LoginAccountParams::ApiKey(ApiKeyLogin {
        api_key: Secret::new("sk-test-abcdef"),
    });

    let debug = format!("{params:?}");
    assert!(!debug.contains("sk-test-abcdef"), "leaked in {debug}");
    assert!(debug.contains("<redacted>"));

    let wire = serde_json::to_string(&params).unwrap();
    assert_eq!(wire, r#"{"type":"apiKey","apiKey":"sk-test-abcdef"}"#);

    let back: LoginAccountParams = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, params);
}
