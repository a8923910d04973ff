//! Payload types for the methods and notifications the client runtime uses.
//!
//! Union members the client does not recognise decode into an `Unknown`
//! variant that re-encodes to the exact bytes it was read from.

mod account;
mod approvals;
mod initialize;
mod items;
mod notifications;
mod thread;
mod turn;

pub use account::{
    Account, ApiKeyAccount, ApiKeyLogin, ChatgptAccount, ChatgptLogin, ChatgptLoginStarted,
    GetAccountParams, GetAccountResponse, LoginAccountParams, LoginAccountResponse,
    LogoutAccountResponse,
};
pub use approvals::{
    ApplyPatchApprovalParams, ApplyPatchApprovalResponse, CommandExecutionApprovalDecision,
    CommandExecutionRequestApprovalParams, CommandExecutionRequestApprovalResponse,
    ExecCommandApprovalParams, ExecCommandApprovalResponse, FileChangeApprovalDecision,
    FileChangeRequestApprovalParams, FileChangeRequestApprovalResponse, ReviewDecision,
};
pub use initialize::{
    ClientInfo, InitializeParams, InitializeResponse, Model, ModelListParams, ModelListResponse,
};
pub use items::{
    AgentMessageItem, CommandExecutionItem, FileChangeItem, FileUpdateChange, ImageInput,
    LocalImageInput, McpToolCallItem, ReasoningItem, TextInput, ThreadItem, UserInput,
    UserMessageItem, WebSearchItem,
};
pub use notifications::{
    ErrorNotification, ItemDeltaNotification, ItemNotification, PlanStep,
    ReasoningDeltaNotification, ThreadStartedNotification, ThreadTokenUsage,
    TokenUsageBreakdown, TokenUsageUpdatedNotification, TurnCompletedNotification,
    TurnDiffUpdatedNotification, TurnPlanUpdatedNotification, TurnStartedNotification,
};
pub use thread::{
    Thread, ThreadResumeParams, ThreadResumeResponse, ThreadStartParams, ThreadStartResponse,
};
pub use turn::{
    Turn, TurnError, TurnInterruptParams, TurnInterruptResponse, TurnStartParams,
    TurnStartResponse, TurnStatus,
};
