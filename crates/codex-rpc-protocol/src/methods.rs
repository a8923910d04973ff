//! Method names used on the wire.

/// Requests the client sends to the server.
pub mod client_request {
    /// Handshake request, sent once per connection
    pub const INITIALIZE: &str = "initialize";
    /// Start a new thread
    pub const THREAD_START: &str = "thread/start";
    /// Load a stored thread back into the server
    pub const THREAD_RESUME: &str = "thread/resume";
    /// Start a turn on a thread
    pub const TURN_START: &str = "turn/start";
    /// Interrupt a running turn
    pub const TURN_INTERRUPT: &str = "turn/interrupt";
    /// Read the signed-in account
    pub const ACCOUNT_READ: &str = "account/read";
    /// Begin a login flow
    pub const ACCOUNT_LOGIN_START: &str = "account/login/start";
    /// Sign out
    pub const ACCOUNT_LOGOUT: &str = "account/logout";
    /// List available models
    pub const MODEL_LIST: &str = "model/list";
}

/// Notifications the client sends to the server.
pub mod client_notification {
    /// Sent right after a successful `initialize`
    pub const INITIALIZED: &str = "initialized";
}

/// Notifications the server sends to the client.
pub mod server_notification {
    /// A thread was created
    pub const THREAD_STARTED: &str = "thread/started";
    /// A turn began
    pub const TURN_STARTED: &str = "turn/started";
    /// A turn reached a terminal status
    pub const TURN_COMPLETED: &str = "turn/completed";
    /// The aggregated diff of a turn changed
    pub const TURN_DIFF_UPDATED: &str = "turn/diff/updated";
    /// The plan of a turn changed
    pub const TURN_PLAN_UPDATED: &str = "turn/plan/updated";
    /// Token usage for a thread changed
    pub const THREAD_TOKEN_USAGE_UPDATED: &str = "thread/tokenUsage/updated";
    /// An item began
    pub const ITEM_STARTED: &str = "item/started";
    /// An item finished
    pub const ITEM_COMPLETED: &str = "item/completed";
    /// Streamed agent message text
    pub const AGENT_MESSAGE_DELTA: &str = "item/agentMessage/delta";
    /// Streamed raw reasoning text
    pub const REASONING_TEXT_DELTA: &str = "item/reasoning/textDelta";
    /// Streamed reasoning summary text
    pub const REASONING_SUMMARY_TEXT_DELTA: &str = "item/reasoning/summaryTextDelta";
    /// Streamed command output
    pub const COMMAND_EXECUTION_OUTPUT_DELTA: &str = "item/commandExecution/outputDelta";
    /// Streamed patch application output
    pub const FILE_CHANGE_OUTPUT_DELTA: &str = "item/fileChange/outputDelta";
    /// A turn-level error, possibly followed by a retry
    pub const ERROR: &str = "error";
}

/// Requests the server sends to the client. All of them are approval flows.
pub mod server_request {
    /// Approve or decline running a command
    pub const COMMAND_EXECUTION_REQUEST_APPROVAL: &str = "item/commandExecution/requestApproval";
    /// Approve or decline applying a file change
    pub const FILE_CHANGE_REQUEST_APPROVAL: &str = "item/fileChange/requestApproval";
    /// Legacy command approval
    pub const EXEC_COMMAND_APPROVAL: &str = "execCommandApproval";
    /// Legacy patch approval
    pub const APPLY_PATCH_APPROVAL: &str = "applyPatchApproval";

    /// Every approval method the client can answer.
    pub const APPROVAL_METHODS: [&str; 4] = [
        COMMAND_EXECUTION_REQUEST_APPROVAL,
        FILE_CHANGE_REQUEST_APPROVAL,
        EXEC_COMMAND_APPROVAL,
        APPLY_PATCH_APPROVAL,
    ];
}
