//! Thread items and user input.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::union::{RawVariant, tagged_union};

/// One unit of turn output.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadItem {
    /// Input the user sent
    UserMessage(UserMessageItem),
    /// Text the agent produced
    AgentMessage(AgentMessageItem),
    /// Model reasoning
    Reasoning(ReasoningItem),
    /// A shell command
    CommandExecution(CommandExecutionItem),
    /// A set of file edits
    FileChange(FileChangeItem),
    /// A call to an MCP tool
    McpToolCall(McpToolCallItem),
    /// A web search
    WebSearch(WebSearchItem),
    /// An item type this client does not know yet
    Unknown(RawVariant),
}

tagged_union!(ThreadItem, tag = "type", {
    "userMessage" => UserMessage(UserMessageItem),
    "agentMessage" => AgentMessage(AgentMessageItem),
    "reasoning" => Reasoning(ReasoningItem),
    "commandExecution" => CommandExecution(CommandExecutionItem),
    "fileChange" => FileChange(FileChangeItem),
    "mcpToolCall" => McpToolCall(McpToolCallItem),
    "webSearch" => WebSearch(WebSearchItem),
});

impl ThreadItem {
    /// The item id, when the variant carries one.
    pub fn id(&self) -> Option<String> {
        match self {
            Self::UserMessage(item) => Some(item.id.clone()),
            Self::AgentMessage(item) => Some(item.id.clone()),
            Self::Reasoning(item) => Some(item.id.clone()),
            Self::CommandExecution(item) => Some(item.id.clone()),
            Self::FileChange(item) => Some(item.id.clone()),
            Self::McpToolCall(item) => Some(item.id.clone()),
            Self::WebSearch(item) => Some(item.id.clone()),
            Self::Unknown(raw) => raw.tag("id"),
        }
    }

    /// The agent text, for agent message items.
    pub fn agent_text(&self) -> Option<&str> {
        match self {
            Self::AgentMessage(item) => Some(&item.text),
            _ => None,
        }
    }
}

/// A user message item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessageItem {
    /// Item id
    pub id: String,
    /// What the user sent
    #[serde(default)]
    pub content: Vec<UserInput>,
}

/// An agent message item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageItem {
    /// Item id
    pub id: String,
    /// Full message text
    pub text: String,
}

/// A reasoning item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningItem {
    /// Item id
    pub id: String,
    /// Summary paragraphs
    #[serde(default)]
    pub summary: Vec<String>,
    /// Raw reasoning paragraphs, when the server exposes them
    #[serde(default)]
    pub content: Vec<String>,
}

/// A command execution item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandExecutionItem {
    /// Item id
    pub id: String,
    /// The command line as run
    pub command: String,
    /// Working directory
    pub cwd: PathBuf,
    /// `inProgress`, `completed`, `failed` or `declined`
    pub status: String,
    /// Combined stdout and stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregated_output: Option<String>,
    /// Process exit code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Wall time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

/// A file change item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeItem {
    /// Item id
    pub id: String,
    /// One entry per touched file
    #[serde(default)]
    pub changes: Vec<FileUpdateChange>,
    /// `inProgress`, `completed`, `failed` or `declined`
    pub status: String,
}

/// A change to one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdateChange {
    /// File path
    pub path: PathBuf,
    /// Add, delete or update, as the server describes it
    pub kind: Value,
    /// Unified diff
    #[serde(default)]
    pub diff: String,
}

/// An MCP tool call item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolCallItem {
    /// Item id
    pub id: String,
    /// MCP server name
    pub server: String,
    /// Tool name
    pub tool: String,
    /// `inProgress`, `completed` or `failed`
    pub status: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Value,
    /// Tool result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Tool error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// A web search item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchItem {
    /// Item id
    pub id: String,
    /// Search query
    pub query: String,
}

/// Something the user sends as part of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    /// Plain text
    Text(TextInput),
    /// An image by URL
    Image(ImageInput),
    /// An image on the local filesystem
    LocalImage(LocalImageInput),
    /// An input type this client does not know yet
    Unknown(RawVariant),
}

tagged_union!(UserInput, tag = "type", {
    "text" => Text(TextInput),
    "image" => Image(ImageInput),
    "localImage" => LocalImage(LocalImageInput),
});

impl UserInput {
    /// Text input
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextInput { text: text.into() })
    }
}

/// Text input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInput {
    /// The text
    pub text: String,
}

/// Image input by URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    /// Image URL or data URL
    pub url: String,
}

/// Image input from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalImageInput {
    /// Path to the image
    pub path: PathBuf,
}
