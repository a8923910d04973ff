//! Accounts and login.

use serde::{Deserialize, Serialize};

use crate::secret::Secret;
use crate::union::{RawVariant, tagged_union};

/// The signed-in account.
#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    /// Authenticated with an API key
    ApiKey(ApiKeyAccount),
    /// Authenticated with a ChatGPT login
    Chatgpt(ChatgptAccount),
    /// An account type this client does not know yet
    Unknown(RawVariant),
}

tagged_union!(Account, tag = "type", {
    "apiKey" => ApiKey(ApiKeyAccount),
    "chatgpt" => Chatgpt(ChatgptAccount),
});

/// API key account. The key itself is never echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyAccount {}

/// ChatGPT account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatgptAccount {
    /// Account email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Subscription plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
}

/// Params for `account/read`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountParams {
    /// Refresh tokens before answering
    #[serde(default)]
    pub refresh_token: bool,
}

/// Result of `account/read`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountResponse {
    /// The account, if signed in
    #[serde(default)]
    pub account: Option<Account>,
    /// Whether the configured provider needs OpenAI auth at all
    #[serde(default)]
    pub requires_openai_auth: bool,
}

/// Params for `account/login/start`
#[derive(Debug, Clone, PartialEq)]
pub enum LoginAccountParams {
    /// Log in with an API key
    ApiKey(ApiKeyLogin),
    /// Start a browser login
    Chatgpt(ChatgptLogin),
    /// A login type this client does not know yet
    Unknown(RawVariant),
}

tagged_union!(LoginAccountParams, tag = "type", {
    "apiKey" => ApiKey(ApiKeyLogin),
    "chatgpt" => Chatgpt(ChatgptLogin),
});

/// API key login. The key is redacted in every text rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyLogin {
    /// The key
    pub api_key: Secret,
}

/// Browser login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatgptLogin {}

/// Result of `account/login/start`
#[derive(Debug, Clone, PartialEq)]
pub enum LoginAccountResponse {
    /// The key was accepted
    ApiKey(ApiKeyAccount),
    /// A browser login is pending
    Chatgpt(ChatgptLoginStarted),
    /// A login type this client does not know yet
    Unknown(RawVariant),
}

tagged_union!(LoginAccountResponse, tag = "type", {
    "apiKey" => ApiKey(ApiKeyAccount),
    "chatgpt" => Chatgpt(ChatgptLoginStarted),
});

/// A pending browser login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatgptLoginStarted {
    /// Login attempt id
    pub login_id: String,
    /// URL to open in a browser
    pub auth_url: String,
}

/// Result of `account/logout`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutAccountResponse {}
