//! # JSON-RPC 2.0 message model
//!
//! Requests, responses, notifications and errors as they travel over the
//! app-server byte stream, plus [`JsonRpcMessage::classify`] which decides
//! what an inbound document is from the members it carries.
//!
//! The app-server is lenient about the `"jsonrpc"` member: it is accepted when
//! absent and always written on output.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// Request identifier: a string, a number or `null`.
///
/// Equality and hashing are representation independent for numbers, so `42`
/// and `42.0` name the same request. A string never equals a number, even
/// when the text matches, and `null` only equals `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier
    String(String),
    /// Numeric identifier, integer or floating point
    Number(Number),
    /// Null identifier (only legal on error responses to unparseable requests)
    #[default]
    Null,
}

#[derive(PartialEq, Eq, Hash)]
enum NumericKey {
    Integer(i128),
    Float(u64),
}

// Largest magnitude that still converts to i128 without saturating.
const INTEGRAL_FLOAT_LIMIT: f64 = 1.0e38;

fn numeric_key(number: &Number) -> NumericKey {
    if let Some(value) = number.as_i64() {
        return NumericKey::Integer(i128::from(value));
    }
    if let Some(value) = number.as_u64() {
        return NumericKey::Integer(i128::from(value));
    }
    let value = number.as_f64().unwrap_or(f64::NAN);
    if value.fract() == 0.0 && value.abs() < INTEGRAL_FLOAT_LIMIT {
        NumericKey::Integer(value as i128)
    } else {
        NumericKey::Float(value.to_bits())
    }
}

impl RequestId {
    /// Build a numeric identifier from a float. Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// The identifier as an integer, if it denotes one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) => match numeric_key(number) {
                NumericKey::Integer(value) => i64::try_from(value).ok(),
                NumericKey::Float(_) => None,
            },
            _ => None,
        }
    }

    /// The identifier as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this is the `null` identifier.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for RequestId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => numeric_key(a) == numeric_key(b),
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl Eq for RequestId {}

impl Hash for RequestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::String(value) => {
                0u8.hash(state);
                value.hash(state);
            }
            Self::Number(value) => {
                1u8.hash(state);
                numeric_key(value).hash(state);
            }
            Self::Null => 2u8.hash(state),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i32> for RequestId {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// JSON-RPC request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    #[serde(default)]
    pub jsonrpc: JsonRpcVersion,
    /// Request identifier
    pub id: RequestId,
    /// Request method name
    pub method: String,
    /// Request parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new request
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a request with serialized parameters
    pub fn with_params<P: Serialize>(
        id: RequestId,
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_value(params)?;
        Ok(Self::new(id, method, Some(params)))
    }
}

/// JSON-RPC response payload - ensures mutual exclusion of result and error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponsePayload {
    /// Successful response with result
    Success {
        /// Response result
        result: Value,
    },
    /// Error response
    Error {
        /// Response error
        error: JsonRpcError,
    },
}

/// JSON-RPC response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    #[serde(default)]
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request being answered, `null` for parse errors
    #[serde(default)]
    pub id: RequestId,
    /// Response payload (either result or error, never both)
    #[serde(flatten)]
    pub payload: JsonRpcResponsePayload,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            payload: JsonRpcResponsePayload::Success { result },
        }
    }

    /// Create an error response
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            payload: JsonRpcResponsePayload::Error { error },
        }
    }

    /// Check if this is a successful response
    pub fn is_success(&self) -> bool {
        matches!(self.payload, JsonRpcResponsePayload::Success { .. })
    }

    /// Get the result if this is a success response
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            JsonRpcResponsePayload::Success { result } => Some(result),
            JsonRpcResponsePayload::Error { .. } => None,
        }
    }

    /// Get the error if this is an error response
    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            JsonRpcResponsePayload::Error { error } => Some(error),
            JsonRpcResponsePayload::Success { .. } => None,
        }
    }

    /// Split the response into its result or error
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.payload {
            JsonRpcResponsePayload::Success { result } => Ok(result),
            JsonRpcResponsePayload::Error { error } => Err(error),
        }
    }
}

/// JSON-RPC notification message (no response expected)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version
    #[serde(default)]
    pub jsonrpc: JsonRpcVersion,
    /// Notification method name
    pub method: String,
    /// Notification parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }

    /// Create a notification with serialized parameters
    pub fn with_params<P: Serialize>(
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_value(params)?;
        Ok(Self::new(method, Some(params)))
    }

    /// Best-effort lookup of a string member of the params object.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a JSON-RPC error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError.code(), details)
    }

    /// Invalid request (-32600)
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest.code(), reason)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound.code(),
            format!("Method not found: {method}"),
        )
    }

    /// Invalid params (-32602)
    pub fn invalid_params(details: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidParams.code(),
            format!("Invalid params: {details}"),
        )
    }

    /// Internal error (-32603)
    pub fn internal_error(details: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::InternalError.code(),
            format!("Internal error: {details}"),
        )
    }

    /// The error code
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The additional error data, if any
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The code as a [`JsonRpcErrorCode`]
    pub fn kind(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from(self.code)
    }
}

/// Reserved JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    /// Parse error (-32700)
    ParseError,
    /// Invalid request (-32600)
    InvalidRequest,
    /// Method not found (-32601)
    MethodNotFound,
    /// Invalid params (-32602)
    InvalidParams,
    /// Internal error (-32603)
    InternalError,
    /// Any other, application-defined code
    ApplicationError(i32),
}

impl JsonRpcErrorCode {
    /// Get the numeric error code
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ApplicationError(code) => *code,
        }
    }

    /// Get the standard error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ApplicationError(_) => "Application error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl From<i32> for JsonRpcErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            other => Self::ApplicationError(other),
        }
    }
}

/// Why an inbound document could not be turned into a [`JsonRpcMessage`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MessageError {
    /// The text was not JSON, or a member had the wrong shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document was JSON but not a JSON-RPC message
    #[error("Invalid message: {0}")]
    Invalid(String),
}

impl MessageError {
    /// The JSON-RPC error a peer would report for this failure
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::Parse(err) => JsonRpcError::parse_error(err.to_string()),
            Self::Invalid(reason) => JsonRpcError::invalid_request(reason.clone()),
        }
    }
}

/// Any single JSON-RPC message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request, from either peer
    Request(JsonRpcRequest),
    /// A response to an earlier request
    Response(JsonRpcResponse),
    /// A notification
    Notification(JsonRpcNotification),
}

/// Which kind of message a document is, decided from its members alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `method` and a non-null `id`
    Request,
    /// `result` or `error`, no `method`
    Response,
    /// `method` with no `id`, or a `null` one
    Notification,
}

impl JsonRpcMessage {
    /// Decide the kind of an object without decoding it.
    pub fn classify(object: &Map<String, Value>) -> Result<MessageKind, MessageError> {
        let has_id = object.get("id").is_some_and(|id| !id.is_null());
        if object.contains_key("method") {
            return Ok(if has_id {
                MessageKind::Request
            } else {
                MessageKind::Notification
            });
        }
        match (object.contains_key("result"), object.contains_key("error")) {
            (true, true) => Err(MessageError::Invalid(
                "response carries both result and error".to_string(),
            )),
            (true, false) | (false, true) => Ok(MessageKind::Response),
            (false, false) => Err(MessageError::Invalid(
                "message has neither method, result nor error".to_string(),
            )),
        }
    }

    /// Decode a parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let kind = match &value {
            Value::Object(object) => Self::classify(object)?,
            Value::Array(_) => {
                return Err(MessageError::Invalid(
                    "batch messages are not supported".to_string(),
                ));
            }
            _ => {
                return Err(MessageError::Invalid(
                    "message is not a JSON object".to_string(),
                ));
            }
        };
        Ok(match kind {
            MessageKind::Request => Self::Request(serde_json::from_value(value)?),
            MessageKind::Response => Self::Response(serde_json::from_value(value)?),
            MessageKind::Notification => Self::Notification(serde_json::from_value(value)?),
        })
    }

    /// Serialize as a single line of JSON.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(request) => Some(&request.method),
            Self::Notification(notification) => Some(&notification.method),
            Self::Response(_) => None,
        }
    }
}

impl FromStr for JsonRpcMessage {
    type Err = MessageError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(request: JsonRpcRequest) -> Self {
        Self::Request(request)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notification: JsonRpcNotification) -> Self {
        Self::Notification(notification)
    }
}
