//! Chat message domain types
//!
//! A rendered conversation is an ordered `Vec<Message>`; tool invocations
//! hang off the assistant message that issued them. Serialized field names
//! stay camelCase for compatibility with previously persisted history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::chat::{TOOL_RESULT_MAX_CHARS, TRUNCATION_SUFFIX};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Lifecycle of a single tool invocation
///
/// `Pending` is never produced by the observed protocol (calls are created
/// already `Running`); it exists as a target state for protocols that
/// announce intent before invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ToolStatus {
    /// Whether this status is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Failed)
    }
}

/// A single tool invocation attached to an assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Correlates the `tool_use` event with its later `tool_result`
    pub id: String,
    /// Tool identifier, free-form
    pub name: String,
    /// Arguments as received from the backend
    pub input: Value,
    pub status: ToolStatus,
    /// Result text, truncated to [`TOOL_RESULT_MAX_CHARS`] characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCall {
    /// Create a call in the `Running` state, as the wire protocol delivers it
    pub fn running(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            status: ToolStatus::Running,
            result: None,
            is_error: false,
        }
    }
}

/// One rendered chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque unique id
    pub id: String,
    pub role: Role,
    /// Accumulated text; may be empty while only tool calls are present
    pub content: String,
    /// True while more deltas for this message are expected
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub is_system: bool,
    /// Insertion order = invocation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            is_streaming: false,
            is_error: false,
            is_system: role == Role::System,
            tool_calls: Vec::new(),
        }
    }

    /// New user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// New assistant message that is still accumulating updates
    pub fn streaming_assistant(content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.is_streaming = true;
        msg
    }

    /// New system message (client-side notices, never persisted)
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// New error-flagged assistant message
    pub fn error(content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.is_error = true;
        msg
    }
}

/// Cap a tool result for display and persistence
///
/// Counts chars (not bytes) so multi-byte UTF-8 never splits.
pub fn truncate_tool_result(result: &str) -> String {
    if result.chars().count() <= TOOL_RESULT_MAX_CHARS {
        return result.to_string();
    }
    let mut truncated: String = result.chars().take(TOOL_RESULT_MAX_CHARS).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}
