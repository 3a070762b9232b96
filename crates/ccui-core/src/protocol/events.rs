//! Normalized protocol events
//!
//! Inbound transport payloads are classified into [`InternalEvent`]s by the
//! parser; outbound submissions are wrapped in [`ClaudeCommand`] envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized inbound event, one variant per stream happening
#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    /// The assistant invoked a tool
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// A tool finished; correlates by `tool_id`
    ToolResult {
        tool_id: String,
        content: String,
        is_error: bool,
    },
    /// Incremental assistant text
    TextDelta { text: String },
    /// The current content block finished
    BlockStop,
    /// A complete assistant text payload (non-incremental form)
    AssistantText { text: String },
    /// The stream finished cleanly
    StreamComplete,
    /// The stream failed
    StreamError { message: String },
}

/// How tool permission prompts are handled for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl Default for PermissionMode {
    fn default() -> Self {
        PermissionMode::Default
    }
}

/// Per-submission options forwarded to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOptions {
    /// Working directory the command runs in
    pub cwd: String,
    pub permission_mode: PermissionMode,
}

/// Outbound submission envelope
///
/// Serializes to `{"type": "claude-command", "command": ..., "options": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    pub options: CommandOptions,
}

impl ClaudeCommand {
    pub fn new(command: impl Into<String>, cwd: impl Into<String>, mode: PermissionMode) -> Self {
        Self {
            kind: "claude-command".to_string(),
            command: command.into(),
            options: CommandOptions {
                cwd: cwd.into(),
                permission_mode: mode,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_envelope_shape() {
        let cmd = ClaudeCommand::new("list files", "/work", PermissionMode::Default);
        let json = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(json["type"], "claude-command");
        assert_eq!(json["command"], "list files");
        assert_eq!(json["options"]["cwd"], "/work");
        assert_eq!(json["options"]["permissionMode"], "default");
    }

    #[test]
    fn test_permission_mode_wire_names() {
        let json = serde_json::to_value(PermissionMode::AcceptEdits).expect("serialize");
        assert_eq!(json, "acceptEdits");
        let json = serde_json::to_value(PermissionMode::BypassPermissions).expect("serialize");
        assert_eq!(json, "bypassPermissions");
    }
}
