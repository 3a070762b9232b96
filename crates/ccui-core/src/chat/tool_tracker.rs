//! Tool-call lifecycle tracking
//!
//! Owns the `pending -> running -> {completed | failed}` state machine for
//! tool invocations attached to the in-flight assistant message. Calls are
//! created already `Running` by the observed protocol; terminal states are
//! never left.

use serde_json::Value;
use tracing::{debug, warn};

use super::message::{truncate_tool_result, Message, ToolCall, ToolStatus};

/// Whether a status transition is allowed
fn can_transition(from: ToolStatus, to: ToolStatus) -> bool {
    match from {
        ToolStatus::Pending => matches!(
            to,
            ToolStatus::Running | ToolStatus::Completed | ToolStatus::Failed
        ),
        ToolStatus::Running => matches!(to, ToolStatus::Completed | ToolStatus::Failed),
        ToolStatus::Completed | ToolStatus::Failed => false,
    }
}

/// Tracks tool invocations across a message list
#[derive(Debug, Default)]
pub struct ToolCallTracker;

impl ToolCallTracker {
    pub fn new() -> Self {
        Self
    }

    /// Attach a freshly invoked tool call to a message
    pub fn attach(&self, message: &mut Message, id: String, name: String, input: Value) {
        debug!("Tool call started: {} ({})", name, id);
        message.tool_calls.push(ToolCall::running(id, name, input));
    }

    /// Resolve a tool call by id with its result
    ///
    /// Scans every message's calls; the correlating `tool_use` may belong to
    /// an earlier assistant message than the current one. Returns false when
    /// no call matches (the result is dropped).
    pub fn resolve(
        &self,
        messages: &mut [Message],
        tool_id: &str,
        content: &str,
        is_error: bool,
    ) -> bool {
        let target = if is_error {
            ToolStatus::Failed
        } else {
            ToolStatus::Completed
        };

        for message in messages.iter_mut() {
            if let Some(call) = message.tool_calls.iter_mut().find(|c| c.id == tool_id) {
                if !can_transition(call.status, target) {
                    warn!(
                        "Ignoring result for tool call {} in state {:?}",
                        tool_id, call.status
                    );
                    return false;
                }
                call.status = target;
                call.is_error = is_error;
                call.result = Some(truncate_tool_result(content));
                debug!("Tool call {} -> {:?}", tool_id, target);
                return true;
            }
        }

        warn!("Tool result for unknown call {} dropped", tool_id);
        false
    }

    /// Force every still-running call on a message into a terminal state
    ///
    /// Used when the stream ends without explicit results: `Completed` on a
    /// clean completion (the backend's silence is not treated as failure),
    /// `Failed` on a stream error.
    pub fn finalize_running(&self, message: &mut Message, target: ToolStatus) {
        debug_assert!(target.is_terminal());
        for call in &mut message.tool_calls {
            if call.status == ToolStatus::Running {
                call.status = target;
                if target == ToolStatus::Failed {
                    call.is_error = true;
                }
                debug!("Tool call {} finalized as {:?}", call.id, target);
            }
        }
    }
}
