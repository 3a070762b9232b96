//! Message reducer
//!
//! Folds the normalized event stream into the ordered message list. Applied
//! synchronously once per inbound transport event, in arrival order.
//!
//! Streaming text and tool calls merge into the last message when that
//! message is an assistant message still marked streaming. The correlation
//! is positional, not keyed by a stream id: the protocol carries none, so a
//! single active stream is an assumed invariant here. If the transport ever
//! interleaved two concurrent assistant turns, their deltas would merge
//! into one bubble.

use serde_json::Value;
use tracing::debug;

use super::message::{Message, Role, ToolStatus};
use super::tool_tracker::ToolCallTracker;
use crate::protocol::InternalEvent;

/// Folds [`InternalEvent`]s into an ordered `Vec<Message>`
#[derive(Debug, Default)]
pub struct MessageReducer {
    messages: Vec<Message>,
    tracker: ToolCallTracker,
}

impl MessageReducer {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            tracker: ToolCallTracker::new(),
        }
    }

    /// The current ordered message list
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether any message is still accumulating updates
    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.is_streaming)
    }

    /// Drop all messages (used by `/clear` and new-conversation flows)
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replace the message list wholesale (used when opening a stored
    /// conversation)
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Append a message directly (user submissions, client-side notices)
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Apply one event to the message list
    pub fn apply(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::ToolUse { id, name, input } => self.handle_tool_use(id, name, input),
            InternalEvent::ToolResult {
                tool_id,
                content,
                is_error,
            } => self.handle_tool_result(&tool_id, &content, is_error),
            InternalEvent::TextDelta { text } => self.handle_text(&text),
            InternalEvent::AssistantText { text } => self.handle_text(&text),
            InternalEvent::BlockStop => self.handle_block_stop(),
            InternalEvent::StreamComplete => self.handle_stream_complete(),
            InternalEvent::StreamError { message } => self.handle_stream_error(&message),
        }
    }

    /// Whether the last message is an assistant message still streaming
    fn last_is_streaming_assistant(&self) -> bool {
        self.messages
            .last()
            .map(|m| m.role == Role::Assistant && m.is_streaming)
            .unwrap_or(false)
    }

    /// Attach a tool call to the in-flight assistant message, or open a new
    /// one to host it
    ///
    /// A `tool_use` arriving after a finished assistant message starts a new
    /// message rather than reopening the old bubble.
    fn handle_tool_use(&mut self, id: String, name: String, input: Value) {
        if !self.last_is_streaming_assistant() {
            self.messages.push(Message::streaming_assistant(""));
        }
        if let Some(message) = self.messages.last_mut() {
            self.tracker.attach(message, id, name, input);
        }
    }

    fn handle_tool_result(&mut self, tool_id: &str, content: &str, is_error: bool) {
        self.tracker
            .resolve(&mut self.messages, tool_id, content, is_error);
    }

    /// Merge streaming text into the last assistant bubble, or open a new one
    fn handle_text(&mut self, text: &str) {
        if self.last_is_streaming_assistant() {
            if let Some(message) = self.messages.last_mut() {
                message.content.push_str(text);
            }
        } else {
            self.messages.push(Message::streaming_assistant(text));
        }
    }

    /// A content block finished; the message may still receive more blocks,
    /// so tool calls are not finalized here
    fn handle_block_stop(&mut self) {
        if self.last_is_streaming_assistant() {
            if let Some(message) = self.messages.last_mut() {
                message.is_streaming = false;
            }
        }
    }

    /// Stream finished cleanly
    ///
    /// Any call still running on the last assistant message is promoted to
    /// `Completed`: the backend sent no explicit result, and absence of a
    /// result on a clean completion is not itself an error.
    fn handle_stream_complete(&mut self) {
        if let Some(idx) = self.last_assistant_idx() {
            let message = &mut self.messages[idx];
            message.is_streaming = false;
            self.tracker
                .finalize_running(message, ToolStatus::Completed);
            debug!("Stream complete, finalized message {}", message.id);
        }
    }

    /// Stream failed: fail in-flight calls, stop streaming, surface the error
    fn handle_stream_error(&mut self, error: &str) {
        if let Some(idx) = self.last_assistant_idx() {
            let message = &mut self.messages[idx];
            message.is_streaming = false;
            self.tracker.finalize_running(message, ToolStatus::Failed);
        }
        self.messages
            .push(Message::error(format!("Error: {}", error)));
    }

    fn last_assistant_idx(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_use(id: &str, name: &str) -> InternalEvent {
        InternalEvent::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: json!({}),
        }
    }

    fn delta(text: &str) -> InternalEvent {
        InternalEvent::TextDelta {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_deltas_merge_into_one_message() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("Hel"));
        reducer.apply(delta("lo"));

        assert_eq!(reducer.messages().len(), 1);
        let msg = &reducer.messages()[0];
        assert_eq!(msg.content, "Hello");
        assert!(msg.is_streaming);
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_delta_after_user_message_starts_assistant() {
        let mut reducer = MessageReducer::new();
        reducer.push(Message::user("question"));
        reducer.apply(delta("answer"));

        assert_eq!(reducer.messages().len(), 2);
        assert_eq!(reducer.messages()[1].role, Role::Assistant);
        assert_eq!(reducer.messages()[1].content, "answer");
    }

    #[test]
    fn test_tool_use_attaches_to_streaming_message() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("Let me check."));
        reducer.apply(tool_use("t1", "bash"));

        assert_eq!(reducer.messages().len(), 1);
        let msg = &reducer.messages()[0];
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].status, ToolStatus::Running);
        assert!(msg.is_streaming);
    }

    #[test]
    fn test_tool_use_after_finished_message_starts_new_one() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("First answer."));
        reducer.apply(InternalEvent::StreamComplete);
        reducer.apply(tool_use("t1", "bash"));

        assert_eq!(reducer.messages().len(), 2);
        assert!(reducer.messages()[1].is_streaming);
        assert_eq!(reducer.messages()[1].tool_calls.len(), 1);
        assert!(reducer.messages()[0].tool_calls.is_empty());
    }

    #[test]
    fn test_tool_use_on_empty_list_creates_host_message() {
        let mut reducer = MessageReducer::new();
        reducer.apply(tool_use("t1", "read"));

        assert_eq!(reducer.messages().len(), 1);
        let msg = &reducer.messages()[0];
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "");
        assert!(msg.is_streaming);
    }

    #[test]
    fn test_tool_result_resolves_by_id() {
        let mut reducer = MessageReducer::new();
        reducer.apply(tool_use("t1", "bash"));
        reducer.apply(tool_use("t2", "read"));
        reducer.apply(InternalEvent::ToolResult {
            tool_id: "t1".to_string(),
            content: "done".to_string(),
            is_error: false,
        });

        let calls = &reducer.messages()[0].tool_calls;
        assert_eq!(calls[0].status, ToolStatus::Completed);
        assert_eq!(calls[0].result.as_deref(), Some("done"));
        assert_eq!(calls[1].status, ToolStatus::Running);
    }

    #[test]
    fn test_tool_result_failure() {
        let mut reducer = MessageReducer::new();
        reducer.apply(tool_use("t1", "bash"));
        reducer.apply(InternalEvent::ToolResult {
            tool_id: "t1".to_string(),
            content: "command not found".to_string(),
            is_error: true,
        });

        let call = &reducer.messages()[0].tool_calls[0];
        assert_eq!(call.status, ToolStatus::Failed);
        assert!(call.is_error);
        assert_eq!(call.result.as_deref(), Some("command not found"));
    }

    #[test]
    fn test_block_stop_ends_streaming_only() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("text"));
        reducer.apply(tool_use("t1", "bash"));
        reducer.apply(InternalEvent::BlockStop);

        let msg = &reducer.messages()[0];
        assert!(!msg.is_streaming);
        // Tool calls are not finalized by a block stop
        assert_eq!(msg.tool_calls[0].status, ToolStatus::Running);
    }

    #[test]
    fn test_stream_complete_promotes_running_calls() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("working"));
        reducer.apply(tool_use("t1", "bash"));
        reducer.apply(InternalEvent::StreamComplete);

        let msg = &reducer.messages()[0];
        assert!(!msg.is_streaming);
        assert_eq!(msg.tool_calls[0].status, ToolStatus::Completed);
        assert!(!reducer.is_streaming());
    }

    #[test]
    fn test_stream_complete_with_no_messages_is_noop() {
        let mut reducer = MessageReducer::new();
        reducer.apply(InternalEvent::StreamComplete);
        assert!(reducer.messages().is_empty());
    }

    #[test]
    fn test_stream_error_fails_calls_and_appends_error_message() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("working"));
        reducer.apply(tool_use("t1", "bash"));
        reducer.apply(InternalEvent::StreamError {
            message: "connection lost".to_string(),
        });

        assert_eq!(reducer.messages().len(), 2);
        let first = &reducer.messages()[0];
        assert!(!first.is_streaming);
        assert_eq!(first.tool_calls[0].status, ToolStatus::Failed);
        assert!(first.tool_calls[0].is_error);

        let error_msg = &reducer.messages()[1];
        assert_eq!(error_msg.role, Role::Assistant);
        assert!(error_msg.is_error);
        assert_eq!(error_msg.content, "Error: connection lost");
        assert!(!reducer.is_streaming());
    }

    #[test]
    fn test_at_most_one_streaming_message() {
        let mut reducer = MessageReducer::new();
        reducer.push(Message::user("q1"));
        reducer.apply(delta("a1"));
        reducer.apply(InternalEvent::StreamComplete);
        reducer.push(Message::user("q2"));
        reducer.apply(delta("a2"));

        let streaming = reducer
            .messages()
            .iter()
            .filter(|m| m.is_streaming)
            .count();
        assert_eq!(streaming, 1);
    }

    #[test]
    fn test_assistant_text_merges_like_delta() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("Hello"));
        reducer.apply(InternalEvent::AssistantText {
            text: " world".to_string(),
        });

        assert_eq!(reducer.messages().len(), 1);
        assert_eq!(reducer.messages()[0].content, "Hello world");
    }

    #[test]
    fn test_clear_empties_list() {
        let mut reducer = MessageReducer::new();
        reducer.apply(delta("text"));
        reducer.clear();
        assert!(reducer.messages().is_empty());
    }
}
