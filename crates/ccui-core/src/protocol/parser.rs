//! Transport event classification
//!
//! Turns one raw backend WebSocket event into a normalized [`InternalEvent`].
//! Dispatch keys on the envelope `type` and, for `claude-response`, on the
//! nested `data.type` discriminator. Anything unrecognized is dropped
//! without emitting an event.

use serde_json::Value;
use tracing::debug;

use super::events::InternalEvent;

/// Placeholder for error events that arrive without an `error` field
const UNKNOWN_ERROR: &str = "Unknown error";

/// Classifies raw transport events
///
/// Stateless; classification is a pure function of the payload.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Classify a raw JSON string
    ///
    /// A payload that fails JSON parsing is dropped silently: no event, no
    /// state change.
    pub fn classify_raw(&self, raw: &str) -> Option<InternalEvent> {
        match serde_json::from_str::<Value>(raw) {
            Ok(json) => self.classify(&json),
            Err(e) => {
                debug!("Dropping unparsable transport payload: {}", e);
                None
            }
        }
    }

    /// Classify an already-parsed transport event
    pub fn classify(&self, event: &Value) -> Option<InternalEvent> {
        match event.get("type").and_then(|t| t.as_str()) {
            Some("claude-response") => self.classify_response(event.get("data")?),
            Some("claude-complete") => Some(InternalEvent::StreamComplete),
            Some("claude-error") => {
                let message = event
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or(UNKNOWN_ERROR)
                    .to_string();
                Some(InternalEvent::StreamError { message })
            }
            other => {
                debug!("Ignoring transport event type {:?}", other);
                None
            }
        }
    }

    /// Classify the `data` payload of a `claude-response` envelope
    fn classify_response(&self, data: &Value) -> Option<InternalEvent> {
        match data.get("type").and_then(|t| t.as_str())? {
            "tool_use" => {
                let id = data.get("id").and_then(|v| v.as_str())?.to_string();
                let name = data.get("name").and_then(|v| v.as_str())?.to_string();
                let input = data
                    .get("input")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({}));
                Some(InternalEvent::ToolUse { id, name, input })
            }
            "tool_result" => {
                let tool_id = data
                    .get("tool_use_id")
                    .and_then(|v| v.as_str())?
                    .to_string();
                let content = data
                    .get("content")
                    .map(extract_result_text)
                    .unwrap_or_default();
                let is_error = data
                    .get("is_error")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Some(InternalEvent::ToolResult {
                    tool_id,
                    content,
                    is_error,
                })
            }
            "content_block_delta" => {
                let text = data
                    .get("delta")
                    .and_then(|d| d.get("text"))
                    .and_then(|t| t.as_str())?;
                Some(InternalEvent::TextDelta {
                    text: text.to_string(),
                })
            }
            "content_block_stop" => Some(InternalEvent::BlockStop),
            "assistant" => {
                let content = data
                    .get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(|c| c.as_array())?;
                let text = concat_text_fragments(content);
                Some(InternalEvent::AssistantText { text })
            }
            other => {
                debug!("Ignoring claude-response data type {:?}", other);
                None
            }
        }
    }
}

/// Extract result text from a `tool_result` content field
///
/// The backend sends either a plain string or an array of typed fragments;
/// text fragments are concatenated in order, everything else is skipped.
fn extract_result_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(fragments) => concat_text_fragments(fragments),
        _ => String::new(),
    }
}

/// Concatenate the `text` of fragments with `type == "text"`, in order
fn concat_text_fragments(fragments: &[Value]) -> String {
    fragments
        .iter()
        .filter(|f| f.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|f| f.get("text").and_then(|t| t.as_str()))
        .collect()
}
