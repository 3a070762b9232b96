//! Wire protocol layer
//!
//! Inbound event classification and outbound submission envelopes. The
//! transport (connect/reconnect/backoff) lives outside this crate; this
//! layer only interprets delivered payloads.

mod events;
mod parser;

pub use events::{ClaudeCommand, CommandOptions, InternalEvent, PermissionMode};
pub use parser::EventParser;
