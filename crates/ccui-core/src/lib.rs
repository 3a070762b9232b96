//! CCui Core - streaming chat event processing and conversation history
//!
//! This crate provides the transport- and UI-agnostic core of the CCui chat
//! interface:
//! - Classification of backend WebSocket events into normalized stream events
//! - A reducer folding those events into an ordered message list with
//!   attached tool-call lifecycles
//! - A bounded, persistent conversation history with title derivation and
//!   FIFO eviction
//! - Session glue: submissions, retry, slash commands, settled-state
//!   persistence

pub mod chat;
pub mod constants;
pub mod protocol;
pub mod storage;
pub mod store;

// Re-exports for convenience
pub use chat::{ChatSession, ChatSnapshot, ConnectionStatus, Message, MessageReducer, Role,
    SessionConfig, ToolCall, ToolStatus};
pub use protocol::{ClaudeCommand, EventParser, InternalEvent, PermissionMode};
pub use storage::{Conversation, ConversationStore, FileStore, KeyValueStore, MemoryStore};
pub use store::{Store, SubscriptionId};
