//! Chat state layer
//!
//! The ordered message list, the reducer that folds protocol events into
//! it, tool-call lifecycle tracking, retry bookkeeping, slash commands, and
//! the session controller gluing it all to persistence and the transport.

mod commands;
mod message;
mod reducer;
mod retry;
mod session;
mod tool_tracker;

pub use commands::{SlashCommand, HELP_TEXT};
pub use message::{truncate_tool_result, Message, Role, ToolCall, ToolStatus};
pub use reducer::MessageReducer;
pub use retry::RetryController;
pub use session::{
    ChatSession, ChatSnapshot, ConnectionStatus, SessionConfig, TransportStatus,
};
pub use tool_tracker::ToolCallTracker;
