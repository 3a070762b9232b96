//! Persistence layer
//!
//! Keyed string storage backends plus the bounded conversation history
//! collection built on top of them.

mod conversations;
mod kv;

pub use conversations::{Conversation, ConversationStore};
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
