//! Conversation history storage
//!
//! A bounded, newest-first collection of finished conversations persisted
//! as one JSON array behind a fixed storage key. Saves sanitize the message
//! list (no system entries, no streaming flags), derive a title from the
//! first user message, and evict the oldest entry once the bound is hit.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::kv::KeyValueStore;
use crate::chat::{Message, Role};
use crate::constants::history::{
    FALLBACK_TITLE, MAX_CONVERSATIONS, STORAGE_KEY, TITLE_MAX_CHARS, TITLE_TRUNCATE_AT,
};

/// One stored conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Sanitized: never contains streaming or system-role entries
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bounded conversation collection over a [`KeyValueStore`] backend
pub struct ConversationStore {
    backend: Arc<dyn KeyValueStore>,
    /// Newest first, at most [`MAX_CONVERSATIONS`] entries
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    /// Open the store, loading whatever the backend holds
    ///
    /// A missing value, unparsable JSON, or a non-array all initialize an
    /// empty collection; the load path never fails.
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
        let conversations = match backend.get(STORAGE_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("Conversation history unreadable, resetting: {}", e);
                    Vec::new()
                }
            },
        };

        debug!("Loaded {} stored conversations", conversations.len());
        Self {
            backend,
            conversations,
        }
    }

    /// Persist a finished message list
    ///
    /// System messages are dropped and streaming flags cleared before
    /// anything is stored. An empty result is a defined no-op (`Ok(None)`).
    /// With a matching `existing_id` the stored entry is replaced and moved
    /// to the front; otherwise a new conversation is prepended. Returns the
    /// id of the saved conversation.
    pub fn save_conversation(
        &mut self,
        messages: &[Message],
        existing_id: Option<&str>,
    ) -> Result<Option<String>> {
        let sanitized = sanitize_messages(messages);
        if sanitized.is_empty() {
            debug!("Nothing to persist after sanitization, skipping save");
            return Ok(None);
        }

        let title = derive_title(&sanitized);
        let now = Utc::now();

        let existing = existing_id.and_then(|id| {
            self.conversations
                .iter()
                .position(|c| c.id == id)
                .map(|pos| self.conversations.remove(pos))
        });

        let conversation = match existing {
            Some(prev) => Conversation {
                id: prev.id,
                title,
                messages: sanitized,
                created_at: prev.created_at,
                updated_at: now,
            },
            None => Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                title,
                messages: sanitized,
                created_at: now,
                updated_at: now,
            },
        };

        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);

        if self.conversations.len() > MAX_CONVERSATIONS {
            let evicted = self.conversations.len() - MAX_CONVERSATIONS;
            self.conversations.truncate(MAX_CONVERSATIONS);
            debug!("Evicted {} oldest conversation(s)", evicted);
        }

        self.persist()?;
        Ok(Some(id))
    }

    /// Exact-match lookup; `None` when absent
    pub fn load_conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Remove a conversation by id
    ///
    /// Clearing a "current conversation" pointer that names this id is the
    /// session controller's responsibility, not the store's.
    pub fn delete_conversation(&mut self, id: &str) -> Result<()> {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() != before {
            self.persist()?;
        }
        Ok(())
    }

    /// The full ordered collection, newest first
    pub fn list_conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.conversations)?;
        self.backend.set(STORAGE_KEY, &json)?;
        Ok(())
    }
}

/// Drop system messages and clear streaming flags
fn sanitize_messages(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .map(|mut m| {
            m.is_streaming = false;
            m
        })
        .collect()
}

/// Title from the first user message, truncated past the length cap
fn derive_title(messages: &[Message]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.role == Role::User) else {
        return FALLBACK_TITLE.to_string();
    };

    let content = &first_user.content;
    if content.chars().count() <= TITLE_MAX_CHARS {
        return content.clone();
    }

    let mut title: String = content.chars().take(TITLE_TRUNCATE_AT).collect();
    title.push_str("...");
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    fn open_memory_store() -> (ConversationStore, Arc<MemoryStore>) {
        let backend = Arc::new(MemoryStore::new());
        let store = ConversationStore::open(backend.clone());
        (store, backend)
    }

    fn exchange(question: &str, answer: &str) -> Vec<Message> {
        vec![Message::user(question), Message::new(Role::Assistant, answer)]
    }

    #[test]
    fn test_fifo_bound_at_50() {
        let (mut store, _backend) = open_memory_store();

        for i in 0..52 {
            store
                .save_conversation(&exchange(&format!("question {}", i), "answer"), None)
                .expect("save");
        }

        let listed = store.list_conversations();
        assert_eq!(listed.len(), 50);
        assert_eq!(listed[0].title, "question 51");
        // The two oldest were evicted
        assert!(!listed.iter().any(|c| c.title == "question 0"));
        assert!(!listed.iter().any(|c| c.title == "question 1"));
    }

    #[test]
    fn test_title_from_first_user_message() {
        let (mut store, _backend) = open_memory_store();
        store
            .save_conversation(&exchange("Hello", "Hi there!"), None)
            .expect("save");

        assert_eq!(store.list_conversations()[0].title, "Hello");
    }

    #[test]
    fn test_title_truncation() {
        let (mut store, _backend) = open_memory_store();
        let long = "x".repeat(70);
        store
            .save_conversation(&exchange(&long, "ok"), None)
            .expect("save");

        let title = &store.list_conversations()[0].title;
        assert!(title.chars().count() <= 50);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 50);
    }

    #[test]
    fn test_title_fallback_without_user_message() {
        let (mut store, _backend) = open_memory_store();
        store
            .save_conversation(&[Message::new(Role::Assistant, "unprompted")], None)
            .expect("save");

        assert_eq!(store.list_conversations()[0].title, "New conversation");
    }

    #[test]
    fn test_system_messages_not_persisted() {
        let (mut store, _backend) = open_memory_store();
        let messages = vec![
            Message::system("x"),
            Message::user("a"),
            Message::new(Role::Assistant, "b"),
        ];
        store.save_conversation(&messages, None).expect("save");

        let stored = &store.list_conversations()[0];
        assert_eq!(stored.messages.len(), 2);
        assert!(stored.messages.iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn test_streaming_flags_cleared_on_save() {
        let (mut store, _backend) = open_memory_store();
        let messages = vec![Message::user("q"), Message::streaming_assistant("partial")];
        store.save_conversation(&messages, None).expect("save");

        let stored = &store.list_conversations()[0];
        assert!(stored.messages.iter().all(|m| !m.is_streaming));
    }

    #[test]
    fn test_update_in_place_with_existing_id() {
        let (mut store, _backend) = open_memory_store();
        let id = store
            .save_conversation(&exchange("first", "one"), None)
            .expect("save")
            .expect("id");
        store
            .save_conversation(&exchange("second", "two"), None)
            .expect("save");

        let updated = exchange("first", "one, revised");
        let returned = store
            .save_conversation(&updated, Some(&id))
            .expect("save")
            .expect("id");

        assert_eq!(returned, id);
        let listed = store.list_conversations();
        assert_eq!(listed.len(), 2);
        // Updated entry moved to the front as most-recently-used
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].messages[1].content, "one, revised");
    }

    #[test]
    fn test_update_preserves_created_at() {
        let (mut store, _backend) = open_memory_store();
        let id = store
            .save_conversation(&exchange("q", "a"), None)
            .expect("save")
            .expect("id");
        let created_at = store.list_conversations()[0].created_at;

        store
            .save_conversation(&exchange("q", "a2"), Some(&id))
            .expect("save");

        let stored = &store.list_conversations()[0];
        assert_eq!(stored.created_at, created_at);
        assert!(stored.updated_at >= created_at);
    }

    #[test]
    fn test_unknown_existing_id_prepends_new() {
        let (mut store, _backend) = open_memory_store();
        store
            .save_conversation(&exchange("q", "a"), Some("no-such-id"))
            .expect("save");

        assert_eq!(store.list_conversations().len(), 1);
        assert_ne!(store.list_conversations()[0].id, "no-such-id");
    }

    #[test]
    fn test_corruption_recovery() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(STORAGE_KEY, "invalid json {{{")
            .expect("seed backend");

        let store = ConversationStore::open(backend);
        assert_eq!(store.list_conversations().len(), 0);
    }

    #[test]
    fn test_non_array_json_resets() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(STORAGE_KEY, r#"{"not": "an array"}"#)
            .expect("seed backend");

        let store = ConversationStore::open(backend);
        assert_eq!(store.list_conversations().len(), 0);
    }

    #[test]
    fn test_empty_save_is_noop() {
        let (mut store, _backend) = open_memory_store();
        store
            .save_conversation(&exchange("q", "a"), None)
            .expect("save");

        let result = store.save_conversation(&[], None).expect("save");
        assert_eq!(result, None);
        assert_eq!(store.list_conversations().len(), 1);
    }

    #[test]
    fn test_all_system_save_is_noop() {
        let (mut store, _backend) = open_memory_store();
        let result = store
            .save_conversation(&[Message::system("only system")], None)
            .expect("save");

        assert_eq!(result, None);
        assert_eq!(store.list_conversations().len(), 0);
    }

    #[test]
    fn test_delete_conversation() {
        let (mut store, _backend) = open_memory_store();
        let id = store
            .save_conversation(&exchange("q", "a"), None)
            .expect("save")
            .expect("id");

        store.delete_conversation(&id).expect("delete");
        assert!(store.load_conversation(&id).is_none());
        assert_eq!(store.list_conversations().len(), 0);
    }

    #[test]
    fn test_load_absent_returns_none() {
        let (store, _backend) = open_memory_store();
        assert!(store.load_conversation("missing").is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let backend = Arc::new(MemoryStore::new());
        {
            let mut store = ConversationStore::open(backend.clone());
            store
                .save_conversation(&exchange("remember me", "ok"), None)
                .expect("save");
        }

        let reopened = ConversationStore::open(backend);
        assert_eq!(reopened.list_conversations().len(), 1);
        assert_eq!(reopened.list_conversations()[0].title, "remember me");
    }
}
