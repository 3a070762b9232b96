//! Chat session controller
//!
//! Owns the live message list and wires the pieces together: submissions go
//! out as command envelopes, inbound events run through the reducer, and
//! settled state is persisted to the conversation history. The session also
//! owns the "current conversation" pointer and a read-only mirror of the
//! transport's connection state.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::commands::{SlashCommand, HELP_TEXT};
use super::message::Message;
use super::reducer::MessageReducer;
use super::retry::RetryController;
use crate::protocol::{ClaudeCommand, EventParser, InternalEvent, PermissionMode};
use crate::storage::ConversationStore;
use crate::store::Store;

/// Transport connection state, owned by the transport and mirrored here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
}

/// Read-only view of the transport's state
#[derive(Debug, Clone, Copy)]
pub struct TransportStatus {
    pub status: ConnectionStatus,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl Default for TransportStatus {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            retry_count: 0,
            max_retries: 0,
        }
    }
}

/// Per-session submission settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Working directory forwarded with every command
    pub cwd: String,
    pub permission_mode: PermissionMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cwd: ".".to_string(),
            permission_mode: PermissionMode::Default,
        }
    }
}

/// Immutable view published to subscribers after every state change
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub is_streaming: bool,
    /// Display-only density flag toggled by `/compact`
    pub compact_mode: bool,
}

/// The session controller
pub struct ChatSession {
    parser: EventParser,
    reducer: MessageReducer,
    retry: RetryController,
    history: ConversationStore,
    current_conversation_id: Option<String>,
    transport: TransportStatus,
    compact_mode: bool,
    config: SessionConfig,
    outbound: mpsc::UnboundedSender<ClaudeCommand>,
    snapshots: Arc<Store<ChatSnapshot>>,
}

impl ChatSession {
    pub fn new(
        history: ConversationStore,
        outbound: mpsc::UnboundedSender<ClaudeCommand>,
        config: SessionConfig,
    ) -> Self {
        let snapshots = Arc::new(Store::new(ChatSnapshot {
            messages: Vec::new(),
            is_streaming: false,
            compact_mode: false,
        }));

        Self {
            parser: EventParser::new(),
            reducer: MessageReducer::new(),
            retry: RetryController::new(),
            history,
            current_conversation_id: None,
            transport: TransportStatus::default(),
            compact_mode: false,
            config,
            outbound,
            snapshots,
        }
    }

    /// Store publishing a [`ChatSnapshot`] after every state change
    pub fn snapshots(&self) -> Arc<Store<ChatSnapshot>> {
        self.snapshots.clone()
    }

    pub fn messages(&self) -> &[Message] {
        self.reducer.messages()
    }

    pub fn is_streaming(&self) -> bool {
        self.reducer.is_streaming()
    }

    pub fn compact_mode(&self) -> bool {
        self.compact_mode
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.current_conversation_id.as_deref()
    }

    pub fn history(&self) -> &ConversationStore {
        &self.history
    }

    pub fn transport(&self) -> TransportStatus {
        self.transport
    }

    /// Mirror the transport's state; consumed read-only here
    pub fn set_transport_status(
        &mut self,
        status: ConnectionStatus,
        retry_count: u32,
        max_retries: u32,
    ) {
        self.transport = TransportStatus {
            status,
            retry_count,
            max_retries,
        };
    }

    /// Handle a user submission
    ///
    /// Slash commands are intercepted client-side; anything else becomes a
    /// user message and an outbound command envelope.
    pub fn submit(&mut self, input: &str) -> Result<()> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        match SlashCommand::parse(trimmed) {
            Ok(Some(command)) => {
                self.apply_command(command);
                self.after_change()
            }
            Err(unknown) => {
                self.reducer
                    .push(Message::system(format!("Unknown command: {}", unknown)));
                self.after_change()
            }
            Ok(None) => self.submit_input(trimmed, true),
        }
    }

    /// Resubmit the last user input after a failure
    ///
    /// No-op unless the transport is connected and nothing is streaming.
    /// Returns whether a resubmission happened.
    pub fn retry(&mut self) -> Result<bool> {
        if self.transport.status != ConnectionStatus::Connected || self.reducer.is_streaming() {
            debug!("Retry skipped: transport busy or not connected");
            return Ok(false);
        }
        let Some(input) = self.retry.last_input().map(str::to_string) else {
            return Ok(false);
        };
        self.submit_input(&input, false)?;
        Ok(true)
    }

    /// Feed one raw transport payload through parse + reduce
    pub fn handle_raw(&mut self, raw: &str) -> Result<()> {
        match self.parser.classify_raw(raw) {
            Some(event) => self.handle_event(event),
            None => Ok(()),
        }
    }

    /// Apply one normalized event
    pub fn handle_event(&mut self, event: InternalEvent) -> Result<()> {
        self.reducer.apply(event);
        self.after_change()
    }

    /// Clear the current-conversation pointer so the next settled save
    /// starts a fresh history entry; stored conversations are untouched
    pub fn start_new_conversation(&mut self) {
        self.current_conversation_id = None;
        self.reducer.clear();
        self.retry.reset();
        self.notify();
    }

    /// Load a stored conversation into the live message list
    pub fn open_conversation(&mut self, id: &str) -> bool {
        let Some(conversation) = self.history.load_conversation(id) else {
            return false;
        };
        let messages = conversation.messages.clone();
        self.reducer.replace(messages);
        self.current_conversation_id = Some(id.to_string());
        self.notify();
        true
    }

    /// Delete a stored conversation, clearing the current pointer when it
    /// names the conversation being deleted
    pub fn delete_conversation(&mut self, id: &str) -> Result<()> {
        self.history.delete_conversation(id)?;
        if self.current_conversation_id.as_deref() == Some(id) {
            self.current_conversation_id = None;
        }
        Ok(())
    }

    fn apply_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Clear => {
                self.reducer.clear();
            }
            SlashCommand::Help => {
                self.reducer.push(Message::system(HELP_TEXT));
            }
            SlashCommand::Compact => {
                self.compact_mode = !self.compact_mode;
            }
        }
    }

    fn submit_input(&mut self, input: &str, remember: bool) -> Result<()> {
        self.reducer.push(Message::user(input));
        if remember {
            self.retry.remember(input);
        }

        let command = ClaudeCommand::new(input, &*self.config.cwd, self.config.permission_mode);
        if self.outbound.send(command).is_err() {
            warn!("Transport channel closed, dropping outbound command");
        }

        self.after_change()
    }

    /// Persist-when-settled effect plus subscriber notification
    ///
    /// Intermediate streaming states are never persisted; only a settled
    /// message list reaches the history store. The id returned by the save
    /// becomes the current pointer, so subsequent settled saves update the
    /// same entry in place.
    fn after_change(&mut self) -> Result<()> {
        if !self.reducer.is_streaming() && !self.reducer.messages().is_empty() {
            let saved = self.history.save_conversation(
                self.reducer.messages(),
                self.current_conversation_id.as_deref(),
            )?;
            if let Some(id) = saved {
                self.current_conversation_id = Some(id);
            }
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        let snapshot = ChatSnapshot {
            messages: self.reducer.messages().to_vec(),
            is_streaming: self.reducer.is_streaming(),
            compact_mode: self.compact_mode,
        };
        self.snapshots.set(snapshot);
    }
}
