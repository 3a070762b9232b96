//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

/// Chat/streaming configuration
pub mod chat {
    /// Maximum tool result length kept on a tool call, in characters.
    /// Longer results are cut and suffixed with [`TRUNCATION_SUFFIX`].
    pub const TOOL_RESULT_MAX_CHARS: usize = 2000;

    /// Suffix appended to truncated tool results
    pub const TRUNCATION_SUFFIX: &str = "... (truncated)";
}

/// Conversation history configuration
pub mod history {
    /// Maximum number of stored conversations; the oldest entry is evicted
    /// once a save would exceed this.
    pub const MAX_CONVERSATIONS: usize = 50;

    /// Maximum title length in characters
    pub const TITLE_MAX_CHARS: usize = 50;

    /// Titles longer than [`TITLE_MAX_CHARS`] keep this many characters
    /// before the ellipsis.
    pub const TITLE_TRUNCATE_AT: usize = 47;

    /// Title used when a conversation has no user message to derive from
    pub const FALLBACK_TITLE: &str = "New conversation";

    /// Storage key the conversation collection is persisted under
    pub const STORAGE_KEY: &str = "ccui.conversations";
}

/// Storage configuration
pub mod storage {
    /// Data directory name for the file-backed store
    pub const DATA_DIR_NAME: &str = "ccui";
}
