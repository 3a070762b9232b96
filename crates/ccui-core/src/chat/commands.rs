//! Slash command parsing
//!
//! Commands are handled entirely client-side, with no transport round-trip.

/// A recognized client-side command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    /// Empty the current message list
    Clear,
    /// Insert a system message listing available commands
    Help,
    /// Toggle the display-only density flag
    Compact,
}

/// Text of the `/help` notice
pub const HELP_TEXT: &str = "Available commands:\n\
    /clear - clear the current chat\n\
    /help - show this message\n\
    /compact - toggle compact display mode";

impl SlashCommand {
    /// Parse a submission into a command
    ///
    /// Returns `Err` with the typed command word when the input is
    /// slash-prefixed but unrecognized, `Ok(None)` when it is not a command
    /// at all.
    pub fn parse(input: &str) -> Result<Option<SlashCommand>, String> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Ok(None);
        }

        let command = trimmed
            .split_whitespace()
            .next()
            .unwrap_or(trimmed)
            .to_lowercase();

        match command.as_str() {
            "/clear" => Ok(Some(SlashCommand::Clear)),
            "/help" => Ok(Some(SlashCommand::Help)),
            "/compact" => Ok(Some(SlashCommand::Compact)),
            _ => Err(command),
        }
    }
}
