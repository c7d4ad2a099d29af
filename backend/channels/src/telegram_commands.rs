//! Telegram Bot Commands
//!
//! Handles `/start` and `/help`. Anything else is not a command we answer.

use voxscribe_pipeline::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
}

impl BotCommand {
    /// Parse the leading command of a message, accepting the
    /// `/cmd@botname` form used in groups and ignoring arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn reply(self) -> &'static str {
        match self {
            Self::Start => messages::WELCOME,
            Self::Help => messages::HELP,
        }
    }
}
