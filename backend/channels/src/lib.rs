//! Chat transports. Telegram is the only one: it turns updates into
//! [`voxscribe_core::InboundEvent`]s and carries replies back.

use std::sync::Arc;

use async_trait::async_trait;
use voxscribe_pipeline::EventDispatcher;

pub mod telegram;
pub mod telegram_commands;
pub mod telegram_media;

#[cfg(test)]
mod fixtures;

pub use telegram::{Route, TelegramAdapter, route, text_reply};
pub use telegram_commands::BotCommand;
pub use telegram_media::{TelegramTransport, classify, media_event};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Receive updates and hand media events to `dispatcher` until the
    /// transport stops (Ctrl-C or a fatal error).
    async fn start(&self, dispatcher: Arc<EventDispatcher>) -> anyhow::Result<()>;
}
