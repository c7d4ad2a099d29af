use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{debug, info, warn};
use voxscribe_core::InboundEvent;
use voxscribe_pipeline::{DispatchOutcome, EventDispatcher, messages};

use crate::ChannelAdapter;
use crate::telegram_commands::BotCommand;
use crate::telegram_media::classify;

pub struct TelegramAdapter {
    bot: Bot,
}

impl TelegramAdapter {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// What to do with one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignore,
    Transcribe(InboundEvent),
    Reply(&'static str),
}

/// Decide how to handle `msg`. Messages from bots are never answered.
pub fn route(msg: &Message) -> Route {
    if msg.from.as_ref().is_some_and(|user| user.is_bot) {
        return Route::Ignore;
    }
    if let Some(event) = classify(msg) {
        return Route::Transcribe(event);
    }
    match text_reply(msg.text(), msg.chat.is_private()) {
        Some(reply) => Route::Reply(reply),
        None => Route::Ignore,
    }
}

/// Reply for a message without media: command answers anywhere, the usage
/// hint only in private chats.
pub fn text_reply(text: Option<&str>, private_chat: bool) -> Option<&'static str> {
    match text.and_then(BotCommand::parse) {
        Some(command) => Some(command.reply()),
        None if private_chat => Some(messages::UNSUPPORTED),
        None => None,
    }
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<EventDispatcher>,
) -> ResponseResult<()> {
    match route(&msg) {
        Route::Ignore => {}
        Route::Transcribe(event) => match dispatcher.dispatch(event).await {
            DispatchOutcome::Accepted(job_id) => debug!(%job_id, "Media message queued"),
            DispatchOutcome::Rejected(reason) => info!(?reason, "Media message rejected"),
        },
        Route::Reply(reply) => {
            if let Err(e) = bot
                .send_message(msg.chat.id, reply)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await
            {
                warn!(chat_id = msg.chat.id.0, error = %e, "Failed to answer message");
            }
        }
    }
    respond(())
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self, dispatcher: Arc<EventDispatcher>) -> anyhow::Result<()> {
        let me = self.bot.get_me().await?;
        info!(username = ?me.username, "Starting Telegram adapter");

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![dispatcher])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}
