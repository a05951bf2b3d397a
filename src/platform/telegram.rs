use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use tracing::{debug, info, warn};

use crate::bot::{route, Command, Responder, Route};
use crate::platform::{IncomingMessage, OutgoingMessage, WebAppButton};

/// Username of the running bot, used to match `/start@username`
#[derive(Debug, Clone)]
pub struct BotName(pub String);

/// Where handler replies go. The dispatcher sends them to Telegram.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: OutgoingMessage) -> ResponseResult<()>;
}

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    /// One sendMessage call; text goes out without a parse mode so nothing is escaped
    async fn send(&self, reply: OutgoingMessage) -> ResponseResult<()> {
        let request = self.bot.send_message(ChatId(reply.chat_id), reply.text);

        match reply.button {
            Some(button) => request.reply_markup(webapp_keyboard(button)).await?,
            None => request.await?,
        };

        Ok(())
    }
}

/// Run the Telegram bot with long polling until Ctrl-C
pub async fn run(bot: Bot, responder: Arc<Responder>) -> Result<()> {
    info!("Starting Telegram platform...");

    let me = bot.get_me().await.context("Failed to fetch bot info")?;
    let bot_name = BotName(me.username().to_string());
    info!("Logged in as @{}", bot_name.0);

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to publish command menu: {}", e);
    }

    let sink: Arc<dyn ReplySink> = Arc::new(TelegramSink::new(bot.clone()));

    info!("Bot is starting with polling...");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![responder, bot_name, sink])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Polling stopped");

    Ok(())
}

/// Handler tree: text messages go to exactly one of `/start` or echo
pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .filter_map(incoming_from_telegram)
        .branch(
            dptree::filter(|msg: IncomingMessage, name: BotName| {
                route(&msg.text, &name.0) == Route::Start
            })
            .endpoint(start_command),
        )
        .branch(
            dptree::filter(|msg: IncomingMessage, name: BotName| {
                route(&msg.text, &name.0) == Route::Text
            })
            .endpoint(echo_message),
        )
}

/// Only text messages are handled; everything else falls to the default handler
fn incoming_from_telegram(msg: Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let user = msg.from.as_ref();

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        user_id: user.map(|u| u.id.0),
        user_name: user.map(|u| u.full_name()).unwrap_or_default(),
        text: text.to_string(),
    })
}

async fn start_command(
    sink: Arc<dyn ReplySink>,
    incoming: IncomingMessage,
    responder: Arc<Responder>,
) -> ResponseResult<()> {
    info!(
        "/start from {} ({:?}) in chat {}",
        incoming.user_name, incoming.user_id, incoming.chat_id
    );

    sink.send(responder.start_command(&incoming)).await
}

async fn echo_message(
    sink: Arc<dyn ReplySink>,
    incoming: IncomingMessage,
    responder: Arc<Responder>,
) -> ResponseResult<()> {
    info!(
        "Telegram message from {} ({:?}) in chat {}: {}",
        incoming.user_name, incoming.user_id, incoming.chat_id, incoming.text
    );

    sink.send(responder.echo_message(&incoming)).await
}

/// Inline keyboard with a single web app button
fn webapp_keyboard(button: WebAppButton) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        button.text,
        WebAppInfo { url: button.url },
    )]])
}
