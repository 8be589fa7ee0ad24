//! Telegram runtime: wires the search client and command dispatcher into a
//! teloxide dispatcher and registers the command menu.

use crate::bot::dispatcher::{CommandDispatcher, InboundMessage};
use crate::bot::presence::PresenceState;
use crate::bot::telegram::TelegramTransport;
use crate::config::Settings;
use crate::search::{GoogleSearchClient, SearchApi};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{debug, info, warn};

/// Run the Telegram bot until Ctrl-C.
pub async fn run_bot(settings: Arc<Settings>) {
    let search: Arc<dyn SearchApi> = Arc::new(GoogleSearchClient::new(&settings));
    info!("Search client initialized.");

    let dispatcher = Arc::new(CommandDispatcher::new(
        search,
        settings.image_fetch_concurrency,
    ));
    let presence = Arc::new(PresenceState::new());

    let bot = Bot::new(settings.telegram_token.clone());
    register_commands(&bot).await;

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher, presence])
        .default_handler(|upd| async move {
            debug!(update_id = ?upd.id, "Ignoring unsupported update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn register_commands(bot: &Bot) {
    let commands = vec![
        BotCommand::new("search", "Search the web: /search <term>"),
        BotCommand::new("img", "Find images: /img <term> [count]"),
    ];

    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {}", e);
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry().branch(
        Update::filter_message()
            .filter(|msg: Message| msg.text().is_some())
            .endpoint(handle_text),
    )
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<CommandDispatcher>,
    presence: Arc<PresenceState>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };

    let transport = TelegramTransport::new(bot, msg.chat.id, msg.id, presence);
    let inbound = InboundMessage::new(text);

    if dispatcher.handle(&inbound, &transport).await.is_none() {
        debug!(chat_id = %msg.chat.id, "Ignoring non-command message");
    }

    respond(())
}
