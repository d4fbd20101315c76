use crate::{Result, TelegramBot};
use teloxide::types::Message;
use tracing::{debug, info};

/// Forward a chat message to the conversation engine.
///
/// Non-text updates (stickers, photos, ...) are ignored.
pub async fn handle_message(bot: TelegramBot, msg: Message) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message in chat {}", msg.chat.id);
        return Ok(());
    };

    let sender = msg.chat.id.0.to_string();
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");

    info!("[@{username}] Message in chat {sender}");

    bot.engine.handle(&sender, text).await;

    Ok(())
}
