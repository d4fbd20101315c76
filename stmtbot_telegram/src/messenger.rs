use async_trait::async_trait;
use stmtbot_core::{Messenger, TabularArtifact};
use teloxide::payloads::SendDocumentSetters;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::debug;

use crate::Error;

/// Delivers engine output to Telegram chats. Targets are numeric chat ids.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn chat_id(target: &str) -> crate::Result<ChatId> {
        target
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::InvalidChatId(target.to_string()))
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, target: &str, text: &str) -> anyhow::Result<()> {
        let chat_id = Self::chat_id(target)?;
        self.bot.send_message(chat_id, text).await?;
        debug!("Sent text to {target}");
        Ok(())
    }

    async fn send_file(
        &self,
        target: &str,
        artifact: &TabularArtifact,
        caption: &str,
    ) -> anyhow::Result<()> {
        let chat_id = Self::chat_id(target)?;
        let document =
            InputFile::memory(artifact.bytes.clone()).file_name(artifact.file_name.clone());
        self.bot
            .send_document(chat_id, document)
            .caption(caption)
            .await?;
        debug!("Sent {} to {target}", artifact.file_name);
        Ok(())
    }
}
