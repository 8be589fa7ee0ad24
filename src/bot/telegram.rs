//! Telegram implementation of [`ChatTransport`].

use crate::bot::dispatcher::ChatTransport;
use crate::bot::presence::{Presence, PresenceState};
use crate::config::TELEGRAM_MESSAGE_LIMIT;
use crate::utils::{retry_telegram_operation, split_long_message};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InputFile, MessageId, ReplyParameters};
use tracing::{debug, warn};

/// Image types Telegram renders as native photos
static PHOTO_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/bmp"];

/// Replies to one inbound Telegram message
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
    presence: Arc<PresenceState>,
}

impl TelegramTransport {
    /// Create a transport bound to the message being answered.
    #[must_use]
    pub const fn new(
        bot: Bot,
        chat_id: ChatId,
        reply_to: MessageId,
        presence: Arc<PresenceState>,
    ) -> Self {
        Self {
            bot,
            chat_id,
            reply_to,
            presence,
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn reply_text(&self, text: &str) -> Result<()> {
        for part in split_long_message(text, TELEGRAM_MESSAGE_LIMIT) {
            retry_telegram_operation(|| async {
                self.bot
                    .send_message(self.chat_id, part.clone())
                    .reply_parameters(ReplyParameters::new(self.reply_to))
                    .await
                    .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
            })
            .await?;
        }
        Ok(())
    }

    async fn reply_media(&self, payload: Bytes, mime_type: &str, file_name: &str) -> Result<()> {
        retry_telegram_operation(|| async {
            send_media_smart(
                &self.bot,
                self.chat_id,
                self.reply_to,
                &payload,
                mime_type,
                file_name,
            )
            .await
        })
        .await
    }

    async fn set_presence(&self, presence: Presence) -> Result<()> {
        self.presence.set(presence);
        match presence {
            Presence::Active => {
                self.bot
                    .send_chat_action(self.chat_id, ChatAction::Typing)
                    .await?;
            }
            // Telegram clears the indicator on its own once we reply
            Presence::Inactive => debug!(chat_id = %self.chat_id, "Presence cleared"),
        }
        Ok(())
    }
}

/// Send an image as photo, animation or document depending on its MIME type.
///
/// Falls back to a document when Telegram rejects native photo upload.
async fn send_media_smart(
    bot: &Bot,
    chat_id: ChatId,
    reply_to: MessageId,
    payload: &Bytes,
    mime_type: &str,
    file_name: &str,
) -> Result<()> {
    let file_name_owned = file_name.to_string();
    let make_file = || InputFile::memory(payload.to_vec()).file_name(file_name_owned.clone());
    let reply = ReplyParameters::new(reply_to);

    if mime_type == "image/gif" {
        bot.send_animation(chat_id, make_file())
            .reply_parameters(reply)
            .await?;
        return Ok(());
    }

    if PHOTO_MIME_TYPES.contains(&mime_type) {
        match bot
            .send_photo(chat_id, make_file())
            .reply_parameters(reply.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => warn!(
                file_name = %file_name,
                error = %e,
                "Failed to send image as photo; falling back to document"
            ),
        }
    }

    bot.send_document(chat_id, make_file())
        .reply_parameters(reply)
        .await?;
    Ok(())
}
