use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, FileId, InputFile, InputMedia, InputMediaAudio, InputMediaDocument,
    InputMediaPhoto, InputMediaVideo, MessageEntity, UpdateKind,
};
use tracing::debug;

use super::{Attachment, CallbackEvent, FileRef, PhotoVariant, RawMessage, RawUpdate, RemoteFeed};

/// Extra HTTP time on top of the long-poll window before a fetch is abandoned
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 10;

/// [`RemoteFeed`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramFeed {
    bot: Bot,
}

impl TelegramFeed {
    /// Build a bot whose HTTP timeout outlasts a `wait_secs` long poll.
    /// teloxide's default client gives up before a 20s `getUpdates` returns.
    pub fn new(token: &str, wait_secs: u32) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(
                u64::from(wait_secs) + HTTP_TIMEOUT_MARGIN_SECS,
            ))
            .build()
            .context("Failed to build HTTP client for Telegram")?;
        Ok(Self::from_bot(Bot::with_client(token, client)))
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    /// The underlying bot, for API calls this crate does not wrap
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl RemoteFeed for TelegramFeed {
    async fn fetch(&self, offset: Option<i64>, wait_secs: u32) -> Result<Vec<RawUpdate>> {
        let mut request = self.bot.get_updates();
        request.offset = telegram_offset(offset)?;
        request.timeout = Some(wait_secs);

        let updates = request.await.context("getUpdates request failed")?;
        debug!("getUpdates returned {} updates", updates.len());

        Ok(updates.iter().map(RawUpdate::from_update).collect())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        entities: Option<Vec<MessageEntity>>,
    ) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        request.entities = entities;
        request.await.context("sendMessage request failed")?;
        Ok(())
    }

    async fn send_attachment_group(
        &self,
        chat_id: i64,
        attachments: Vec<Attachment>,
    ) -> Result<()> {
        let media: Vec<InputMedia> = attachments.into_iter().map(to_input_media).collect();
        self.bot
            .send_media_group(ChatId(chat_id), media)
            .await
            .context("sendMediaGroup request failed")?;
        Ok(())
    }
}

/// Telegram takes a 32-bit offset
fn telegram_offset(offset: Option<i64>) -> Result<Option<i32>> {
    offset
        .map(|o| i32::try_from(o).with_context(|| format!("Update offset {} out of range", o)))
        .transpose()
}

impl RawUpdate {
    /// Keep the id of every update so the cursor moves past kinds we ignore.
    pub fn from_update(update: &Update) -> Self {
        let mut raw = RawUpdate {
            id: i64::from(update.id.0),
            ..Default::default()
        };
        match &update.kind {
            UpdateKind::Message(msg) => raw.message = Some(RawMessage::from_message(msg)),
            UpdateKind::CallbackQuery(query) => {
                raw.callback = Some(CallbackEvent::from_query(query))
            }
            _ => {}
        }
        raw
    }
}

impl RawMessage {
    pub fn from_message(msg: &Message) -> Self {
        let photo = msg
            .photo()
            .map(|sizes| {
                sizes
                    .iter()
                    .map(|p| PhotoVariant {
                        file_id: p.file.id.to_string(),
                        width: p.width,
                        height: p.height,
                    })
                    .collect()
            })
            .unwrap_or_default();

        RawMessage {
            message_id: msg.id.0,
            chat_id: msg.chat.id.0,
            from_user_id: msg.from.as_ref().map(|u| u.id.0),
            text: msg.text().map(str::to_string),
            caption: msg.caption().map(str::to_string),
            media_group_id: msg.media_group_id().map(|id| id.to_string()),
            photo,
            document: msg.document().map(|d| FileRef {
                file_id: d.file.id.to_string(),
            }),
            video: msg.video().map(|v| FileRef {
                file_id: v.file.id.to_string(),
            }),
            audio: msg.audio().map(|a| FileRef {
                file_id: a.file.id.to_string(),
            }),
        }
    }
}

impl CallbackEvent {
    pub fn from_query(query: &CallbackQuery) -> Self {
        CallbackEvent {
            id: query.id.to_string(),
            from_user_id: query.from.id.0,
            data: query.data.clone(),
        }
    }
}

fn to_input_media(attachment: Attachment) -> InputMedia {
    match attachment {
        Attachment::Photo(media) => {
            let mut m = InputMediaPhoto::new(InputFile::file_id(FileId(media.file_id)));
            m.caption = media.caption;
            m.caption_entities = media.caption_entities;
            InputMedia::Photo(m)
        }
        Attachment::Document(media) => {
            let mut m = InputMediaDocument::new(InputFile::file_id(FileId(media.file_id)));
            m.caption = media.caption;
            m.caption_entities = media.caption_entities;
            InputMedia::Document(m)
        }
        Attachment::Video(media) => {
            let mut m = InputMediaVideo::new(InputFile::file_id(FileId(media.file_id)));
            m.caption = media.caption;
            m.caption_entities = media.caption_entities;
            InputMedia::Video(m)
        }
        Attachment::Audio(media) => {
            let mut m = InputMediaAudio::new(InputFile::file_id(FileId(media.file_id)));
            m.caption = media.caption;
            m.caption_entities = media.caption_entities;
            InputMedia::Audio(m)
        }
    }
}
