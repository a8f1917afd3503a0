use std::sync::Arc;

use anyhow::{bail, Context, Result};
use teloxide::types::MessageEntity;
use tracing::debug;

use crate::platform::{Attachment, RemoteFeed};

/// Chunk size for plain-text replies
pub const CAPTION_LIMIT: usize = 1024;
/// Chunk size when the reply ends in an attachment group
pub const MESSAGE_LIMIT: usize = 4096;

/// Word-wrap `text` into chunks of at most `width` characters.
///
/// Words are separated by any whitespace and rejoined with single spaces. A
/// word longer than `width` is hard-split. Empty input gives one empty chunk.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            chunks.push(std::mem::take(&mut current));
        }

        while word_len > width {
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            chunks.push(word[..split].to_string());
            word = &word[split..];
            word_len -= width;
        }

        current.push_str(word);
        current_len = word_len;
    }

    if current_len > 0 || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Copy of `attachments` where only the first one carries `caption`.
pub fn repack(
    attachments: &[Attachment],
    caption: &str,
    entities: Option<Vec<MessageEntity>>,
) -> Result<Vec<Attachment>> {
    let Some((first, rest)) = attachments.split_first() else {
        bail!("An attachment group needs at least one attachment");
    };

    let mut packed = Vec::with_capacity(attachments.len());
    packed.push(first.with_caption(caption, entities));
    packed.extend(rest.iter().cloned());
    Ok(packed)
}

/// Sends replies through a [`RemoteFeed`], keeping text within the service's
/// length limits.
#[derive(Clone)]
pub struct OutboundComposer {
    feed: Arc<dyn RemoteFeed>,
}

impl OutboundComposer {
    pub fn new(feed: Arc<dyn RemoteFeed>) -> Self {
        Self { feed }
    }

    /// Send `text` to `chat_id`, followed by `attachments` as one group.
    ///
    /// Without attachments every chunk goes out as its own message. With
    /// attachments all chunks but the last go out as messages and the last
    /// one becomes the caption of the first attachment. `entities` is passed
    /// unchanged with every chunk.
    pub async fn send(
        &self,
        chat_id: i64,
        text: &str,
        attachments: &[Attachment],
        entities: Option<Vec<MessageEntity>>,
    ) -> Result<()> {
        if attachments.is_empty() {
            let chunks = wrap_text(text, CAPTION_LIMIT);
            debug!("Sending {} text chunk(s) to chat {}", chunks.len(), chat_id);
            for chunk in &chunks {
                self.send_text(chat_id, chunk, entities.clone()).await?;
            }
            return Ok(());
        }

        let mut chunks = wrap_text(text, MESSAGE_LIMIT);
        let caption = chunks.pop().unwrap_or_default();
        for chunk in &chunks {
            self.send_text(chat_id, chunk, entities.clone()).await?;
        }

        let group = repack(attachments, &caption, entities)?;
        debug!(
            "Sending group of {} attachment(s) to chat {}",
            group.len(),
            chat_id
        );
        self.feed
            .send_attachment_group(chat_id, group)
            .await
            .with_context(|| format!("Failed to send attachment group to chat {}", chat_id))
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        entities: Option<Vec<MessageEntity>>,
    ) -> Result<()> {
        self.feed
            .send_message(chat_id, text, entities)
            .await
            .with_context(|| format!("Failed to send message to chat {}", chat_id))
    }
}
