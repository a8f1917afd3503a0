#[cfg(test)]
pub mod mock;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::MessageEntity;

/// One item from the update feed
#[derive(Debug, Clone, Default)]
pub struct RawUpdate {
    /// Strictly increasing, not necessarily contiguous
    pub id: i64,
    pub message: Option<RawMessage>,
    pub callback: Option<CallbackEvent>,
}

/// An inbound chat message, reduced to the fields the dispatcher cares about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMessage {
    pub message_id: i32,
    pub chat_id: i64,
    pub from_user_id: Option<u64>,
    pub text: Option<String>,
    /// Set instead of `text` when the message carries media
    pub caption: Option<String>,
    /// Present only when the message is one part of a media group
    pub media_group_id: Option<String>,
    /// Every resolution the service offers for the same photo
    pub photo: Vec<PhotoVariant>,
    pub document: Option<FileRef>,
    pub video: Option<FileRef>,
    pub audio: Option<FileRef>,
}

impl RawMessage {
    /// The text body if present, otherwise the caption
    pub fn effective_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoVariant {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub file_id: String,
}

/// An inline keyboard button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub id: String,
    pub from_user_id: u64,
    pub data: Option<String>,
}

/// Remote content reference plus the caption it will be sent with
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub file_id: String,
    pub caption: Option<String>,
    pub caption_entities: Option<Vec<MessageEntity>>,
}

impl MediaRef {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            caption: None,
            caption_entities: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Document,
    Video,
    Audio,
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachmentKind::Photo => write!(f, "photo"),
            AttachmentKind::Document => write!(f, "document"),
            AttachmentKind::Video => write!(f, "video"),
            AttachmentKind::Audio => write!(f, "audio"),
        }
    }
}

/// Normalized attachment, independent of how the service delivered it
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Photo(MediaRef),
    Document(MediaRef),
    Video(MediaRef),
    Audio(MediaRef),
}

impl Attachment {
    pub fn photo(file_id: impl Into<String>) -> Self {
        Attachment::Photo(MediaRef::new(file_id))
    }

    pub fn document(file_id: impl Into<String>) -> Self {
        Attachment::Document(MediaRef::new(file_id))
    }

    pub fn video(file_id: impl Into<String>) -> Self {
        Attachment::Video(MediaRef::new(file_id))
    }

    pub fn audio(file_id: impl Into<String>) -> Self {
        Attachment::Audio(MediaRef::new(file_id))
    }

    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Photo(_) => AttachmentKind::Photo,
            Attachment::Document(_) => AttachmentKind::Document,
            Attachment::Video(_) => AttachmentKind::Video,
            Attachment::Audio(_) => AttachmentKind::Audio,
        }
    }

    pub fn media(&self) -> &MediaRef {
        match self {
            Attachment::Photo(m)
            | Attachment::Document(m)
            | Attachment::Video(m)
            | Attachment::Audio(m) => m,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.media().file_id
    }

    pub fn caption(&self) -> Option<&str> {
        self.media().caption.as_deref()
    }

    /// Clone of this attachment carrying the given caption and caption formatting
    pub fn with_caption(
        &self,
        caption: impl Into<String>,
        entities: Option<Vec<MessageEntity>>,
    ) -> Self {
        let mut media = self.media().clone();
        media.caption = Some(caption.into());
        media.caption_entities = entities;
        match self.kind() {
            AttachmentKind::Photo => Attachment::Photo(media),
            AttachmentKind::Document => Attachment::Document(media),
            AttachmentKind::Video => Attachment::Video(media),
            AttachmentKind::Audio => Attachment::Audio(media),
        }
    }
}

/// One user-facing unit of conversation: the first message seen plus every
/// attachment of its media group that arrived in the same batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalMessageEvent {
    pub anchor: RawMessage,
    pub attachments: Vec<Attachment>,
}

impl LogicalMessageEvent {
    pub fn new(anchor: RawMessage) -> Self {
        Self {
            anchor,
            attachments: Vec::new(),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.anchor.chat_id
    }

    pub fn effective_text(&self) -> Option<&str> {
        self.anchor.effective_text()
    }

    pub fn media_group_id(&self) -> Option<&str> {
        self.anchor.media_group_id.as_deref()
    }
}

/// The remote update feed and its send APIs
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    /// Long-poll for updates with id >= `offset` (all unacknowledged ones when `None`)
    async fn fetch(&self, offset: Option<i64>, wait_secs: u32) -> Result<Vec<RawUpdate>>;

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        entities: Option<Vec<MessageEntity>>,
    ) -> Result<()>;

    /// Send attachments as a single media group
    async fn send_attachment_group(&self, chat_id: i64, attachments: Vec<Attachment>)
        -> Result<()>;
}
