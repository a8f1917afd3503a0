//! In-memory feed for unit testing without a Telegram connection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use teloxide::types::MessageEntity;

use super::{Attachment, RawUpdate, RemoteFeed};

/// A send captured by [`MockFeed`], in call order
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message {
        chat_id: i64,
        text: String,
        entities: Option<Vec<MessageEntity>>,
    },
    AttachmentGroup {
        chat_id: i64,
        attachments: Vec<Attachment>,
    },
}

#[derive(Default)]
struct MockState {
    batches: VecDeque<Vec<RawUpdate>>,
    offsets: Vec<Option<i64>>,
    sent: Vec<Sent>,
    fail_sends_after: Option<usize>,
}

/// Feed that replays scripted batches and records everything sent.
///
/// Once the scripted batches run out `fetch` fails, which ends the
/// dispatch loop.
#[derive(Clone, Default)]
pub struct MockFeed {
    state: Arc<Mutex<MockState>>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch to be returned by the next unanswered `fetch`
    pub fn push_batch(&self, batch: Vec<RawUpdate>) {
        self.state.lock().unwrap().batches.push_back(batch);
    }

    /// Offsets `fetch` has been called with, in order
    pub fn requested_offsets(&self) -> Vec<Option<i64>> {
        self.state.lock().unwrap().offsets.clone()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Make every send after the first `n` fail
    pub fn fail_sends_after(&self, n: usize) {
        self.state.lock().unwrap().fail_sends_after = Some(n);
    }

    fn record(&self, sent: Sent) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.fail_sends_after {
            if state.sent.len() >= limit {
                bail!("mock send failure");
            }
        }
        state.sent.push(sent);
        Ok(())
    }
}

#[async_trait]
impl RemoteFeed for MockFeed {
    async fn fetch(&self, offset: Option<i64>, _wait_secs: u32) -> Result<Vec<RawUpdate>> {
        let mut state = self.state.lock().unwrap();
        state.offsets.push(offset);
        match state.batches.pop_front() {
            Some(batch) => Ok(batch
                .into_iter()
                .filter(|u| offset.map_or(true, |o| u.id >= o))
                .collect()),
            None => bail!("mock feed exhausted"),
        }
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        entities: Option<Vec<MessageEntity>>,
    ) -> Result<()> {
        self.record(Sent::Message {
            chat_id,
            text: text.to_string(),
            entities,
        })
    }

    async fn send_attachment_group(
        &self,
        chat_id: i64,
        attachments: Vec<Attachment>,
    ) -> Result<()> {
        self.record(Sent::AttachmentGroup {
            chat_id,
            attachments,
        })
    }
}
