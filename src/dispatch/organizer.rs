use std::collections::HashMap;

use crate::platform::{Attachment, LogicalMessageEvent, RawMessage};

/// Groups one batch of messages into logical events.
///
/// Messages without a media group id become events of their own. Messages
/// sharing a group id collapse into one event anchored on the first of them,
/// collecting every resolved attachment in arrival order.
#[derive(Debug, Default)]
pub struct MessageOrganizer {
    ungrouped: Vec<LogicalMessageEvent>,
    grouped: Vec<LogicalMessageEvent>,
    group_index: HashMap<String, usize>,
}

impl MessageOrganizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: RawMessage, resolved: Option<Attachment>) {
        let Some(group_id) = message.media_group_id.clone() else {
            let mut event = LogicalMessageEvent::new(message);
            event.attachments.extend(resolved);
            self.ungrouped.push(event);
            return;
        };

        let index = match self.group_index.get(&group_id) {
            Some(&index) => index,
            None => {
                self.grouped.push(LogicalMessageEvent::new(message));
                let index = self.grouped.len() - 1;
                self.group_index.insert(group_id, index);
                index
            }
        };
        self.grouped[index].attachments.extend(resolved);
    }

    pub fn len(&self) -> usize {
        self.ungrouped.len() + self.grouped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ungrouped events in arrival order, then grouped events in the order
    /// their group ids were first seen.
    pub fn into_events(self) -> Vec<LogicalMessageEvent> {
        let mut events = self.ungrouped;
        events.extend(self.grouped);
        events
    }
}
