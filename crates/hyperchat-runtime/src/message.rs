#![forbid(unsafe_code)]

//! Chat message payload.

use std::fmt;

use hyperchat_widgets::ListItem;
use web_time::SystemTime;

/// Stable message identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identity.
    pub id: MessageId,
    /// Display name of the sender.
    pub author: String,
    /// Body text; may span several lines.
    pub content: String,
    /// When the message was sent.
    pub created_at: SystemTime,
}

impl Message {
    /// Create a message.
    pub fn new(
        id: MessageId,
        author: impl Into<String>,
        content: impl Into<String>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Number of text lines in the body.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count().max(1)
    }
}

impl ListItem for Message {
    type Id = MessageId;

    fn id(&self) -> MessageId {
        self.id
    }
}
