use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dedup::DedupGuard;
use crate::types::Message;

/// One visitor's conversation: visible history plus the side effects already
/// performed on their behalf.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub guard: DedupGuard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            messages: Vec::<Message>::new(),
            guard: DedupGuard::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Append one message
    pub fn add_message(&mut self, msg: Message) {
        self.messages.push(msg);
        self.updated_at = Utc::now();
    }

    /// The last `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}
