use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::constants::conversation::{ID_SUFFIX_LEN, TITLE_PREFIX};
use crate::error::ChatError;
use crate::llm::Message;

/// A titled, ordered sequence of user/assistant turns tracked for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// In-memory collection of conversations, most recently created first.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
}

/// Base-36 millisecond timestamp followed by a random suffix.
fn generate_id() -> String {
    let mut millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut stamp = Vec::new();
    loop {
        let digit = (millis % 36) as u32;
        stamp.push(std::char::from_digit(digit, 36).unwrap_or('0'));
        millis /= 36;
        if millis == 0 {
            break;
        }
    }
    stamp.reverse();

    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}",
        stamp.into_iter().collect::<String>(),
        &suffix[..ID_SUFFIX_LEN]
    )
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty conversation at the front of the list.
    pub fn create(&mut self) -> &Conversation {
        let mut id = generate_id();
        while self.contains(&id) {
            id = generate_id();
        }

        let conversation = Conversation {
            id,
            title: format!("{} {}", TITLE_PREFIX, self.conversations.len() + 1),
            messages: Vec::new(),
            created_at: Utc::now(),
        };
        info!("Created conversation {} ({})", conversation.id, conversation.title);

        self.conversations.insert(0, conversation);
        &self.conversations[0]
    }

    /// Remove a conversation. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.conversations.iter().position(|c| c.id == id) {
            Some(index) => {
                self.conversations.remove(index);
                info!("Deleted conversation {id}");
                true
            }
            None => false,
        }
    }

    /// Retitle a conversation. Unknown ids are ignored.
    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Result<&Conversation, ChatError> {
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.conversations.iter().any(|c| c.id == id)
    }

    /// Append a display turn to a conversation.
    pub fn push_message(&mut self, id: &str, message: Message) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        conversation.messages.push(message);
        Ok(())
    }
}
