use std::sync::Arc;
use tracing::info;

use crate::chat::{ChatService, Reply, SendRequest};
use crate::config::{GenerationConfigUpdate, ModelInfo, Settings};
use crate::conversation::{Conversation, ConversationStore};
use crate::error::ChatError;
use crate::files::FileAttachment;
use crate::llm::{Message, MessagesTransport};

/// Context object owning the conversation list and the chat service.
///
/// The store holds the full display history; the service holds the turns
/// used to build request windows. Both are updated together here, so a
/// failed send leaves neither with a dangling user turn.
pub struct ChatSession {
    store: ConversationStore,
    service: ChatService,
    models: Vec<ModelInfo>,
    model: String,
    active: Option<String>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn MessagesTransport>, settings: &Settings) -> Self {
        Self {
            store: ConversationStore::new(),
            service: ChatService::new(transport).with_config(settings.generation.clone()),
            models: settings.models.clone(),
            model: settings.default_model().to_string(),
            active: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn service(&self) -> &ChatService {
        &self.service
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switch models; the id must be in the catalogue.
    pub fn set_model(&mut self, id: &str) -> Result<(), ChatError> {
        if !self.models.iter().any(|m| m.id == id) {
            return Err(ChatError::UnknownModel(id.to_string()));
        }
        self.model = id.to_string();
        info!("Model set to {id}");
        Ok(())
    }

    pub fn update_config(&mut self, update: GenerationConfigUpdate) {
        self.service.update_config(update);
    }

    /// Create a conversation and make it active. Returns its id.
    pub fn new_conversation(&mut self) -> String {
        let id = self.store.create().id.clone();
        self.active = Some(id.clone());
        id
    }

    pub fn select(&mut self, id: &str) -> Result<(), ChatError> {
        self.store.get(id)?;
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.as_deref().and_then(|id| self.store.get(id).ok())
    }

    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        self.store.rename(id, title)
    }

    /// Delete a conversation along with its request history.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.store.delete(id);
        if removed {
            self.service.remove_history(id);
            if self.active.as_deref() == Some(id) {
                self.active = self.store.list().first().map(|c| c.id.clone());
            }
        }
        removed
    }

    pub fn clear_all(&mut self) {
        self.store.clear();
        self.service.clear_history(None);
        self.active = None;
    }

    /// Send to the active conversation, creating one when none is active.
    pub async fn send(
        &mut self,
        text: impl Into<String>,
        files: Vec<FileAttachment>,
    ) -> Result<Reply, ChatError> {
        let conversation_id = match self.active.clone() {
            Some(id) if self.store.contains(&id) => id,
            _ => self.new_conversation(),
        };

        let request = SendRequest::new(self.model.clone(), text, conversation_id.clone())
            .with_files(files);
        let reply = self.service.send(request).await?;

        // The service committed both turns; mirror them for display.
        let turns = self.service.history(&conversation_id);
        let user_turn = turns
            .len()
            .checked_sub(2)
            .and_then(|i| turns.get(i))
            .cloned()
            .ok_or_else(|| ChatError::Other("Request history out of sync".to_string()))?;
        self.store.push_message(&conversation_id, user_turn)?;
        self.store
            .push_message(&conversation_id, Message::assistant(reply.content.clone()))?;

        Ok(reply)
    }

    /// Send with a queue of pending attachments. The queue is emptied only
    /// when the send succeeds, so a failed turn can be retried as-is.
    pub async fn send_queued(
        &mut self,
        text: impl Into<String>,
        queue: &mut Vec<FileAttachment>,
    ) -> Result<Reply, ChatError> {
        let reply = self.send(text, queue.clone()).await?;
        queue.clear();
        Ok(reply)
    }
}
