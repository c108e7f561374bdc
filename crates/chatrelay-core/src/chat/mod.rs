use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{GenerationConfig, GenerationConfigUpdate};
use crate::constants::api::GENERIC_ERROR;
use crate::error::ChatError;
use crate::files::FileAttachment;
use crate::llm::{ContentPart, Message, MessagesRequest, MessagesTransport, RawResponse, Usage};

/// One user send: text plus attachments for a given conversation.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub model: String,
    pub message: String,
    pub files: Vec<FileAttachment>,
    pub conversation_id: String,
}

impl SendRequest {
    pub fn new(
        model: impl Into<String>,
        message: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
            files: Vec::new(),
            conversation_id: conversation_id.into(),
        }
    }

    pub fn with_files(mut self, files: Vec<FileAttachment>) -> Self {
        self.files = files;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Pull `error.message` out of a failed response body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.is_empty())
}

fn parse_reply(response: RawResponse) -> Result<Reply, ChatError> {
    if !response.is_success() {
        warn!("Messages API returned status {}", response.status);
        let message = error_message(&response.body).unwrap_or_else(|| GENERIC_ERROR.to_string());
        return Err(ChatError::Api(message));
    }

    let parsed: ApiResponse = serde_json::from_str(&response.body)?;
    let first = parsed
        .content
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::Other("Response contained no content blocks".to_string()))?;

    Ok(Reply {
        content: first.text,
        usage: parsed.usage,
    })
}

/// Assembles Messages API requests from per-conversation turn history and
/// keeps that history consistent with what the API has answered.
///
/// This history is the transport-side copy used for request windows; the
/// display-facing copy lives in [`crate::ConversationStore`].
pub struct ChatService {
    transport: Arc<dyn MessagesTransport>,
    config: GenerationConfig,
    histories: HashMap<String, Vec<Message>>,
}

impl ChatService {
    pub fn new(transport: Arc<dyn MessagesTransport>) -> Self {
        Self {
            transport,
            config: GenerationConfig::default(),
            histories: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Merge a partial override into the live configuration. Values are not
    /// range-checked.
    pub fn update_config(&mut self, update: GenerationConfigUpdate) {
        self.config.apply(update);
        debug!("Generation config updated: {:?}", self.config);
    }

    /// Turns recorded for a conversation; empty when it has none.
    pub fn history(&self, conversation_id: &str) -> &[Message] {
        self.histories
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reset one conversation's history, or all of them.
    pub fn clear_history(&mut self, conversation_id: Option<&str>) {
        match conversation_id {
            Some(id) => {
                self.histories.insert(id.to_string(), Vec::new());
            }
            None => self.histories.clear(),
        }
    }

    /// Whether any history entry exists for a conversation.
    pub fn has_history(&self, conversation_id: &str) -> bool {
        self.histories.contains_key(conversation_id)
    }

    /// Drop a conversation's history entirely.
    pub fn remove_history(&mut self, conversation_id: &str) {
        self.histories.remove(conversation_id);
    }

    /// Build the user turn. Fails without side effects on bad attachments.
    fn build_user_turn(message: &str, files: &[FileAttachment]) -> Result<Message, ChatError> {
        let mut content = Vec::with_capacity(files.len() + 1);
        content.push(ContentPart::text(message));
        for file in files {
            content.push(file.to_content_part()?);
        }
        Ok(Message::user(content))
    }

    /// Request body for `model` over the last `window_size` turns of a
    /// conversation, in chronological order.
    pub fn build_request(&self, model: &str, conversation_id: &str) -> MessagesRequest {
        let history = self.history(conversation_id);
        let start = history.len().saturating_sub(self.config.window_size);

        MessagesRequest {
            model: model.to_string(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            system: self.config.system_prompt.clone(),
            stop_sequences: self.config.stop_sequences.clone(),
            repetition_penalty: self.config.repetition_penalty,
            messages: history[start..].to_vec(),
        }
    }

    /// Send one user turn and commit the reply.
    ///
    /// Either both the user and assistant turns are committed, or the
    /// history is left exactly as it was before the call.
    pub async fn send(&mut self, request: SendRequest) -> Result<Reply, ChatError> {
        let SendRequest {
            model,
            message,
            files,
            conversation_id,
        } = request;

        self.histories.entry(conversation_id.clone()).or_default();
        let turn = Self::build_user_turn(&message, &files)?;

        let history = self.histories.entry(conversation_id.clone()).or_default();
        history.push(turn);
        let provisional_len = history.len();

        let body = self.build_request(&model, &conversation_id);
        debug!(
            "Sending {} of {} turns for conversation {conversation_id}",
            body.messages.len(),
            provisional_len
        );

        let outcome = match self.transport.post(&body).await {
            Ok(response) => parse_reply(response),
            Err(e) => Err(e),
        };

        let history = self.histories.entry(conversation_id.clone()).or_default();
        match outcome {
            Ok(reply) => {
                history.push(Message::assistant(reply.content.clone()));
                Ok(reply)
            }
            Err(e) => {
                if history.len() == provisional_len {
                    history.pop();
                }
                warn!("Send failed for conversation {conversation_id}, rolled back: {e}");
                Err(e)
            }
        }
    }
}
