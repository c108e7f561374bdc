pub mod error;
pub mod constants;
pub mod config;
pub mod files;
pub mod conversation;
pub mod llm;
pub mod chat;
pub mod session;

// Re-export key types
pub use error::ChatError;
pub use config::{GenerationConfig, GenerationConfigUpdate, ModelInfo, Settings};
pub use files::{AttachmentContent, FileAttachment, FileIntake, FileKind, IncomingFile};
pub use conversation::{Conversation, ConversationStore};
pub use llm::{
    ClaudeClient, ContentPart, ImageSource, Message, MessagesRequest, MessagesTransport,
    RawResponse, Role, Usage,
};
pub use chat::{ChatService, Reply, SendRequest};
pub use session::ChatSession;
