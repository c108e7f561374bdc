use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("File '{name}' is {size} bytes, exceeding the {max} byte limit")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Unsupported image media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid or corrupted image data: {0}")]
    InvalidImageData(String),

    #[error("Invalid attachment: {name}: {reason}")]
    InvalidAttachment { name: String, reason: String },

    /// Error reported by the Messages API; displays the bare API message.
    #[error("{0}")]
    Api(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ChatError {
    pub fn invalid_attachment(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttachment {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for failures caught before any state mutation or network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::TooLarge { .. }
                | Self::UnsupportedType(_)
                | Self::UnsupportedMediaType(_)
                | Self::InvalidImageData(_)
                | Self::InvalidAttachment { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
