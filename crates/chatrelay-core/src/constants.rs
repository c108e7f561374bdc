/// Centralized constants for chatrelay.
/// Magic numbers, strings, and limits live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const CLAUDE_3_OPUS: &str = "claude-3-opus-20240229";
    pub const CLAUDE_3_SONNET: &str = "claude-3-sonnet-20240229";
    pub const CLAUDE_3_HAIKU: &str = "claude-3-haiku-20240307";
    pub const CLAUDE_35_SONNET: &str = "claude-3-5-sonnet-20241022";
    pub const CLAUDE_35_HAIKU: &str = "claude-3-5-haiku-20241022";

    pub const DEFAULT_MODEL: &str = CLAUDE_35_SONNET;
}

// ─── API ──────────────────────────────────────────────────────────────────────

pub mod api {
    pub const BASE_URL: &str = "https://api.anthropic.com";
    pub const MESSAGES_PATH: &str = "/v1/messages";
    pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
    pub const BASE_URL_ENV: &str = "CHATRELAY_BASE_URL";
    pub const MODEL_ENV: &str = "CHATRELAY_MODEL";

    pub const VERSION_HEADER: &str = "anthropic-version";
    pub const VERSION: &str = "2023-06-01";
    pub const DIRECT_ACCESS_HEADER: &str = "anthropic-dangerous-direct-browser-access";
    pub const API_KEY_HEADER: &str = "x-api-key";

    /// Used when a failed response carries no `error.message`.
    pub const GENERIC_ERROR: &str = "API request failed";
}

// ─── Generation defaults ──────────────────────────────────────────────────────

pub mod generation {
    pub const MAX_TOKENS: u32 = 4000;
    pub const TEMPERATURE: f32 = 0.7;
    pub const TOP_P: f32 = 0.9;
    pub const TOP_K: u32 = 40;
    pub const WINDOW_SIZE: usize = 10;
    pub const SYSTEM_PROMPT: &str = "You are Claude, an AI assistant.";
}

// ─── Files ────────────────────────────────────────────────────────────────────

pub mod files {
    pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    pub const TEXT_EXTENSIONS: &[&str] = &[
        "txt", "md", "json", "csv", "js", "py", "java", "c", "cpp", "html", "css",
    ];
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
    pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

    /// Image media types the Messages API accepts.
    pub const SUPPORTED_IMAGE_TYPES: &[&str] =
        &["image/jpeg", "image/png", "image/gif", "image/webp"];
}

// ─── Conversations ────────────────────────────────────────────────────────────

pub mod conversation {
    pub const TITLE_PREFIX: &str = "New Conversation";
    pub const ID_SUFFIX_LEN: usize = 11;
}
