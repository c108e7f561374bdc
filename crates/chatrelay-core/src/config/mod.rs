use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::{api, files, generation, models};
use crate::error::ChatError;
use crate::llm::ClaudeClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub files: FileSettings,
    pub generation: GenerationConfig,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Upstream host, or the local prefix of a reverse proxy in front of it.
    pub base_url: String,
    pub api_key_env: String,
    pub default_model: String,
}

/// Static shared credential. Login is open when neither field is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub text_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub pdf_extensions: Vec<String>,
    /// Maximum attachment size in bytes.
    pub max_file_size: u64,
}

/// One entry of the allow-listed model catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Live generation parameters sent with every request.
///
/// Values are passed to the API as-is; out-of-range values are left for the
/// API to reject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Not a Messages API parameter; only sent when set.
    pub repetition_penalty: Option<f32>,
    pub stop_sequences: Vec<String>,
    pub system_prompt: String,
    /// Number of most recent turns included in each request.
    pub window_size: usize,
}

/// Partial override merged into a [`GenerationConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfigUpdate {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub repetition_penalty: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub system_prompt: Option<String>,
    pub window_size: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            auth: AuthSettings::default(),
            files: FileSettings::default(),
            generation: GenerationConfig::default(),
            models: default_models(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: api::BASE_URL.to_string(),
            api_key_env: api::API_KEY_ENV.to_string(),
            default_model: models::DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for FileSettings {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            text_extensions: owned(files::TEXT_EXTENSIONS),
            image_extensions: owned(files::IMAGE_EXTENSIONS),
            pdf_extensions: owned(files::PDF_EXTENSIONS),
            max_file_size: files::MAX_FILE_SIZE,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: generation::MAX_TOKENS,
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
            top_k: generation::TOP_K,
            repetition_penalty: None,
            stop_sequences: Vec::new(),
            system_prompt: generation::SYSTEM_PROMPT.to_string(),
            window_size: generation::WINDOW_SIZE,
        }
    }
}

impl GenerationConfig {
    /// Merge every field present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: GenerationConfigUpdate) {
        if let Some(v) = update.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = update.temperature {
            self.temperature = v;
        }
        if let Some(v) = update.top_p {
            self.top_p = v;
        }
        if let Some(v) = update.top_k {
            self.top_k = v;
        }
        if let Some(v) = update.repetition_penalty {
            self.repetition_penalty = Some(v);
        }
        if let Some(v) = update.stop_sequences {
            self.stop_sequences = v;
        }
        if let Some(v) = update.system_prompt {
            self.system_prompt = v;
        }
        if let Some(v) = update.window_size {
            self.window_size = v;
        }
    }
}

impl GenerationConfigUpdate {
    /// Parse a single `key=value` assignment, e.g. `temperature=0.2`.
    ///
    /// `stop_sequences` takes a comma-separated list.
    pub fn parse_assignment(input: &str) -> Result<Self, ChatError> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| ChatError::Config(format!("Expected key=value, got '{input}'")))?;
        let key = key.trim();
        let value = value.trim();
        let bad = |e: &dyn std::fmt::Display| ChatError::Config(format!("Invalid {key}: {e}"));

        let mut update = Self::default();
        match key {
            "max_tokens" => update.max_tokens = Some(value.parse().map_err(|e| bad(&e))?),
            "temperature" => update.temperature = Some(value.parse().map_err(|e| bad(&e))?),
            "top_p" => update.top_p = Some(value.parse().map_err(|e| bad(&e))?),
            "top_k" => update.top_k = Some(value.parse().map_err(|e| bad(&e))?),
            "repetition_penalty" => {
                update.repetition_penalty = Some(value.parse().map_err(|e| bad(&e))?)
            }
            "stop_sequences" => {
                update.stop_sequences = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            "system_prompt" | "system" => update.system_prompt = Some(value.to_string()),
            "window_size" | "window" => {
                update.window_size = Some(value.parse().map_err(|e| bad(&e))?)
            }
            other => return Err(ChatError::Config(format!("Unknown setting: {other}"))),
        }
        Ok(update)
    }
}

fn default_models() -> Vec<ModelInfo> {
    let entry = |id: &str, name: &str, price: &str, description: &str| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        price: price.to_string(),
        description: description.to_string(),
        features: Vec::new(),
        is_default: id == models::DEFAULT_MODEL,
    };

    let mut haiku_35 = entry(
        models::CLAUDE_35_HAIKU,
        "Claude 3.5 Haiku",
        "¥0.0146/1K tokens",
        "Fastest and most cost-effective model",
    );
    haiku_35.features = vec![
        "Real-time chatbots".to_string(),
        "Data extraction and labeling".to_string(),
        "Content classification".to_string(),
    ];

    vec![
        entry(
            models::CLAUDE_3_OPUS,
            "Claude 3 Opus",
            "¥0.1100/1K tokens",
            "Most capable model for complex and creative work",
        ),
        entry(
            models::CLAUDE_3_SONNET,
            "Claude 3 Sonnet",
            "¥0.0366/1K tokens",
            "Balanced performance and price for most tasks",
        ),
        entry(
            models::CLAUDE_3_HAIKU,
            "Claude 3 Haiku",
            "¥0.0146/1K tokens",
            "Lightweight model for quick, simple conversations",
        ),
        entry(
            models::CLAUDE_35_SONNET,
            "Claude 3.5 Sonnet",
            "¥0.0293/1K tokens",
            "Most intelligent model, top performance at higher speed",
        ),
        haiku_35,
    ]
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatrelay")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        let mut settings = if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Ignoring unreadable config {}: {e}", config_path.display());
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        settings.apply_env();
        settings
    }

    /// Load from an explicit path, reporting read and parse failures.
    pub fn load_from(path: &Path) -> Result<Self, ChatError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| ChatError::Config(format!("{}: {e}", path.display())))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), ChatError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ChatError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override base URL and default model from the environment when set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(api::BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(model) = std::env::var(api::MODEL_ENV) {
            if !model.trim().is_empty() {
                self.api.default_model = model;
            }
        }
    }

    /// Get the API key from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn find_model(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == id)
    }

    /// The configured default model, which need not be in the catalogue.
    pub fn default_model(&self) -> &str {
        &self.api.default_model
    }

    /// Check a username/password pair against the shared credential.
    pub fn check_login(&self, username: &str, password: &str) -> bool {
        match (&self.auth.username, &self.auth.password) {
            (None, None) => true,
            (user, pass) => {
                user.as_deref() == Some(username) && pass.as_deref() == Some(password)
            }
        }
    }

    pub fn build_client(&self) -> Result<ClaudeClient, ChatError> {
        let api_key = self.api_key().ok_or_else(|| {
            ChatError::Config(format!(
                "No API key found; set the {} environment variable",
                self.api.api_key_env
            ))
        })?;
        Ok(ClaudeClient::new(api_key).with_base_url(self.api.base_url.clone()))
    }
}
