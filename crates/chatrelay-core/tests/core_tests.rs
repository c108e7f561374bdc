use chatrelay_core::config::{AuthSettings, Settings};
use chatrelay_core::*;
use tempfile::TempDir;

// ========================================================================
// Settings Tests (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.api.base_url, "https://api.anthropic.com");
    assert_eq!(settings.api.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(settings.default_model(), "claude-3-5-sonnet-20241022");

    assert_eq!(settings.files.max_file_size, 10 * 1024 * 1024);
    assert!(settings.files.text_extensions.contains(&"md".to_string()));
    assert_eq!(settings.files.image_extensions.len(), 5);
    assert_eq!(settings.files.pdf_extensions, vec!["pdf".to_string()]);

    assert_eq!(settings.generation.max_tokens, 4000);
    assert_eq!(settings.generation.window_size, 10);
    assert!(settings.generation.stop_sequences.is_empty());
    assert!(settings.generation.repetition_penalty.is_none());
}

#[test]
fn test_settings_model_catalogue_has_single_default() {
    let settings = Settings::default();

    let defaults: Vec<&ModelInfo> = settings.models.iter().filter(|m| m.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, settings.default_model());
    assert!(settings.find_model("claude-3-haiku-20240307").is_some());
    assert!(settings.find_model("gpt-4o").is_none());
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.api.default_model = "claude-3-opus-20240229".to_string();
    settings.generation.temperature = 0.25;
    settings.generation.stop_sequences = vec!["###".to_string()];
    settings.files.max_file_size = 1024;

    settings.save_to(&config_path).unwrap();
    let loaded = Settings::load_from(&config_path).unwrap();

    assert_eq!(loaded.api.default_model, "claude-3-opus-20240229");
    assert_eq!(loaded.generation, settings.generation);
    assert_eq!(loaded.files.max_file_size, 1024);
    assert_eq!(loaded.models, settings.models);
}

#[test]
fn test_settings_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[api]\nbase_url = \"http://localhost:8080/api\"\n\n[generation]\nwindow_size = 4\n",
    )
    .unwrap();

    let loaded = Settings::load_from(&config_path).unwrap();

    assert_eq!(loaded.api.base_url, "http://localhost:8080/api");
    assert_eq!(loaded.api.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(loaded.generation.window_size, 4);
    assert_eq!(loaded.generation.max_tokens, 4000);
    assert_eq!(loaded.models.len(), 5);
}

#[test]
fn test_settings_load_from_reports_parse_errors() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[api\nbroken").unwrap();

    let err = Settings::load_from(&config_path).unwrap_err();
    assert!(matches!(err, ChatError::Config(_)));
}

#[test]
fn test_settings_api_key_reads_from_env() {
    std::env::set_var("TEST_API_KEY_CHATRELAY", "test-key-12345");

    let mut settings = Settings::default();
    settings.api.api_key_env = "TEST_API_KEY_CHATRELAY".to_string();

    assert_eq!(settings.api_key(), Some("test-key-12345".to_string()));
    assert!(settings.build_client().is_ok());

    std::env::remove_var("TEST_API_KEY_CHATRELAY");
}

#[test]
fn test_settings_build_client_without_key_fails() {
    let mut settings = Settings::default();
    settings.api.api_key_env = "NONEXISTENT_KEY_CHATRELAY_TEST".to_string();

    assert!(settings.api_key().is_none());
    assert!(matches!(settings.build_client(), Err(ChatError::Config(_))));
}

#[test]
fn test_settings_check_login() {
    let mut settings = Settings::default();
    assert!(settings.check_login("anyone", "anything"));

    settings.auth = AuthSettings {
        username: Some("admin".to_string()),
        password: Some("s3cret".to_string()),
    };
    assert!(settings.check_login("admin", "s3cret"));
    assert!(!settings.check_login("admin", "wrong"));
    assert!(!settings.check_login("guest", "s3cret"));
}

// ========================================================================
// GenerationConfig Tests
// ========================================================================

#[test]
fn test_generation_update_merges_only_present_fields() {
    let mut config = GenerationConfig::default();

    config.apply(GenerationConfigUpdate {
        top_p: Some(0.5),
        repetition_penalty: Some(1.3),
        ..Default::default()
    });

    assert_eq!(config.top_p, 0.5);
    assert_eq!(config.repetition_penalty, Some(1.3));
    assert_eq!(config.temperature, 0.7);
    assert_eq!(config.max_tokens, 4000);
}

#[test]
fn test_generation_update_parse_assignment() {
    let update = GenerationConfigUpdate::parse_assignment("temperature = 0.1").unwrap();
    assert_eq!(update.temperature, Some(0.1));

    let update = GenerationConfigUpdate::parse_assignment("stop_sequences=END, STOP").unwrap();
    assert_eq!(
        update.stop_sequences,
        Some(vec!["END".to_string(), "STOP".to_string()])
    );

    let update = GenerationConfigUpdate::parse_assignment("system=Answer in French.").unwrap();
    assert_eq!(update.system_prompt.as_deref(), Some("Answer in French."));

    assert!(GenerationConfigUpdate::parse_assignment("top_k=lots").is_err());
    assert!(GenerationConfigUpdate::parse_assignment("colour=blue").is_err());
    assert!(GenerationConfigUpdate::parse_assignment("temperature").is_err());
}

// ========================================================================
// ConversationStore Tests (conversation/mod.rs)
// ========================================================================

#[test]
fn test_create_twice_yields_distinct_ids_newest_first() {
    let mut store = ConversationStore::new();

    let first = store.create().id.clone();
    let second = store.create().id.clone();

    assert_ne!(first, second);
    assert_eq!(store.list()[0].id, second);
    assert_eq!(store.list()[1].id, first);
}

#[test]
fn test_create_titles_use_running_count() {
    let mut store = ConversationStore::new();

    store.create();
    store.create();
    let third = store.create();

    assert_eq!(third.title, "New Conversation 3");
    assert_eq!(store.list()[2].title, "New Conversation 1");
}

#[test]
fn test_title_counter_follows_current_count_after_delete() {
    let mut store = ConversationStore::new();
    let first = store.create().id.clone();
    store.create();
    store.delete(&first);

    assert_eq!(store.create().title, "New Conversation 2");
}

#[test]
fn test_many_ids_are_unique() {
    let mut store = ConversationStore::new();
    for _ in 0..500 {
        store.create();
    }

    let mut ids: Vec<&str> = store.list().iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 500);
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let mut store = ConversationStore::new();
    store.create();

    assert!(!store.delete("does-not-exist"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_rename_and_get() {
    let mut store = ConversationStore::new();
    let id = store.create().id.clone();

    assert!(store.rename(&id, "Trip planning"));
    assert_eq!(store.get(&id).unwrap().title, "Trip planning");

    assert!(!store.rename("missing", "nothing"));
    assert!(matches!(
        store.get("missing"),
        Err(ChatError::ConversationNotFound(_))
    ));
}

#[test]
fn test_push_message_and_clear() {
    let mut store = ConversationStore::new();
    let id = store.create().id.clone();

    store
        .push_message(&id, Message::user(vec![ContentPart::text("hi")]))
        .unwrap();
    store.push_message(&id, Message::assistant("hello")).unwrap();
    assert_eq!(store.get(&id).unwrap().messages.len(), 2);
    assert!(store.push_message("missing", Message::assistant("x")).is_err());

    store.clear();
    assert!(store.is_empty());
    assert!(!store.contains(&id));
}

// ========================================================================
// Wire format and transport (llm/)
// ========================================================================

#[test]
fn test_message_serializes_to_wire_form() {
    let message = Message::user(vec![
        ContentPart::text("what is this?"),
        ContentPart::image("image/jpeg", "/9j/4AAQ"),
    ]);

    let json = serde_json::to_value(&message).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "role": "user",
            "content": [
                { "type": "text", "text": "what is this?" },
                { "type": "image", "source": {
                    "type": "base64", "media_type": "image/jpeg", "data": "/9j/4AAQ"
                }}
            ]
        })
    );
}

#[test]
fn test_request_omits_unset_repetition_penalty() {
    let mut request = MessagesRequest {
        model: "m".to_string(),
        max_tokens: 10,
        temperature: 0.5,
        top_p: 0.9,
        top_k: 40,
        system: "s".to_string(),
        stop_sequences: Vec::new(),
        repetition_penalty: None,
        messages: vec![Message::assistant("x")],
    };

    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("repetition_penalty").is_none());
    assert_eq!(json["top_k"], 40);
    assert_eq!(json["stop_sequences"], serde_json::json!([]));

    request.repetition_penalty = Some(1.5);
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["repetition_penalty"], 1.5);
}

#[test]
fn test_claude_client_request_headers_and_url() {
    let client = ClaudeClient::new("sk-test").with_base_url("http://localhost:8080/api/");
    let request = MessagesRequest {
        model: "claude-3-haiku-20240307".to_string(),
        max_tokens: 16,
        temperature: 1.0,
        top_p: 1.0,
        top_k: 1,
        system: String::new(),
        stop_sequences: Vec::new(),
        repetition_penalty: None,
        messages: Vec::new(),
    };

    let built = client.request(&request).build().unwrap();

    assert_eq!(built.method(), reqwest::Method::POST);
    assert_eq!(built.url().as_str(), "http://localhost:8080/api/v1/messages");
    let headers = built.headers();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(headers["anthropic-dangerous-direct-browser-access"], "true");
}
