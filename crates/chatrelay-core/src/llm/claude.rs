use crate::constants::api;
use crate::error::ChatError;
use crate::llm::traits::*;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Messages API transport over reqwest.
pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: api::BASE_URL.to_string(),
        }
    }

    /// Point at a different host, or at a reverse-proxy prefix such as
    /// `http://localhost:8080/api`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            api::MESSAGES_PATH
        )
    }

    /// The fully-headed POST for `request`, not yet sent.
    pub fn request(&self, request: &MessagesRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .header(api::API_KEY_HEADER, &self.api_key)
            .header(api::VERSION_HEADER, api::VERSION)
            .header(api::DIRECT_ACCESS_HEADER, "true")
            .json(request)
    }
}

#[async_trait::async_trait]
impl MessagesTransport for ClaudeClient {
    async fn post(&self, request: &MessagesRequest) -> Result<RawResponse, ChatError> {
        debug!(
            "POST {} model={} turns={}",
            self.endpoint(),
            request.model,
            request.messages.len()
        );

        let response = self.request(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
