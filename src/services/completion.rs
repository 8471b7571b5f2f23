use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::ChatMessage,
};

/// Per-call sampling settings forwarded to the completion endpoint
///
/// Each prompt site uses its own settings: creative generation runs warmer
/// than query generation or ranking.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-completion service abstraction
///
/// The single seam between the orchestration logic and the language model.
/// Implementations return the full completion text synchronously (no
/// streaming); transport or model failures surface as errors and are never
/// retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate a completion for an ordered list of role-tagged messages
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> AppResult<String>;
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait::async_trait]
impl CompletionService for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::ExternalApi("Completion API returned no choices".to_string())
            })
    }
}
