use crate::config::Config;
use crate::i18n::Language;
use crate::retry::{retry_provider_call, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("OPENAI_API_KEY not set")]
    MissingApiKey,

    #[error("OpenAI API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to send translation request to OpenAI API: {0}")]
    Transport(String),

    #[error("Failed to parse OpenAI translation response: {0}")]
    MalformedResponse(String),

    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Retry 429 (rate limit), 5xx and network failures. A 200 reply the
    /// client cannot decode is final, as are other 4xx and configuration
    /// problems.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::MalformedResponse(_) | Self::MissingApiKey | Self::Timeout(_) => false,
        }
    }
}

/// Factory for translation clients.
///
/// `connect` runs once per synchronization, before any language is
/// processed; its failure aborts the whole synchronization.
pub trait TranslationProvider: Send + Sync + 'static {
    type Client: TranslationClient;

    fn connect(&self) -> Result<Self::Client, ProviderError>;
}

/// Translates the two personal info fields into one target language.
pub trait TranslationClient: Send + Sync {
    /// Returns the model's raw reply, which is expected (but not guaranteed)
    /// to be a JSON object with `name` and `short_info` keys.
    fn translate(
        &self,
        name: &str,
        short_info: &str,
        source: &Language,
        target: &Language,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Build the system prompt for translation
fn build_translation_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        r#"You are a professional translator. Translate the following text from {} into {}.

Do NOT add any labels like "Name:" or "Short Info:". Only return the raw translated content.
Keep proper names recognizable; transliterate them only when the target script requires it.

Return JSON strictly in this format, with no surrounding text:
{{"name": "translated name", "short_info": "translated short info"}}"#,
        source_language, target_language
    )
}

/// Build the user prompt for translation
fn build_translation_user_prompt(name: &str, short_info: &str) -> String {
    format!(
        "Text to translate:\nName = {}\nShort Info = {}",
        name, short_info
    )
}

/// OpenAI-backed translation provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
    retry: RetryPolicy,
    call_budget: Duration,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            api_url: config.openai_api_url.clone(),
            retry: RetryPolicy::standard(),
            call_budget: config.translation_timeout,
        }
    }

    /// Override the retry policy for provider calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl TranslationProvider for OpenAiProvider {
    type Client = OpenAiClient;

    fn connect(&self) -> Result<OpenAiClient, ProviderError> {
        let api_key = self.api_key.clone().ok_or(ProviderError::MissingApiKey)?;

        // reqwest::Client is reference counted, cloning shares the pool
        Ok(OpenAiClient {
            http: self.http.clone(),
            api_key,
            model: self.model.clone(),
            api_url: self.api_url.clone(),
            retry: self.retry,
            call_budget: self.call_budget,
        })
    }
}

/// A connected OpenAI client, valid for one synchronization.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
    retry: RetryPolicy,
    /// Time one `translate` may spend, backoffs included
    call_budget: Duration,
}

impl OpenAiClient {
    fn build_request(
        &self,
        name: &str,
        short_info: &str,
        source: &Language,
        target: &Language,
    ) -> TranslationRequest {
        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&self.model);

        TranslationRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_translation_system_prompt(source.name(), target.name()),
                },
                Message {
                    role: "user".to_string(),
                    content: build_translation_user_prompt(name, short_info),
                },
            ],
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }

    async fn send_once(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::Status { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response contained no choices".to_string())
            })
    }
}

impl TranslationClient for OpenAiClient {
    async fn translate(
        &self,
        name: &str,
        short_info: &str,
        source: &Language,
        target: &Language,
    ) -> Result<String, ProviderError> {
        let deadline = Instant::now() + self.call_budget;
        let request = self.build_request(name, short_info, source, target);

        retry_provider_call(
            &self.retry,
            deadline,
            &format!("Translation to {}", target.name()),
            || self.send_once(&request),
        )
        .await
    }
}
