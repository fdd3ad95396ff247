use crate::error::ProviderError;
use crate::models::ChatMessage;
use crate::providers::{ChatProvider, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: Url,
    pub api_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            api_key: api_key.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Reads `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL` (optional)
    /// from the environment.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        let mut config = Self::new(api_key)?;
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            let base_url = base_url.trim();
            if !base_url.is_empty() {
                config.base_url = Url::parse(base_url)?;
            }
        }
        Ok(config)
    }
}

/// One reqwest client against an OpenAI-compatible API, serving both the
/// embedding and the chat-completion side of the pipeline.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
    embeddings_url: Url,
    chat_url: Url,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let embeddings_url = config.base_url.join("v1/embeddings")?;
        let chat_url = config.base_url.join("v1/chat/completions")?;

        Ok(Self {
            client,
            config,
            embeddings_url,
            chat_url,
        })
    }

    fn transport_error(endpoint: &Url, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ProviderError::Http(error)
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

fn first_embedding(
    response: EmbeddingResponse,
    endpoint: &str,
) -> Result<Vec<f32>, ProviderError> {
    let item = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse {
            endpoint: endpoint.to_string(),
            details: "response contained no embedding data".to_string(),
        })?;

    if item.embedding.is_empty() {
        return Err(ProviderError::MalformedResponse {
            endpoint: endpoint.to_string(),
            details: "embedding vector was empty".to_string(),
        });
    }

    Ok(item.embedding)
}

fn first_choice_content(
    response: ChatCompletionResponse,
    endpoint: &str,
) -> Result<String, ProviderError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty());

    content.ok_or_else(|| ProviderError::MalformedResponse {
        endpoint: endpoint.to_string(),
        details: "response contained no assistant message".to_string(),
    })
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let payload = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response = self
            .client
            .post(self.embeddings_url.clone())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| Self::transport_error(&self.embeddings_url, error))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                endpoint: self.embeddings_url.to_string(),
                status: response.status().to_string(),
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| Self::transport_error(&self.embeddings_url, error))?;

        first_embedding(parsed, self.embeddings_url.as_str())
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages,
        };

        let response = self
            .client
            .post(self.chat_url.clone())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| Self::transport_error(&self.chat_url, error))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                endpoint: self.chat_url.to_string(),
                status: response.status().to_string(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| Self::transport_error(&self.chat_url, error))?;

        first_choice_content(parsed, self.chat_url.as_str())
    }
}
