//! Model gateway for talking to a local language-model backend
//!
//! The gateway turns a conversation plus an optional system prompt into one
//! non-streaming HTTP call and hands back the assistant's text. It keeps no
//! history of its own: every call receives the full conversation.

use crate::observer::{ChatObserver, ChatSpan, notify};
use async_trait::async_trait;
use chrono::Utc;
use parley_common::constants::endpoints;
use parley_common::{Message, ParleyError, ProviderConfig, Result, join_url, truncate_string};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an error body quoted back in a failure message
const ERROR_BODY_PREVIEW: usize = 200;

/// A backend that can list its models and answer a conversation
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Model identifiers the backend offers; empty when unknown or unreachable
    async fn list_models(&self) -> Vec<String>;

    /// Send the conversation and return the assistant's reply text
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<String>;
}

/// Body of a chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl GatewayRequest {
    /// Build the outbound payload, placing a non-blank system prompt first
    pub fn new(model: &str, messages: &[Message], system_prompt: Option<&str>) -> Self {
        Self {
            model: model.to_string(),
            messages: outbound_messages(messages, system_prompt),
            stream: false,
        }
    }
}

/// Copy of `messages`, prefixed with a system message when a prompt is given
pub fn outbound_messages(messages: &[Message], system_prompt: Option<&str>) -> Vec<Message> {
    match system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
        Some(prompt) => std::iter::once(Message::system(prompt))
            .chain(messages.iter().cloned())
            .collect(),
        None => messages.to_vec(),
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String> {
        self.message
            .and_then(|message| message.content)
            .ok_or_else(|| ParleyError::Protocol("Response is missing message.content".to_string()))
    }
}

/// Gateway for an Ollama-compatible HTTP API
pub struct OllamaGateway {
    /// Base URL, e.g. `http://localhost:11434/api`
    base_url: String,

    /// Underlying HTTP client
    client: reqwest::Client,

    /// Optional span sink for finished chat calls
    observer: Option<Arc<dyn ChatObserver>>,
}

impl OllamaGateway {
    /// Create a gateway from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|e| ParleyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            observer: None,
        })
    }

    /// Attach an observer that receives a span for every chat call
    pub fn with_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_models(&self) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, endpoints::TAGS);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::Protocol(format!("{} returned HTTP {}", url, status)));
        }

        let tags: TagsResponse = response.json().await.map_err(body_error)?;
        Ok(tags.models.into_iter().map(|tag| tag.name).collect())
    }

    async fn send_chat(&self, request: &GatewayRequest) -> Result<String> {
        let url = join_url(&self.base_url, endpoints::CHAT);
        debug!(
            "Sending {} messages to {} using model {}",
            request.messages.len(),
            url,
            request.model
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ParleyError::Protocol(format!(
                "{} returned HTTP {}: {}",
                url,
                status,
                truncate_string(body.trim(), ERROR_BODY_PREVIEW)
            )));
        }

        let body: ChatResponse = response.json().await.map_err(body_error)?;
        body.into_content()
    }
}

fn transport_error(err: reqwest::Error) -> ParleyError {
    ParleyError::Transport(err.to_string())
}

/// Decode failures are the backend's fault; anything else happened on the wire
fn body_error(err: reqwest::Error) -> ParleyError {
    if err.is_decode() {
        ParleyError::Protocol(format!("Malformed response body: {}", err))
    } else {
        ParleyError::Transport(err.to_string())
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn list_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(models) => {
                debug!("Backend reports {} models", models.len());
                models
            }
            Err(e) => {
                warn!("Error fetching models: {}", e);
                Vec::new()
            }
        }
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<String> {
        let request = GatewayRequest::new(model, messages, system_prompt);
        let started_at = Utc::now();
        let result = self.send_chat(&request).await;
        let finished_at = Utc::now();

        match &result {
            Ok(content) => debug!(
                "Model {} replied with {} chars",
                model,
                content.chars().count()
            ),
            Err(e) => warn!("Error generating response: {}", e),
        }

        if let Some(observer) = &self.observer {
            let outcome = result.as_deref().map_err(|e| e.to_string());
            let span = ChatSpan::new(model, &request.messages, outcome, started_at, finished_at);
            notify(observer.as_ref(), &span);
        }

        result
    }
}
