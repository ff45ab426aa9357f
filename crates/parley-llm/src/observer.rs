//! Chat call observation
//!
//! A gateway can carry a [`ChatObserver`] that receives one [`ChatSpan`] per chat
//! call, after the call has finished. Observers are write-only: whatever they do
//! (and however they fail) has no effect on the chat result.

use chrono::{DateTime, Utc};
use parley_common::constants::{invocation, providers};
use parley_common::{Message, Role, approximate_word_count};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sampling parameters reported alongside each call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvocationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for InvocationParams {
    fn default() -> Self {
        Self {
            temperature: invocation::DEFAULT_TEMPERATURE,
            top_p: invocation::DEFAULT_TOP_P,
            max_tokens: invocation::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Final status of an observed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    Ok,
    Error(String),
}

impl SpanStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SpanStatus::Ok)
    }
}

/// Everything known about one chat call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSpan {
    pub span_id: String,
    pub kind: String,
    pub model: String,
    pub provider: String,
    pub params: InvocationParams,
    /// Messages exactly as transmitted, system prompt included
    pub input_messages: Vec<Message>,
    /// Produced content; `None` when the call failed
    pub output: Option<String>,
    /// Whitespace word count of the output
    pub completion_length: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: SpanStatus,
}

impl ChatSpan {
    /// Build a span from the transmitted messages and the call outcome
    pub fn new(
        model: &str,
        input_messages: &[Message],
        outcome: std::result::Result<&str, String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let (output, status) = match outcome {
            Ok(content) => (Some(content.to_string()), SpanStatus::Ok),
            Err(message) => (None, SpanStatus::Error(message)),
        };

        Self {
            span_id: Uuid::new_v4().to_string(),
            kind: "LLM".to_string(),
            model: model.to_string(),
            provider: providers::OLLAMA.to_string(),
            params: InvocationParams::default(),
            input_messages: input_messages.to_vec(),
            completion_length: output.as_deref().map(approximate_word_count).unwrap_or(0),
            output,
            started_at,
            finished_at,
            status,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Flattened OpenInference-style attributes, in a stable order
    pub fn attributes(&self) -> Vec<(String, Value)> {
        let mut attrs = vec![
            ("openinference.span.kind".to_string(), json!(self.kind)),
            ("llm.model_name".to_string(), json!(self.model)),
            ("llm.provider".to_string(), json!(self.provider)),
            (
                "llm.invocation_parameters".to_string(),
                json!(serde_json::to_string(&self.params).unwrap_or_default()),
            ),
        ];

        for (i, message) in self.input_messages.iter().enumerate() {
            attrs.push((
                format!("llm.input_messages.{}.message.role", i),
                json!(message.role.to_string()),
            ));
            attrs.push((
                format!("llm.input_messages.{}.message.content", i),
                json!(message.content),
            ));
        }

        if let Some(output) = &self.output {
            attrs.push(("output.value".to_string(), json!(output)));
            attrs.push((
                "llm.output_messages.0.message.role".to_string(),
                json!(Role::Assistant.to_string()),
            ));
            attrs.push((
                "llm.output_messages.0.message.content".to_string(),
                json!(output),
            ));
        }

        attrs.push((
            "llm.token_count.completion".to_string(),
            json!(self.completion_length),
        ));
        attrs
    }
}

/// Receives spans for finished chat calls
pub trait ChatObserver: Send + Sync {
    fn record(&self, span: &ChatSpan) -> anyhow::Result<()>;
}

/// Emits spans as structured `tracing` events under the `parley::trace` target
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl ChatObserver for TracingObserver {
    fn record(&self, span: &ChatSpan) -> anyhow::Result<()> {
        match &span.status {
            SpanStatus::Ok => info!(
                target: "parley::trace",
                span_id = %span.span_id,
                kind = %span.kind,
                model = %span.model,
                provider = %span.provider,
                input_messages = span.input_messages.len(),
                completion_length = span.completion_length,
                duration_ms = span.duration_ms(),
                "chat span ok"
            ),
            SpanStatus::Error(message) => warn!(
                target: "parley::trace",
                span_id = %span.span_id,
                kind = %span.kind,
                model = %span.model,
                provider = %span.provider,
                input_messages = span.input_messages.len(),
                duration_ms = span.duration_ms(),
                error = %message,
                "chat span error"
            ),
        }

        for (key, value) in span.attributes() {
            debug!(target: "parley::trace", span_id = %span.span_id, %key, %value);
        }
        Ok(())
    }
}

/// Hand a span to the observer, logging and discarding any failure
pub(crate) fn notify(observer: &dyn ChatObserver, span: &ChatSpan) {
    if let Err(e) = observer.record(span) {
        warn!("Chat observer failed for span {}: {}", span.span_id, e);
    }
}
