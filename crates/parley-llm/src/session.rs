//! Chat session state
//!
//! The session owns the conversation history, the selected model and the
//! system prompt. Gateway and segmenter stay stateless; each turn borrows the
//! session mutably for its duration.

use crate::gateway::ModelGateway;
use crate::segmenter::{SegmentedResponse, segment};
use parley_common::{Conversation, Message, ParleyError, Result};
use tracing::{debug, warn};

/// Outcome of one successful turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// Reply exactly as the backend produced it
    pub raw: String,
    /// Reply split into thinking and main content
    pub segmented: SegmentedResponse,
}

/// One user's conversation with one backend
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: Conversation,
    model: String,
    system_prompt: Option<String>,
}

impl ChatSession {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            model: model.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.set_system_prompt(prompt);
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Replace the system prompt; blank text clears it
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
    }

    /// Forget the conversation, keeping model and system prompt
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send `prompt` as the next user message.
    ///
    /// The user message stays in history whether or not the call succeeds, so a
    /// failed turn can be retried by sending again. An empty reply is a failure.
    /// On success the raw reply is appended as the assistant message.
    pub async fn send<G>(&mut self, gateway: &G, prompt: impl Into<String>) -> Result<ChatTurn>
    where
        G: ModelGateway + ?Sized,
    {
        self.history.push(Message::user(prompt));
        debug!(
            "Sending turn {} to model {}",
            self.history.len(),
            self.model
        );

        let raw = gateway
            .chat(&self.model, &self.history, self.system_prompt.as_deref())
            .await
            .inspect_err(|e| warn!("Turn failed, keeping user message: {}", e))?;

        // An empty reply counts as no reply at all
        if raw.is_empty() {
            warn!("Model {} returned an empty reply, keeping user message", self.model);
            return Err(ParleyError::Protocol("Backend returned an empty response".to_string()));
        }

        self.history.push(Message::assistant(raw.clone()));
        let segmented = segment(&raw);
        Ok(ChatTurn { raw, segmented })
    }
}

/// Pick the model to use given what the backend reports.
///
/// A preferred model wins when the backend lists it or lists nothing at all;
/// otherwise the first listed model is used, then `fallback`.
pub fn resolve_model(available: &[String], preferred: Option<&str>, fallback: &str) -> String {
    match preferred {
        Some(model) if available.is_empty() || available.iter().any(|m| m == model) => {
            model.to_string()
        }
        Some(model) => {
            warn!("Model {} is not offered by the backend", model);
            available[0].clone()
        }
        None => available
            .first()
            .cloned()
            .unwrap_or_else(|| fallback.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_common::Role;
    use std::sync::Mutex;

    /// Gateway that replays canned replies and records what it was sent
    struct ScriptedGateway {
        replies: Mutex<Vec<Result<String>>>,
        calls: Mutex<Vec<(String, Vec<Message>, Option<String>)>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn list_models(&self) -> Vec<String> {
            Vec::new()
        }

        async fn chat(
            &self,
            model: &str,
            messages: &[Message],
            system_prompt: Option<&str>,
        ) -> Result<String> {
            self.calls.lock().unwrap().push((
                model.to_string(),
                messages.to_vec(),
                system_prompt.map(str::to_string),
            ));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ParleyError::Generic("no scripted reply".to_string())))
        }
    }

    #[tokio::test]
    async fn test_successful_turn_appends_both_messages() {
        let gateway = ScriptedGateway::new(vec![Ok("<think>greet</think>Hello!".to_string())]);
        let mut session = ChatSession::new("llama2");

        let turn = session.send(&gateway, "Hi").await.unwrap();

        assert_eq!(turn.raw, "<think>greet</think>Hello!");
        assert_eq!(turn.segmented.thinking, vec!["greet".to_string()]);
        assert_eq!(turn.segmented.main, "Hello!");
        assert_eq!(
            session.history(),
            &[Message::user("Hi"), Message::assistant("<think>greet</think>Hello!")]
        );
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_message() {
        let gateway = ScriptedGateway::new(vec![
            Err(ParleyError::Transport("connection refused".to_string())),
            Ok("second try".to_string()),
        ]);
        let mut session = ChatSession::new("llama2");

        let err = session.send(&gateway, "Hi").await.unwrap_err();
        assert!(err.is_backend_failure());
        assert_eq!(session.history(), &[Message::user("Hi")]);

        session.send(&gateway, "Hi again").await.unwrap();
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_empty_reply_is_not_a_turn() {
        let gateway = ScriptedGateway::new(vec![Ok(String::new())]);
        let mut session = ChatSession::new("llama2");

        let err = session.send(&gateway, "Hi").await.unwrap_err();

        assert!(matches!(err, ParleyError::Protocol(_)));
        assert_eq!(session.history(), &[Message::user("Hi")]);
    }

    #[tokio::test]
    async fn test_system_prompt_is_passed_but_not_stored() {
        let gateway = ScriptedGateway::new(vec![Ok("ok".to_string())]);
        let mut session =
            ChatSession::new("qwen3:8b").with_system_prompt(Some("Be terse.".to_string()));

        session.send(&gateway, "Hi").await.unwrap();

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls[0].0, "qwen3:8b");
        assert_eq!(calls[0].1, vec![Message::user("Hi")]);
        assert_eq!(calls[0].2.as_deref(), Some("Be terse."));
        assert!(session.history().iter().all(|m| m.role != Role::System));
    }

    #[tokio::test]
    async fn test_full_history_sent_each_turn() {
        let gateway = ScriptedGateway::new(vec![Ok("a1".to_string()), Ok("a2".to_string())]);
        let mut session = ChatSession::new("llama2");

        session.send(&gateway, "q1").await.unwrap();
        session.send(&gateway, "q2").await.unwrap();

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(
            calls[1].1,
            vec![Message::user("q1"), Message::assistant("a1"), Message::user("q2")]
        );
    }

    #[tokio::test]
    async fn test_model_switch_applies_to_next_turn() {
        let gateway = ScriptedGateway::new(vec![Ok("x".to_string())]);
        let mut session = ChatSession::new("llama2");
        session.set_model("mistral");

        session.send(&gateway, "Hi").await.unwrap();
        assert_eq!(gateway.calls.lock().unwrap()[0].0, "mistral");
    }

    #[test]
    fn test_clear_keeps_settings() {
        let mut session = ChatSession::new("llama2").with_system_prompt(Some("sys".to_string()));
        session.history.push(Message::user("x"));
        session.clear();

        assert!(session.history().is_empty());
        assert_eq!(session.model(), "llama2");
        assert_eq!(session.system_prompt(), Some("sys"));
    }

    #[test]
    fn test_blank_system_prompt_clears() {
        let mut session = ChatSession::new("llama2").with_system_prompt(Some("sys".to_string()));
        session.set_system_prompt(Some("   ".to_string()));
        assert!(session.system_prompt().is_none());
    }

    #[test]
    fn test_resolve_model() {
        let available = vec!["llama2:latest".to_string(), "qwen3:8b".to_string()];

        assert_eq!(resolve_model(&available, Some("qwen3:8b"), "llama2"), "qwen3:8b");
        assert_eq!(resolve_model(&available, Some("missing"), "llama2"), "llama2:latest");
        assert_eq!(resolve_model(&available, None, "llama2"), "llama2:latest");
        assert_eq!(resolve_model(&[], Some("mistral"), "llama2"), "mistral");
        assert_eq!(resolve_model(&[], None, "llama2"), "llama2");
    }
}
