//! Model completion provider.
//!
//! [`ModelClient`] is the narrow seam the draft generator talks through:
//! ordered role-tagged messages in, one text completion out. The production
//! implementation drives an OpenAI-compatible endpoint through Rig with a
//! fixed seed, fixed temperature and a single requested choice.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{Chat, Message};
use rig::providers::openai;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::errors::SessionError;

/// Author of one message in a rendered conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Single-completion model interface.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete the conversation. The last message is the pending request.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SessionError>;
}

/// Rig-backed client for OpenAI-compatible chat completion endpoints.
pub struct RigModelClient {
    client: openai::CompletionsClient,
    config: ModelConfig,
}

impl RigModelClient {
    pub fn new(config: ModelConfig) -> Result<Self, SessionError> {
        let api_key = if config.api_key.is_empty() {
            "not-needed"
        } else {
            config.api_key.as_str()
        };
        let client = openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(&config.base_url)
            .build()
            .map_err(|e| {
                SessionError::Configuration(format!("failed to build model client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// Split a rendered conversation into (preamble, history, prompt).
    fn split(messages: &[ChatMessage]) -> Result<(String, Vec<Message>, String), SessionError> {
        let (last, rest) = messages
            .split_last()
            .ok_or_else(|| SessionError::Inference("empty conversation".to_string()))?;
        if last.role != ChatRole::User {
            return Err(SessionError::Inference(
                "conversation must end with a user message".to_string(),
            ));
        }

        let mut preamble = String::new();
        let mut history = Vec::with_capacity(rest.len());
        for message in rest {
            match message.role {
                ChatRole::System => preamble.push_str(&message.content),
                ChatRole::User => history.push(Message::user(message.content.clone())),
                ChatRole::Assistant => history.push(Message::assistant(message.content.clone())),
            }
        }
        Ok((preamble, history, last.content.clone()))
    }
}

#[async_trait]
impl ModelClient for RigModelClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SessionError> {
        let (preamble, history, prompt) = Self::split(messages)?;

        let agent = self
            .client
            .agent(&self.config.model)
            .preamble(&preamble)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .additional_params(serde_json::json!({
                "seed": self.config.seed,
                "n": 1,
            }))
            .build();

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "requesting completion"
        );

        match tokio::time::timeout(self.config.timeout(), agent.chat(&prompt, history)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(SessionError::Inference(e.to_string())),
            Err(_) => Err(SessionError::Timeout(self.config.timeout_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_separates_preamble_history_and_prompt() {
        let messages = vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("draft"),
            ChatMessage::assistant("code v1"),
            ChatMessage::user("fix it"),
        ];
        let (preamble, history, prompt) = RigModelClient::split(&messages).unwrap();
        assert_eq!(preamble, "be helpful");
        assert_eq!(history.len(), 2);
        assert_eq!(prompt, "fix it");
    }

    #[test]
    fn split_rejects_empty_and_assistant_last() {
        assert!(RigModelClient::split(&[]).is_err());
        let messages = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];
        assert!(RigModelClient::split(&messages).is_err());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }
}
