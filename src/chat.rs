use serde::{Deserialize, Serialize};

use crate::config::State;
use crate::error::{LogsaiError, Result};
use crate::openai::OpenAiEndpoint;

const SERVICE: &str = "chat";

/// Marks a chat failure that was turned into an answer.
pub const CHAT_ERROR_PREFIX: &str = "Error in processing your request: ";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

pub trait ChatProvider {
    fn try_complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Never fails: a remote error comes back as text starting with [`CHAT_ERROR_PREFIX`].
    fn complete(&self, messages: &[ChatMessage]) -> String {
        match self.try_complete(messages) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "chat completion failed, answering with the error");
                format!("{CHAT_ERROR_PREFIX}{err}")
            }
        }
    }
}

impl<T: ChatProvider + ?Sized> ChatProvider for &T {
    fn try_complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).try_complete(messages)
    }
}

impl<T: ChatProvider + ?Sized> ChatProvider for Box<T> {
    fn try_complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).try_complete(messages)
    }
}

pub struct OpenAiChatClient {
    endpoint: OpenAiEndpoint,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(endpoint: OpenAiEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn from_state(endpoint: OpenAiEndpoint, state: &State) -> Self {
        Self::new(endpoint, &state.chat_model)
    }
}

impl ChatProvider for OpenAiChatClient {
    fn try_complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };
        let response: ChatResponse = self
            .endpoint
            .post_json(SERVICE, "chat/completions", &request)?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LogsaiError::remote(SERVICE, "response contained no choices"))
    }
}
