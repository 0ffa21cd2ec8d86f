//! Ayurveda chatbot, dosha analyzer and tips.
//!
//! Replies come from a language model when one is configured. Otherwise,
//! or when the model fails, a keyword-matched canned reply is used. Every
//! reply carries a slok chosen by keyword.

pub mod dosha;
pub mod knowledge;
pub mod openai;
pub mod tips;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use dosha::{Dosha, DoshaScores};
pub use knowledge::{Language, Slok};
pub use openai::OpenAiClient;

/// Turns of history forwarded to the model.
const HISTORY_TURNS: usize = 4;

/// Errors from the chat layer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("Answers are required")]
    EmptyAnswers,

    #[error("chat provider error: {0}")]
    Provider(String),

    #[error("chat provider returned no content")]
    EmptyCompletion,
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A prior turn as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// A chat completion provider.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Complete a conversation and return the assistant's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;

    /// Model name reported back to clients.
    fn model(&self) -> &str;
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    #[serde(rename = "openai")]
    OpenAi,
    Fallback,
}

/// A chatbot reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
    pub language: Language,
    pub source: ReplySource,
    pub slok: &'static str,
    pub model: Option<String>,
}

/// Result of the dosha questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoshaAnalysis {
    pub scores: DoshaScores,
    pub primary_dosha: Dosha,
    pub recommendations: [&'static str; 4],
    pub slok: &'static str,
    pub slok_meaning: &'static str,
}

/// Chat service over an optional completion provider.
pub struct ChatService<'a> {
    provider: Option<&'a dyn ChatCompletion>,
}

impl<'a> ChatService<'a> {
    #[must_use]
    pub const fn new(provider: Option<&'a dyn ChatCompletion>) -> Self {
        Self { provider }
    }

    /// Answer a message.
    ///
    /// Provider failures are logged and answered with a canned reply.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` if the message is blank.
    pub async fn reply(
        &self,
        message: &str,
        language: Language,
        history: &[HistoryTurn],
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let slok = knowledge::relevant_slok(message).text(language);

        if let Some(provider) = self.provider {
            let messages = build_messages(message, language, history);
            match provider.complete(&messages).await {
                Ok(text) => {
                    return Ok(ChatReply {
                        message: text,
                        language,
                        source: ReplySource::OpenAi,
                        slok,
                        model: Some(provider.model().to_string()),
                    });
                }
                Err(e) => warn!(error = %e, "Chat provider failed, using fallback reply"),
            }
        } else {
            info!("No chat provider configured, using fallback reply");
        }

        Ok(ChatReply {
            message: knowledge::fallback_reply(knowledge::classify(message), language).to_string(),
            language,
            source: ReplySource::Fallback,
            slok,
            model: None,
        })
    }
}

/// Score questionnaire answers.
///
/// # Errors
///
/// Returns `ChatError::EmptyAnswers` if there are no answers.
pub fn analyze_dosha(
    answers: &BTreeMap<String, f64>,
    language: Language,
) -> Result<DoshaAnalysis, ChatError> {
    if answers.is_empty() {
        return Err(ChatError::EmptyAnswers);
    }

    let scores = dosha::score(answers);
    let primary = scores.primary();

    Ok(DoshaAnalysis {
        scores,
        primary_dosha: primary,
        recommendations: primary.recommendations(language),
        slok: knowledge::DOSHA_SLOK.text(language),
        slok_meaning: knowledge::DOSHA_SLOK.meaning(language),
    })
}

/// System prompt, the last few history turns, then the user's message.
///
/// History turns may only speak as user or assistant.
fn build_messages(message: &str, language: Language, history: &[HistoryTurn]) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage::new(Role::System, knowledge::system_prompt(language)));
    messages.extend(
        recent
            .iter()
            .filter(|turn| !turn.content.trim().is_empty())
            .map(|turn| {
                let role = if turn.role.eq_ignore_ascii_case("assistant") {
                    Role::Assistant
                } else {
                    Role::User
                };
                ChatMessage::new(role, turn.content.as_str())
            }),
    );
    messages.push(ChatMessage::new(Role::User, message));
    messages
}
