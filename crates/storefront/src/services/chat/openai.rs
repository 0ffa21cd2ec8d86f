//! `OpenAI` chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ChatCompletion, ChatError, ChatMessage};
use crate::config::OpenAiConfig;

/// Chat completions endpoint.
const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 500;
const TOP_P: f32 = 0.95;

/// `OpenAI` API client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    model: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &OpenAiConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|e| ChatError::Provider(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(8))
            .build()
            .map_err(|e| ChatError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            url: COMPLETIONS_URL.to_string(),
        })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    #[instrument(skip(self, messages), fields(model = %self.model, turns = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let body = CompletionBody {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!("{status}: {message}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Provider(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ChatError::EmptyCompletion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chat::Role;

    #[test]
    fn test_body_shape() {
        let messages = [
            ChatMessage::new(Role::System, "be kind"),
            ChatMessage::new(Role::User, "namaste"),
        ];
        let body = CompletionBody {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "namaste");
    }

    #[test]
    fn test_parse_response() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Drink warm water. "}}]}"#,
        )
        .unwrap_or(CompletionResponse { choices: vec![] });
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("  Drink warm water. "));
    }
}
