mod client;
pub(crate) mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::{ChatModel, Message};
use client::GroqClient;
use types::{ChatRequest, WireMessage};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

// =============================================================================
// Groq Model
// =============================================================================

/// Chat model served from Groq's OpenAI-compatible endpoint. Any other
/// OpenAI-compatible server works via [`Groq::with_base_url`].
#[derive(Clone)]
pub struct Groq {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    http: reqwest::Client,
}

impl Groq {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GROQ_API_URL.to_string(),
            temperature: 0.0,
            max_tokens: 4096,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GroqClient {
        GroqClient::new(self.http.clone(), &self.api_key, &self.base_url)
    }

    /// Send a full conversation and return the first choice's text.
    pub async fn chat(&self, messages: &[Message]) -> Result<String, AiError> {
        let request = messages.iter().fold(
            ChatRequest::new(&self.model)
                .temperature(self.temperature)
                .max_tokens(self.max_tokens),
            |req, m| req.message(WireMessage::from(m)),
        );

        self.client()
            .chat(&request)
            .await?
            .text()
            .ok_or(AiError::EmptyResponse)
    }
}

#[async_trait]
impl ChatModel for Groq {
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        Ok(self
            .chat(&[Message::system(system), Message::user(user)])
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_new() {
        let ai = Groq::new("gsk-test", "llama3-70b-8192");
        assert_eq!(ai.model(), "llama3-70b-8192");
        assert_eq!(ai.base_url, GROQ_API_URL);
        assert_eq!(ai.temperature, 0.0);
    }

    #[test]
    fn test_groq_with_base_url() {
        let ai = Groq::new("gsk-test", "m").with_base_url("http://localhost:8080/v1/");
        assert_eq!(ai.client().base_url_for_test(), "http://localhost:8080/v1");
    }

    #[test]
    fn request_serializes_openai_shape() {
        let request = ChatRequest::new("m")
            .temperature(0.0)
            .message(WireMessage::from(&Message::system("sys")))
            .message(WireMessage::from(&Message::user("hi")));
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(v["model"], "m");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert!(v.get("max_tokens").is_none());
    }

    #[test]
    fn response_text_takes_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#;
        let resp: types::ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text().as_deref(), Some("{}"));

        let empty: types::ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }
}
