use ai_client::{json_object_window, truncate_to_char_boundary, ChatModel};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

/// Structured facts the model pulls out of one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Extraction {
    /// Factual claims made in the text, one sentence each.
    #[serde(default, deserialize_with = "null_as_default")]
    pub claims: Vec<String>,
    /// Named people, organizations, places, or products.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<String>,
    /// One-sentence summary of the text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    /// Short topical keywords.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Seam between the item pipeline and whatever produces [`Extraction`]s.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Extraction>;
}

/// LLM-backed extractor. Never fails: every problem with the model call or
/// its reply degrades to an empty [`Extraction`].
pub struct LlmExtractor<M> {
    model: M,
    system_prompt: String,
}

impl<M: ChatModel> LlmExtractor<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            system_prompt: build_system_prompt(),
        }
    }

    async fn try_extract(&self, text: &str) -> Result<Extraction> {
        let user = format!("Text to analyze: {text}");
        let reply = self.model.chat_completion(&self.system_prompt, &user).await?;

        let window = json_object_window(&reply).ok_or_else(|| {
            anyhow!(
                "no JSON object in model reply: {}",
                truncate_to_char_boundary(&reply, 200)
            )
        })?;
        Ok(serde_json::from_str(window)?)
    }
}

#[async_trait]
impl<M: ChatModel> FactExtractor for LlmExtractor<M> {
    async fn extract(&self, text: &str) -> Result<Extraction> {
        match self.try_extract(text).await {
            Ok(extraction) => {
                debug!(
                    claims = extraction.claims.len(),
                    entities = extraction.entities.len(),
                    keywords = extraction.keywords.len(),
                    "Extraction complete"
                );
                Ok(extraction)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    text = truncate_to_char_boundary(text, 80),
                    "Extraction failed, using empty result"
                );
                Ok(Extraction::default())
            }
        }
    }
}

fn build_system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(Extraction))
        .unwrap_or_default();
    format!(
        r#"You are an expert information extraction AI. Analyze the provided text and respond ONLY with a valid JSON object containing exactly these keys: "claims", "entities", "summary", "keywords".

The object must match this JSON schema:
{schema}

Example: {{"claims": ["Statement 1."], "entities": ["Entity A"], "summary": "A summary.", "keywords": ["keyword1"]}}"#
    )
}
