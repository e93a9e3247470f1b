use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::FactGraphError;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama3-70b-8192";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_connect_attempts: u32,
    pub neo4j_retry_delay: Duration,

    // LLM (OpenAI-compatible, Groq by default)
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub llm_model: String,

    // Ingestion pacing
    pub batch_size: usize,
    pub batch_pause: Duration,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            neo4j_uri: required_env("NEO4J_URI")?,
            neo4j_user: required_env("NEO4J_USERNAME")?,
            neo4j_password: required_env("NEO4J_PASSWORD")?,
            neo4j_connect_attempts: parsed_env("NEO4J_CONNECT_ATTEMPTS", 5)?,
            neo4j_retry_delay: Duration::from_secs(parsed_env("NEO4J_RETRY_DELAY_SECS", 5)?),
            groq_api_key: required_env("GROQ_API_KEY")?,
            groq_base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            batch_size: parsed_env("INGEST_BATCH_SIZE", 3)?,
            batch_pause: Duration::from_millis(parsed_env("INGEST_BATCH_PAUSE_MS", 1000)?),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 5000)?,
        };

        config.log_redacted();
        Ok(config)
    }

    /// Log the loaded config with secrets reduced to short previews.
    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  NEO4J_URI: {}", self.neo4j_uri);
        tracing::info!("  NEO4J_USERNAME: {}", self.neo4j_user);
        tracing::info!("  NEO4J_PASSWORD: {}", preview(&self.neo4j_password));
        tracing::info!("  GROQ_API_KEY: {}", preview(&self.groq_api_key));
        tracing::info!("  GROQ_BASE_URL: {}", self.groq_base_url);
        tracing::info!("  LLM_MODEL: {}", self.llm_model);
        tracing::info!(
            "  ingest batch: {} items, {}ms pause",
            self.batch_size,
            self.batch_pause.as_millis()
        );
    }
}

fn preview(val: &str) -> String {
    let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.len())
}

fn required_env(key: &str) -> Result<String> {
    env::var(key)
        .map_err(|_| FactGraphError::Config(format!("{key} environment variable is required")).into())
}

fn parsed_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
