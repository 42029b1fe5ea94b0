use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub model_id: String,
    /// Embedding model for the Chroma vector store
    pub embedding_model: String,
    /// JSON file of prompt template records
    pub templates_path: Option<String>,
    /// Root directory of the filesystem blob store
    pub blob_root: String,
    /// Chroma server; in-memory vector store when unset
    pub chroma_url: Option<String>,
    pub max_concurrent_profiles: usize,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            llm_base_url: env::var("LLM_BASE_URL").context("LLM_BASE_URL must be set")?,
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            model_id: env::var("MODEL_ID").context("MODEL_ID must be set")?,
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            templates_path: env::var("TEMPLATES_PATH").ok(),
            blob_root: env::var("BLOB_ROOT").unwrap_or_else(|_| "./data/blobs".to_string()),
            chroma_url: env::var("CHROMA_URL").ok().filter(|u| !u.is_empty()),
            max_concurrent_profiles: env::var("MAX_CONCURRENT_PROFILES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("MAX_CONCURRENT_PROFILES must be a valid number")?,
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
        })
    }
}

/// Comma-separated origins; empty means any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
