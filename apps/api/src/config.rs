use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
const DEFAULT_MISTRAL_MODEL: &str = "mistral-tiny";
/// Upload ceiling for a single CV: 5 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup only on values that are present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Missing key is not a startup error: extraction reports it per request.
    pub mistral_api_key: Option<String>,
    pub mistral_api_url: String,
    pub mistral_model: String,
    pub llm_timeout_secs: u64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            mistral_api_key: optional_env("MISTRAL_API_KEY"),
            mistral_api_url: optional_env("MISTRAL_API_URL")
                .unwrap_or_else(|| DEFAULT_MISTRAL_API_URL.to_string()),
            mistral_model: optional_env("MISTRAL_MODEL")
                .unwrap_or_else(|| DEFAULT_MISTRAL_MODEL.to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 5000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Returns the variable's value, treating unset and blank the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by in-process route tests.
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            mistral_api_key: None,
            mistral_api_url: DEFAULT_MISTRAL_API_URL.to_string(),
            mistral_model: DEFAULT_MISTRAL_MODEL.to_string(),
            llm_timeout_secs: 5,
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
