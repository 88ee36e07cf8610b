use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
/// Startup fails if the model API key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
    /// Total tries against the model service before giving up on overload.
    pub llm_max_attempts: u32,
    /// First backoff delay; doubles on every overload retry.
    pub llm_base_delay_ms: u64,
    /// Overall deadline for one analysis, backoff waits included.
    pub analyze_timeout_secs: u64,
    /// Also emit the result under `data` for clients of the older envelope.
    pub emit_legacy_data_field: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_api_base: optional_env("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            port: parse_env("PORT", 8787)?,
            rust_log: optional_env("RUST_LOG", "info"),
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 5)?,
            llm_base_delay_ms: parse_env("LLM_BASE_DELAY_MS", 1000)?,
            analyze_timeout_secs: parse_env("ANALYZE_TIMEOUT_SECS", 120)?,
            emit_legacy_data_field: parse_env("EMIT_LEGACY_DATA_FIELD", false)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Default config with a fake API key.
    pub fn for_tests() -> Self {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            port: 8787,
            rust_log: "info".to_string(),
            llm_max_attempts: 5,
            llm_base_delay_ms: 1000,
            analyze_timeout_secs: 120,
            emit_legacy_data_field: false,
        }
    }
}
