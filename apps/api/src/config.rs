use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// `GEMINI_API_KEY` is the only credential source. The server starts without
/// it so the catalog and saved snapshots stay reachable; model calls then fail
/// with a service error.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub snapshot_dir: PathBuf,
    pub redis_url: Option<String>,
    pub include_skip_analysis: bool,
    /// Sessions untouched for this long are dropped from memory.
    pub session_idle_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| crate::llm_client::DEFAULT_MODEL.to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| crate::llm_client::GEMINI_API_BASE_URL.to_string()),
            snapshot_dir: optional_env("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/snapshots")),
            redis_url: optional_env("REDIS_URL"),
            include_skip_analysis: optional_env("INCLUDE_SKIP_ANALYSIS")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("INCLUDE_SKIP_ANALYSIS must be true or false")?
                .unwrap_or(true),
            session_idle_timeout: Duration::from_secs(
                optional_env("SESSION_IDLE_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("SESSION_IDLE_SECS must be a whole number of seconds")?
                    .unwrap_or(3600),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads an env var, treating empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(!parse_flag("No").unwrap());
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
    }
}
