//! Assistant configuration
//!
//! Built once at startup (environment first, CLI flags on top) and shared
//! read-only by every pipeline stage.

use crate::error::{InsightError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "inventory_sales.db";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Which statement classes the executor lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementPolicy {
    /// Read-only connection; statements that would write are rejected.
    ReadOnly,
    /// Read-write connection; anything SQLite accepts is executed.
    AllowWrites,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub db_path: PathBuf,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub llm_timeout: Duration,
    pub db_timeout: Duration,
    pub statement_policy: StatementPolicy,
    pub patterns_file: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            llm_timeout: Duration::from_secs(30),
            db_timeout: Duration::from_secs(15),
            statement_policy: StatementPolicy::ReadOnly,
            patterns_file: None,
        }
    }
}

impl AssistantConfig {
    /// Read configuration from the process environment.
    ///
    /// Callers that want `.env` support load it beforehand with
    /// `dotenv::dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AssistantConfig::from_env`] but reads keys through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("INSIGHT_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        config.api_key = non_empty("GROQ_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        if let Some(model) = non_empty("INSIGHT_MODEL") {
            config.model = model;
        }
        if let Some(url) = non_empty("INSIGHT_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = non_empty("INSIGHT_LLM_TIMEOUT_SECS") {
            config.llm_timeout = Duration::from_secs(parse_secs("INSIGHT_LLM_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = non_empty("INSIGHT_DB_TIMEOUT_SECS") {
            config.db_timeout = Duration::from_secs(parse_secs("INSIGHT_DB_TIMEOUT_SECS", &secs)?);
        }
        if let Some(flag) = non_empty("INSIGHT_ALLOW_WRITES") {
            if parse_bool("INSIGHT_ALLOW_WRITES", &flag)? {
                config.statement_policy = StatementPolicy::AllowWrites;
            }
        }
        config.patterns_file = non_empty("INSIGHT_PATTERNS_FILE").map(PathBuf::from);

        Ok(config)
    }

    /// API key, or a configuration error naming the variables to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            InsightError::Config(
                "GROQ_API_KEY not found in environment variables (OPENAI_API_KEY is also accepted)"
                    .to_string(),
            )
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(InsightError::Config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, value
        ))),
        Ok(secs) => Ok(secs),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(InsightError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
