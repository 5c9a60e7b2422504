//! Run configuration, built once at startup and passed down explicitly.

use std::fmt;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4-with-ocr";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_STEPS: usize = 25;

/// An API key that prints as `ApiKey(***)`.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier. Also selects the prompt template.
    pub model: String,
    pub api_key: ApiKey,
    /// Base of an OpenAI-compatible API, without the trailing `/chat/completions`.
    pub api_base_url: String,
    /// Model round-trips before giving up on the objective.
    pub max_steps: usize,
    pub verbose: bool,
    /// Record input events instead of sending them to the OS.
    pub dry_run: bool,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// `OPENAI_API_KEY` is required. `OPENAI_BASE_URL`, `OPERATE_MODEL` and
    /// `OPERATE_MAX_STEPS` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;
        let max_steps = match get("OPERATE_MAX_STEPS") {
            None => DEFAULT_MAX_STEPS,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "OPERATE_MAX_STEPS",
                    value: raw,
                })?,
        };

        Ok(Self {
            model: get("OPERATE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: ApiKey::new(api_key),
            api_base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            max_steps,
            verbose: false,
            dry_run: false,
        })
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }
}
