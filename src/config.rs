//! Provider configuration.
//!
//! Every setting can come from the provider block or, when the block leaves
//! it unset, from the environment.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::schema::{Attribute, Diagnostic, Schema};

/// Fallback for `api_key`.
pub const ENV_API_KEY: &str = "CHECKLY_API_KEY";
/// Fallback for `account_id`.
pub const ENV_ACCOUNT_ID: &str = "CHECKLY_ACCOUNT_ID";
/// Fallback for `api_url`.
pub const ENV_API_URL: &str = "CHECKLY_API_URL";
/// Bound for a single API call.
pub const ENV_TIMEOUT: &str = "API_CALL_TIMEOUT";

/// Errors in the provider configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key in the provider block or the environment.
    #[error("missing API key: set api_key in the provider block or CHECKLY_API_KEY")]
    MissingApiKey,

    /// A duration setting could not be parsed.
    #[error("invalid {name} '{value}': expected a duration like 30s, 2m or 1m30s")]
    InvalidDuration {
        /// The setting name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The API URL is not an http(s) URL.
    #[error("invalid api_url '{0}': expected an http(s) URL")]
    InvalidUrl(String),

    /// A provider attribute has the wrong type.
    #[error("attribute '{0}' must be a string")]
    NotAString(&'static str),
}

impl ConfigError {
    /// The provider attribute the error refers to, if any.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::MissingApiKey => Some("api_key"),
            Self::InvalidDuration { .. } => None,
            Self::InvalidUrl(_) => Some("api_url"),
            Self::NotAString(name) => Some(*name),
        }
    }
}

impl From<ConfigError> for Diagnostic {
    fn from(err: ConfigError) -> Self {
        let attribute = err.attribute();
        let diag = Diagnostic::error(err.to_string());
        match attribute {
            Some(name) => diag.with_attribute(name),
            None => diag,
        }
    }
}

/// Resolved provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API key sent as bearer token.
    pub api_key: String,
    /// Account the key acts on, sent as `X-Checkly-Account`.
    pub account_id: Option<String>,
    /// API base URL without trailing slash.
    pub api_url: String,
    /// Bound for a single API call.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// The schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Manage Checkly monitoring resources.")
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Checkly API key. Defaults to {}.", ENV_API_KEY)),
            )
            .with_attribute(
                "account_id",
                Attribute::optional_string()
                    .with_description(format!("Checkly account id. Defaults to {}.", ENV_ACCOUNT_ID)),
            )
            .with_attribute(
                "api_url",
                Attribute::optional_string().with_description(format!(
                    "API base URL. Defaults to {} or {}.",
                    ENV_API_URL, DEFAULT_API_URL
                )),
            )
    }

    /// Resolve settings from the provider block and the process environment.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        Self::from_sources(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings from the provider block, looking up unset values
    /// with `env`.
    pub fn from_sources<F>(config: &Value, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |name: &'static str, var: &str| -> Result<Option<String>, ConfigError> {
            let configured = match config.get(name) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => return Err(ConfigError::NotAString(name)),
            };
            Ok(configured
                .or_else(|| env(var))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()))
        };

        let api_key = setting("api_key", ENV_API_KEY)?.ok_or(ConfigError::MissingApiKey)?;
        let account_id = setting("account_id", ENV_ACCOUNT_ID)?;
        let api_url = setting("api_url", ENV_API_URL)?.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(api_url));
        }
        let timeout = match env(ENV_TIMEOUT).filter(|s| !s.trim().is_empty()) {
            None => DEFAULT_TIMEOUT,
            Some(value) => parse_duration(value.trim()).ok_or(ConfigError::InvalidDuration {
                name: ENV_TIMEOUT,
                value,
            })?,
        };

        Ok(Self {
            api_key,
            account_id,
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

/// Parse a duration such as `30s`, `2m`, `1m30s`, `500ms`, `1h` or a plain
/// number of seconds.
pub fn parse_duration(input: &str) -> Option<Duration> {
    if input.is_empty() {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .filter(|&end| end > 0)?;
        let amount: f64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "ns" => amount / 1e9,
            "us" | "µs" => amount / 1e6,
            "ms" => amount / 1e3,
            "s" => amount,
            "m" => amount * 60.0,
            "h" => amount * 3600.0,
            _ => return None,
        };
        total = total.checked_add(Duration::try_from_secs_f64(seconds).ok()?)?;
        rest = &rest[unit_len..];
    }
    Some(total)
}
