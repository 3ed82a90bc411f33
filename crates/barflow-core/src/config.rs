//! Environment configuration.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `POLYGON_API` | required | API key appended to every request |
//! | `POLYGON_BASE_URL` | `https://api.polygon.io` | API root |
//! | `BARFLOW_MAX_RETRIES` | `2` | Total fetch attempts per ticker |
//! | `BARFLOW_TIMEOUT_MS` | `10000` | Per-attempt request timeout |
//! | `BARFLOW_TICKER_DEADLINE_MS` | unset | Wall-clock budget per ticker |

use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::polygon::DEFAULT_BASE_URL;
use crate::retry::RetryConfig;

pub const API_KEY_VAR: &str = "POLYGON_API";
pub const BASE_URL_VAR: &str = "POLYGON_BASE_URL";
pub const MAX_RETRIES_VAR: &str = "BARFLOW_MAX_RETRIES";
pub const TIMEOUT_VAR: &str = "BARFLOW_TIMEOUT_MS";
pub const DEADLINE_VAR: &str = "BARFLOW_TICKER_DEADLINE_MS";

/// Settings resolved from the environment at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub ticker_deadline: Option<Duration>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("timeout_ms", &self.timeout_ms)
            .field("ticker_deadline", &self.ticker_deadline)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup`, which maps a variable name to its
    /// value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingApiKey { var: API_KEY_VAR })?;
        let base_url = get(BASE_URL_VAR).unwrap_or_else(|| String::from(DEFAULT_BASE_URL));
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: BASE_URL_VAR,
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        let max_retries = parse_var(MAX_RETRIES_VAR, get(MAX_RETRIES_VAR))?
            .unwrap_or(RetryConfig::default().max_attempts);
        if max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                var: MAX_RETRIES_VAR,
                reason: String::from("must be at least 1"),
            });
        }

        let timeout_ms = parse_var(TIMEOUT_VAR, get(TIMEOUT_VAR))?.unwrap_or(DEFAULT_TIMEOUT_MS);
        let ticker_deadline =
            parse_var::<u64>(DEADLINE_VAR, get(DEADLINE_VAR))?.map(Duration::from_millis);

        Ok(Self {
            api_key,
            base_url,
            max_retries,
            timeout_ms,
            ticker_deadline,
        })
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries).with_deadline(self.ticker_deadline)
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|error| ConfigError::InvalidValue {
                var,
                reason: format!("'{raw}': {error}"),
            })
        })
        .transpose()
}
