//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use time::Duration;

use crate::error::ErrorCode;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TOKEN_FILE: &str = ".dashboard/session.json";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Location of the durable token jar.
    pub token_file: PathBuf,
    /// Lifetime stamped on the stored credential at write time.
    pub token_ttl: Duration,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            token_ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_CONFIG_PARSE"
    }
}

impl ClientConfig {
    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `DASHBOARD_API_URL`: backend base URL (default `http://127.0.0.1:8080`)
    /// - `DASHBOARD_TOKEN_FILE`: token jar path (default `.dashboard/session.json`)
    /// - `DASHBOARD_TOKEN_TTL_DAYS`: default 7
    /// - `DASHBOARD_REQUEST_TIMEOUT_SECS`: default 30 (0 or unparsable means default)
    /// - `DASHBOARD_CONNECT_TIMEOUT_SECS`: default 10 (0 or unparsable means default)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-HTTP base URL or a TTL outside
    /// `1..=MAX_TOKEN_TTL_DAYS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_api_url(std::env::var("DASHBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()))?;
        let token_file =
            std::env::var("DASHBOARD_TOKEN_FILE").map_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);
        let token_ttl = parse_ttl_days(env_parse("DASHBOARD_TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS))?;
        let timeouts = Timeouts {
            request_secs: nonzero_or(
                env_parse("DASHBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            connect_secs: nonzero_or(
                env_parse("DASHBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        };

        Ok(Self { api_url, token_file, token_ttl, timeouts })
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// A zero timeout would fail every request immediately; treat it as unset.
fn nonzero_or(secs: u64, default: u64) -> u64 {
    if secs == 0 { default } else { secs }
}

/// Validate a backend base URL and strip any trailing slash.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] unless the URL is `http` or `https`.
pub fn parse_api_url(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Parse(format!("DASHBOARD_API_URL must be http(s): {raw}")));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn parse_ttl_days(days: i64) -> Result<Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        return Err(ConfigError::Parse(format!(
            "DASHBOARD_TOKEN_TTL_DAYS must be within 1..={MAX_TOKEN_TTL_DAYS}, got {days}"
        )));
    }
    Ok(Duration::days(days))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
