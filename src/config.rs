// src/config.rs
use anyhow::{Context, Result};
use log::{info, warn};
use std::env;
use std::time::Duration;

pub const DEFAULT_STORELEADS_BASE_URL: &str = "https://storeleads.app/json/api/v1/all/domain";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for the Store Leads domain lookup.
#[derive(Debug, Clone)]
pub struct StoreLeadsConfig {
    /// `None` means the source is not configured and lookups are skipped.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for StoreLeadsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_STORELEADS_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl StoreLeadsConfig {
    /// Reads `STORELEADS_API_KEY`, `STORELEADS_BASE_URL` and `STORELEADS_TIMEOUT_SECS`.
    /// Call `dotenv().ok()` first if settings live in a `.env` file.
    pub fn from_env() -> Result<Self> {
        let api_key = parse_api_key(env::var("STORELEADS_API_KEY").ok());
        if api_key.is_none() {
            warn!("STORELEADS_API_KEY not set, external store metrics are disabled");
        }

        let base_url = env::var("STORELEADS_BASE_URL").unwrap_or_else(|_| {
            info!("STORELEADS_BASE_URL not set, defaulting to {}", DEFAULT_STORELEADS_BASE_URL);
            DEFAULT_STORELEADS_BASE_URL.to_string()
        });

        let timeout = parse_timeout(env::var("STORELEADS_TIMEOUT_SECS").ok().as_deref())?;

        Ok(Self { api_key, base_url, timeout })
    }
}

fn parse_api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string()).filter(|key| !key.is_empty())
}

fn parse_timeout(raw: Option<&str>) -> Result<Duration> {
    let secs = match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("STORELEADS_TIMEOUT_SECS must be a whole number of seconds, got {:?}", value))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_counts_as_unconfigured() {
        assert_eq!(parse_api_key(None), None);
        assert_eq!(parse_api_key(Some("   ".to_string())), None);
        assert_eq!(parse_api_key(Some(" abc ".to_string())), Some("abc".to_string()));
    }

    #[test]
    fn timeout_defaults_and_parses() {
        assert_eq!(parse_timeout(None).unwrap(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(parse_timeout(Some(" 3 ")).unwrap(), Duration::from_secs(3));
        assert!(parse_timeout(Some("soon")).is_err());
    }
}
