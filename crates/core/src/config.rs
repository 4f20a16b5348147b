//! Runtime configuration for the sync engine.

use std::time::Duration;

use crate::errors::{Error, Result};
use crate::sync::{ConflictPolicy, DEFAULT_POLL_INTERVAL_SECS};

/// Endpoint used when `QUOTESYNC_API_URL` is unset.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default timeout for remote requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "QUOTESYNC_API_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "QUOTESYNC_POLL_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "QUOTESYNC_REQUEST_TIMEOUT_SECS";
pub const ENV_CONFLICT_POLICY: &str = "QUOTESYNC_CONFLICT_POLICY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub remote_endpoint: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values fall back
    /// to defaults; malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = read(ENV_API_URL) {
            config.remote_endpoint = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = read(ENV_POLL_INTERVAL_SECS) {
            config.poll_interval =
                Duration::from_secs(parse_positive_secs(ENV_POLL_INTERVAL_SECS, &raw)?);
        }
        if let Some(raw) = read(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_positive_secs(ENV_REQUEST_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = read(ENV_CONFLICT_POLICY) {
            config.conflict_policy = raw.parse()?;
        }

        Ok(config)
    }
}

fn parse_positive_secs(key: &str, raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(0) => Err(Error::config(format!("{key} must be greater than zero"))),
        Ok(value) => Ok(value),
        Err(_) => Err(Error::config(format!(
            "{key} must be a whole number of seconds, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = SyncConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.remote_endpoint, DEFAULT_REMOTE_ENDPOINT);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.conflict_policy, ConflictPolicy::KeepLocal);
    }

    #[test]
    fn overrides_are_applied_and_url_is_trimmed() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, " http://localhost:8080/quotes/ "),
            (ENV_POLL_INTERVAL_SECS, "15"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
            (ENV_CONFLICT_POLICY, "prefer_remote"),
        ]))
        .expect("config");

        assert_eq!(config.remote_endpoint, "http://localhost:8080/quotes");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.conflict_policy, ConflictPolicy::PreferRemote);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = SyncConfig::from_lookup(lookup_from(&[(ENV_API_URL, "   ")])).expect("config");
        assert_eq!(config.remote_endpoint, DEFAULT_REMOTE_ENDPOINT);
    }

    #[test]
    fn zero_or_garbage_interval_is_rejected() {
        let err = SyncConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_SECS, "0")]))
            .expect_err("zero interval");
        assert_eq!(err.code(), "config_error");

        let err = SyncConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_SECS, "soon")]))
            .expect_err("non-numeric interval");
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn unknown_conflict_policy_is_rejected() {
        let err = SyncConfig::from_lookup(lookup_from(&[(ENV_CONFLICT_POLICY, "coin_flip")]))
            .expect_err("unknown policy");
        assert_eq!(err.code(), "config_error");
    }
}
