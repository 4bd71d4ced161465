use std::time::Duration;

use crate::api::retry::RetryPolicy;
use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "MEGAVERSE_API_KEY";
pub const BASE_URL_VAR: &str = "MEGAVERSE_API_BASE_URL";
pub const CANDIDATE_ID_VAR: &str = "MEGAVERSE_CANDIDATE_ID";
pub const MAX_RETRIES_VAR: &str = "MEGAVERSE_MAX_RETRIES";
pub const INITIAL_BACKOFF_VAR: &str = "MEGAVERSE_INITIAL_BACKOFF_MS";

/// Connection settings for the megaverse service.
///
/// The API key authenticates requests; the candidate id is sent in bodies and
/// paths. They are configured separately even though they are often equal.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub candidate_id: String,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        candidate_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            candidate_id: candidate_id.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("could not load .env file: {e}");
            }
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let base_url = non_empty(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let candidate_id = match non_empty(CANDIDATE_ID_VAR) {
            Some(id) => id,
            None => {
                log::warn!("{CANDIDATE_ID_VAR} not set, using the API key as candidate id");
                api_key.clone()
            }
        };

        let mut retry = RetryPolicy::default();
        if let Some(raw) = non_empty(MAX_RETRIES_VAR) {
            retry.max_retries = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: MAX_RETRIES_VAR,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = non_empty(INITIAL_BACKOFF_VAR) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: INITIAL_BACKOFF_VAR,
                value: raw.clone(),
            })?;
            retry.initial_backoff = Duration::from_millis(ms);
        }

        Ok(Self::new(base_url, api_key, candidate_id).with_retry(retry))
    }
}
