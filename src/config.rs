use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::errors::{MeditrailError, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://meditrail.unitedwecare.com/api/v1";

/// End-to-end limit for a single upload, connection through response body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) const API_KEY_ENV: &str = "MEDITRAIL_API_KEY";
pub(crate) const BASE_URL_ENV: &str = "MEDITRAIL_BASE_URL";

/// The API key. Never printed: `Debug` shows a placeholder.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub(crate) fn parse(key: String) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(MeditrailError::Config {
                message: format!(
                    "API key is required. Pass it to ClientBuilder::api_key() \
                     or set the {API_KEY_ENV} environment variable."
                ),
            });
        }
        if HeaderValue::from_str(&key).is_err() {
            return Err(MeditrailError::Config {
                message: "API key contains characters that cannot be sent in an HTTP header".into(),
            });
        }
        Ok(Self(key))
    }

    /// The raw key, for the transport to put on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Immutable settings held by a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: ApiKey,
    base_url: String,
}

impl ClientConfig {
    pub(crate) fn new(api_key: ApiKey, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(MeditrailError::Config {
                message: "base URL must not be empty".into(),
            });
        }
        Ok(Self {
            api_key,
            base_url: base_url.to_string(),
        })
    }

    /// The key sent as `X-API-Key`. Redacted in `Debug` output.
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout. Always 60 seconds.
    pub fn timeout(&self) -> Duration {
        REQUEST_TIMEOUT
    }

    pub(crate) fn process_url(&self) -> String {
        format!("{}/ocr/process", self.base_url)
    }
}
