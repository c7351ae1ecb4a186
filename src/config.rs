//! Client configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::client::DEFAULT_BASE_URL;
use crate::error::{EmotionError, EmotionResult};

const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;

/// Configuration for [`EmotionClient`](crate::EmotionClient).
///
/// Immutable once a client is constructed from it. An absent or empty API
/// key is representable; the credential check happens per call so that a
/// misconfigured client fails fast without touching the network.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// ParallelDots API key.
    pub api_key: Option<String>,

    /// Custom API base URL. Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,

    /// Language code sent with every request ("en", "es", ...).
    pub lang_code: String,

    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// PEM bundle of additional trusted roots for this client only.
    pub extra_ca_bundle: Option<PathBuf>,

    /// Path of the trust-on-first-use pin file. Setting this enables the
    /// pin bootstrap at construction time. See the crate docs for why this
    /// is a reduced-assurance trust model.
    pub first_contact_pin: Option<PathBuf>,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            lang_code: "en".to_owned(),
            request_timeout_ms: 60_000,
            extra_ca_bundle: None,
            first_contact_pin: None,
        }
    }
}

impl EmotionConfig {
    /// Configuration with `api_key` set and every other field at its default.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Parse configuration from a JSON value.
    ///
    /// # Errors
    /// Returns [`EmotionError::Config`] if the value does not deserialize.
    pub fn from_params(params: &serde_json::Value) -> EmotionResult<Self> {
        serde_json::from_value(params.clone()).map_err(|e| {
            EmotionError::Config(format!("invalid emotion client configuration: {e}"))
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`EmotionError::Config`] if the language code is empty, the
    /// timeout is out of range, or the base URL does not normalize.
    pub fn validate(&self) -> EmotionResult<()> {
        if self.lang_code.trim().is_empty() {
            return Err(EmotionError::Config("lang_code cannot be empty".into()));
        }

        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(EmotionError::Config(format!(
                "request timeout must be between 1ms and {MAX_REQUEST_TIMEOUT_MS}ms"
            )));
        }

        self.normalized_base_url().map(drop)
    }

    /// Base URL with scheme and host checked and any trailing slash removed.
    pub(crate) fn normalized_base_url(&self) -> EmotionResult<String> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmotionError::Config("base_url cannot be empty".into()));
        }

        let parsed = url::Url::parse(trimmed)
            .map_err(|e| EmotionError::Config(format!("invalid base_url: {e}")))?;

        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(EmotionError::Config("base_url must be http or https".into()));
        }

        if parsed.host_str().is_none() {
            return Err(EmotionError::Config("base_url must include a host".into()));
        }

        Ok(trimmed.trim_end_matches('/').to_owned())
    }

    /// Host and port the first-contact pin handshake connects to.
    pub(crate) fn pin_target(&self) -> EmotionResult<(String, u16)> {
        let base = self.normalized_base_url()?;
        let parsed = url::Url::parse(&base)
            .map_err(|e| EmotionError::Config(format!("invalid base_url: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| EmotionError::Config("base_url must include a host".into()))?
            .to_owned();
        let port = parsed.port_or_known_default().unwrap_or(443);
        Ok((host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_provider() {
        let config = EmotionConfig::default();
        assert_eq!(config.lang_code, "en");
        assert_eq!(config.request_timeout_ms, 60_000);
        assert_eq!(
            config.normalized_base_url().unwrap(),
            "https://apis.paralleldots.com/v5"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_params_applies_field_defaults() {
        let config = EmotionConfig::from_params(&json!({ "api_key": "abc123" })).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.lang_code, "en");
        assert!(config.first_contact_pin.is_none());
    }

    #[test]
    fn from_params_rejects_wrong_types() {
        let err = EmotionConfig::from_params(&json!({ "request_timeout_ms": "soon" })).unwrap_err();
        assert!(matches!(err, EmotionError::Config(_)));
    }

    #[test]
    fn empty_lang_code_is_invalid() {
        let mut config = EmotionConfig::with_api_key("abc123");
        config.lang_code = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let mut config = EmotionConfig::with_api_key("abc123");
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.request_timeout_ms = MAX_REQUEST_TIMEOUT_MS + 1;
        assert!(config.validate().is_err());

        config.request_timeout_ms = MAX_REQUEST_TIMEOUT_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_url_scheme_is_restricted() {
        let mut config = EmotionConfig::with_api_key("abc123");
        config.base_url = Some("ftp://apis.paralleldots.com/v5".into());
        assert!(config.validate().is_err());

        config.base_url = Some("not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let mut config = EmotionConfig::with_api_key("abc123");
        config.base_url = Some("https://apis.paralleldots.com/v5/".into());
        assert_eq!(
            config.normalized_base_url().unwrap(),
            "https://apis.paralleldots.com/v5"
        );
    }

    #[test]
    fn pin_target_uses_the_url_port() {
        let mut config = EmotionConfig::with_api_key("abc123");
        assert_eq!(
            config.pin_target().unwrap(),
            ("apis.paralleldots.com".to_owned(), 443)
        );

        config.base_url = Some("http://127.0.0.1:8080".into());
        assert_eq!(config.pin_target().unwrap(), ("127.0.0.1".to_owned(), 8080));
    }
}
