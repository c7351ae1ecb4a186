//! The ParallelDots emotion API client.

use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use reqwest::multipart::Form;
use tracing::{debug, info, instrument, warn};

use crate::config::EmotionConfig;
use crate::error::{EmotionError, EmotionResult};
use crate::trust;

/// Default ParallelDots API base URL.
pub const DEFAULT_BASE_URL: &str = "https://apis.paralleldots.com/v5";

/// Client for the ParallelDots `/emotion` endpoint.
///
/// Holds an immutable [`EmotionConfig`] and a pooled HTTP client. The client
/// is stateless across calls; `&self` methods are safe to call concurrently.
#[derive(Debug)]
pub struct EmotionClient {
    http: reqwest::Client,
    endpoint: String,
    config: EmotionConfig,
}

impl EmotionClient {
    /// Build a client from `config`.
    ///
    /// When `first_contact_pin` is set, the one-time pin bootstrap runs
    /// here. Its outcome is logged and never blocks construction: a client
    /// is returned even if the bootstrap fails, and requests then rely on
    /// whatever roots are available.
    ///
    /// # Errors
    /// Returns [`EmotionError::Config`] for invalid configuration (including
    /// an unreadable `extra_ca_bundle`) and [`EmotionError::Transport`] if
    /// the HTTP client cannot be built.
    #[instrument(skip(config))]
    pub async fn new(config: EmotionConfig) -> EmotionResult<Self> {
        config.validate()?;
        let base_url = config.normalized_base_url()?;
        let endpoint = format!("{base_url}/emotion");

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if let Some(pin_path) = &config.first_contact_pin {
            let (host, port) = config.pin_target()?;
            match trust::ensure_pinned(&host, port, pin_path).await {
                Ok(outcome) => debug!(?outcome, host, "first-contact pin bootstrap finished"),
                Err(err) => warn!(host, %err, "first-contact pin bootstrap failed, continuing"),
            }

            // The pin is best-effort end to end: an absent or unparseable
            // file downgrades to platform trust rather than failing.
            match trust::load_pem_roots(pin_path) {
                Ok(roots) => {
                    let count = roots.len();
                    for der in roots {
                        match reqwest::Certificate::from_der(der.as_ref()) {
                            Ok(cert) => builder = builder.add_root_certificate(cert),
                            Err(err) => {
                                warn!(%err, "pinned certificate rejected by HTTP client");
                            }
                        }
                    }
                    debug!(pin = %pin_path.display(), count, "added pinned roots");
                }
                Err(err) => {
                    warn!(pin = %pin_path.display(), %err, "no usable pin, relying on platform roots");
                }
            }
        }

        if let Some(bundle) = &config.extra_ca_bundle {
            let roots = trust::load_pem_roots(bundle).map_err(|e| {
                EmotionError::Config(format!("extra CA bundle {}: {e}", bundle.display()))
            })?;
            for der in roots {
                let cert = reqwest::Certificate::from_der(der.as_ref()).map_err(|e| {
                    EmotionError::Config(format!("extra CA bundle {}: {e}", bundle.display()))
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        let http = builder.build()?;
        info!(%endpoint, lang_code = %config.lang_code, "emotion client ready");
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Submit `text` for emotion analysis and return the raw JSON response.
    ///
    /// The body comes back byte-for-byte for any HTTP status; provider-side
    /// error payloads are the caller's to interpret.
    ///
    /// # Errors
    /// Returns [`EmotionError::MissingCredential`] when no API key is
    /// configured (checked before any network I/O) and
    /// [`EmotionError::Transport`] when the request cannot complete.
    #[instrument(skip(self, text), fields(lang_code = %self.config.lang_code, text_len = text.len()))]
    pub async fn get_emotion(&self, text: &str) -> EmotionResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(EmotionError::MissingCredential)?;

        let form = Form::new()
            .text("api_key", api_key.to_owned())
            .text("text", text.to_owned())
            .text("lang_code", self.config.lang_code.clone());

        let response = self
            .http
            .post(&self.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "emotion response received");
        Ok(body)
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
