//! ParallelDots emotion analysis API client.
//!
//! Forwards a text string to the ParallelDots `/v5/emotion` endpoint and
//! returns the provider's raw JSON response. The client does not parse,
//! validate, or retry anything: callers get the body byte-for-byte (provider
//! error payloads included) or a transport error.
//!
//! ```no_run
//! use paralleldots_emotion::{EmotionClient, EmotionConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EmotionClient::new(EmotionConfig::with_api_key("abc123")).await?;
//! let json = client.get_emotion("I am happy").await?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Trust model
//!
//! By default the provider certificate is verified against the platform
//! trust store like any other HTTPS client. Two explicit opt-ins exist for
//! environments where that store is incomplete:
//!
//! - `extra_ca_bundle` adds a PEM bundle to the trusted roots for this
//!   client only.
//! - `first_contact_pin` enables a trust-on-first-use pin: on first
//!   construction the leaf certificate the server presents is captured and
//!   persisted, then added to the trusted roots on later runs.
//!
//! **Trust-on-first-use is deliberately weaker than standard certificate
//! validation.** It trusts whatever certificate is presented on first
//! contact, with no chain verification. Prefer the platform store or an
//! explicit CA bundle whenever possible. Neither option mutates
//! process-wide trust state.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
pub mod trust;

pub use client::{DEFAULT_BASE_URL, EmotionClient};
pub use config::EmotionConfig;
pub use error::{EmotionError, EmotionResult};
pub use trust::{PinOutcome, TrustError};
