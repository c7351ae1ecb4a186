//! Trust-on-first-use certificate pinning.
//!
//! An explicit, opt-in replacement for mutating the platform trust store
//! when the provider's certificate is not already trusted: on first contact
//! the leaf certificate the server presents is captured over a manual TLS
//! handshake and persisted as PEM at a caller-chosen path. Later client
//! constructions read the file back and add it to the trusted roots for
//! that client only.
//!
//! This trusts whatever certificate the server happens to present on first
//! contact, with no chain verification. It is a reduced-assurance model for
//! environments with an incomplete CA store, not a substitute for standard
//! TLS validation. An existing pin file is authoritative and never
//! overwritten; rotating the pin means deleting the file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};
use x509_parser::prelude::{FromDer, X509Certificate};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of the first-contact pin bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// The pin file already existed and was left untouched.
    AlreadyPinned,
    /// A certificate was captured and written to the pin file.
    Pinned,
}

/// Errors raised by the pin bootstrap and PEM loading.
#[derive(Error, Debug)]
pub enum TrustError {
    #[error("failed to read or write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[error("first-contact handshake with {host} failed: {source}")]
    Handshake {
        host: String,
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("server presented no certificate chain")]
    EmptyChain,

    #[error("no certificates found in PEM file: {0}")]
    EmptyCertBundle(String),

    #[error("first-contact handshake timed out")]
    HandshakeTimeout,
}

impl TrustError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Capture and persist the certificate presented by `host`, unless a pin
/// already exists at `path`.
///
/// Best-effort by contract: [`EmotionClient`](crate::EmotionClient) logs the
/// outcome and proceeds either way. The function is public so operators can
/// pre-pin a host outside the request path.
///
/// # Errors
/// Returns [`TrustError`] if the connection, handshake, or file write fails.
/// The pin file is only written on success.
pub async fn ensure_pinned(host: &str, port: u16, path: &Path) -> Result<PinOutcome, TrustError> {
    if path.exists() {
        debug!(pin = %path.display(), "pin file already present, leaving untouched");
        return Ok(PinOutcome::AlreadyPinned);
    }

    let chain = fetch_presented_chain(host, port).await?;
    let leaf = chain.first().ok_or(TrustError::EmptyChain)?;

    log_certificate(host, leaf);

    std::fs::write(path, to_pem(leaf)).map_err(|e| TrustError::io(path, e))?;
    info!(host, pin = %path.display(), "pinned first-contact certificate");
    Ok(PinOutcome::Pinned)
}

/// Load every certificate in a PEM file as DER.
pub(crate) fn load_pem_roots(path: &Path) -> Result<Vec<CertificateDer<'static>>, TrustError> {
    let file = std::fs::File::open(path).map_err(|e| TrustError::io(path, e))?;
    let mut reader = std::io::BufReader::new(file);
    let roots = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TrustError::io(path, e))?;
    if roots.is_empty() {
        return Err(TrustError::EmptyCertBundle(path.display().to_string()));
    }
    Ok(roots)
}

/// Complete a TLS handshake with `host` through a verifier that accepts
/// whatever chain is presented, and return that chain leaf-first.
async fn fetch_presented_chain(
    host: &str,
    port: u16,
) -> Result<Vec<CertificateDer<'static>>, TrustError> {
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| TrustError::InvalidServerName(host.to_owned()))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(FirstContactVerifier { provider }))
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let handshake = async {
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| TrustError::Connect {
                host: host.to_owned(),
                port,
                source: e,
            })?;

        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TrustError::Handshake {
                host: host.to_owned(),
                source: e,
            })?;

        let (_, session) = tls.get_ref();
        let chain: Vec<CertificateDer<'static>> = session
            .peer_certificates()
            .ok_or(TrustError::EmptyChain)?
            .iter()
            .map(|cert| cert.clone().into_owned())
            .collect();
        Ok(chain)
    };

    tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake)
        .await
        .map_err(|_| TrustError::HandshakeTimeout)?
}

fn log_certificate(host: &str, der: &CertificateDer<'_>) {
    match X509Certificate::from_der(der.as_ref()) {
        Ok((_, cert)) => {
            info!(
                host,
                subject = %cert.subject(),
                not_after = %cert.validity().not_after,
                "captured server certificate"
            );
        }
        Err(err) => debug!(host, %err, "captured certificate does not parse as X.509"),
    }
}

fn to_pem(der: &CertificateDer<'_>) -> String {
    use base64::Engine as _;

    let encoded = base64::engine::general_purpose::STANDARD.encode(der.as_ref());
    let mut pem = String::with_capacity(encoded.len() + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        pem.extend(chunk.iter().copied().map(char::from));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

/// Accepts whatever certificate the server presents so the handshake
/// completes and the chain can be read back off the session. Only used for
/// the first-contact capture, never for request traffic.
#[derive(Debug)]
struct FirstContactVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for FirstContactVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
