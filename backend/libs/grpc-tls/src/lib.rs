//! gRPC mTLS credentials for service-to-service calls
//!
//! **Security Features**:
//! - Mutual TLS: servers require and verify a client certificate
//! - One CA pool shared by server and client credentials
//! - Expiry validation whenever a leaf certificate is loaded
//! - Development certificate generation for tests and local runs
//!
//! Certificate material lives in a single directory:
//!
//! ```text
//! certs/
//!   ca.crt        trust anchor for both directions
//!   server.crt    server identity
//!   server.key
//!   client.crt    client identity
//!   client.key
//! ```

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info, warn};
use x509_parser::prelude::{FromDer, X509Certificate};

pub mod cert_generation;
pub mod error;
pub mod mtls;

pub use cert_generation::{generate_dev_certificates, write_cert_bundle, CertificateBundle};
pub use error::{TlsError, TlsResult};
pub use mtls::CredentialStore;

pub const CA_CERT_FILE: &str = "ca.crt";
pub const SERVER_CERT_FILE: &str = "server.crt";
pub const SERVER_KEY_FILE: &str = "server.key";
pub const CLIENT_CERT_FILE: &str = "client.crt";
pub const CLIENT_KEY_FILE: &str = "client.key";

/// Leaf certificates closer than this to expiry are logged at WARN
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Select aws-lc-rs as the process-wide rustls provider
///
/// rustls 0.23 requires a provider before any TLS config is built. Returns
/// `false` when a provider was already installed.
pub fn install_crypto_provider() -> bool {
    if rustls::crypto::CryptoProvider::get_default().is_some() {
        return false;
    }

    match rustls::crypto::aws_lc_rs::default_provider().install_default() {
        Ok(()) => true,
        Err(_) => {
            // Lost a race with another installer; either provider is usable.
            debug!("rustls crypto provider already installed");
            false
        }
    }
}

/// Summary of one parsed X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_after
    }

    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_days()
    }
}

/// Parse every `CERTIFICATE` block in a PEM document
///
/// Fails when any block is not valid DER X.509 or when there is no
/// certificate block at all.
pub fn parse_certificates(path: &Path, pem_data: &str) -> TlsResult<Vec<CertificateInfo>> {
    let parse_failure = |reason: String| TlsError::CertParseFailure {
        path: path.to_path_buf(),
        reason,
    };

    let blocks = pem::parse_many(pem_data).map_err(|e| parse_failure(e.to_string()))?;

    let mut certs = Vec::new();
    for block in blocks.iter().filter(|b| b.tag() == "CERTIFICATE") {
        let (_, cert) = X509Certificate::from_der(block.contents())
            .map_err(|e| parse_failure(format!("invalid X.509 certificate: {}", e)))?;

        let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| parse_failure("notAfter out of range".to_string()))?;

        certs.push(CertificateInfo {
            subject: cert.subject().to_string(),
            not_after,
        });
    }

    if certs.is_empty() {
        return Err(parse_failure("no CERTIFICATE block found".to_string()));
    }

    Ok(certs)
}

/// Validate certificate expiration
///
/// Expired certificates are rejected; ones within `EXPIRY_WARNING_DAYS` of
/// their `notAfter` are accepted with a warning.
pub fn validate_cert_expiration(path: &Path, cert: &CertificateInfo, now: DateTime<Utc>) -> TlsResult<()> {
    if cert.is_expired_at(now) {
        return Err(TlsError::Expired {
            path: path.to_path_buf(),
            not_after: cert.not_after,
        });
    }

    let days_until_expiry = cert.days_until_expiry(now);
    if days_until_expiry < EXPIRY_WARNING_DAYS {
        warn!(
            path = ?path,
            subject = %cert.subject,
            days_remaining = days_until_expiry,
            "Certificate expiring soon - rotation recommended"
        );
    } else {
        info!(
            path = ?path,
            days_until_expiry = days_until_expiry,
            "Certificate validity check passed"
        );
    }

    Ok(())
}
