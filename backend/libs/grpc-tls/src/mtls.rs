//! Mutual TLS credentials backed by a certificate directory
//!
//! ## Usage
//!
//! ### Server with mTLS
//! ```rust,no_run
//! use grpc_tls::CredentialStore;
//!
//! # fn example() -> grpc_tls::TlsResult<()> {
//! grpc_tls::install_crypto_provider();
//! let store = CredentialStore::load("/etc/auth-gateway/certs")?;
//!
//! let server_tls = store.server_credentials()?;
//! let client_tls = store.client_credentials()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{TlsError, TlsResult};
use crate::{
    parse_certificates, validate_cert_expiration, CertificateInfo, CA_CERT_FILE,
    CLIENT_CERT_FILE, CLIENT_KEY_FILE, SERVER_CERT_FILE, SERVER_KEY_FILE,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::{debug, info};

pub const DEFAULT_DOMAIN_NAME: &str = "localhost";

/// CA trust pool plus on-demand access to the server and client key pairs
///
/// The CA is read and parsed once in `load`; construction either yields a
/// fully usable store or an error. Key pairs are read from disk on every
/// credentials call, so rotated leaves are picked up without a restart.
/// Clones share nothing mutable and may be used from any thread.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    certs_dir: PathBuf,
    ca: Certificate,
    ca_certs: Vec<CertificateInfo>,
    domain_name: String,
}

impl CredentialStore {
    /// Load the CA trust pool from `<certs_dir>/ca.crt`
    ///
    /// - `CertLoadFailure` if the file is missing or unreadable
    /// - `CertParseFailure` if it holds no parseable certificate
    /// - `Expired` if any CA certificate is past its `notAfter`
    pub fn load(certs_dir: impl AsRef<Path>) -> TlsResult<Self> {
        let certs_dir = certs_dir.as_ref().to_path_buf();
        let ca_path = certs_dir.join(CA_CERT_FILE);

        let ca_pem = read_file(&ca_path)?;
        let ca_certs = parse_certificates(&ca_path, &ca_pem)?;

        let now = Utc::now();
        for cert in &ca_certs {
            validate_cert_expiration(&ca_path, cert, now)?;
        }

        info!(
            ca_cert = ?ca_path,
            ca_count = ca_certs.len(),
            "CA trust pool loaded"
        );

        Ok(Self {
            certs_dir,
            ca: Certificate::from_pem(ca_pem),
            ca_certs,
            domain_name: DEFAULT_DOMAIN_NAME.to_string(),
        })
    }

    /// Server name the client expects in the server certificate
    pub fn with_domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = domain_name.into();
        self
    }

    pub fn certs_dir(&self) -> &Path {
        &self.certs_dir
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Certificates in the trust pool, in file order
    pub fn ca_certificates(&self) -> &[CertificateInfo] {
        &self.ca_certs
    }

    /// Server credentials with mandatory client certificate verification
    ///
    /// Loads `server.crt`/`server.key`; clients must present a certificate
    /// chaining to the CA pool.
    pub fn server_credentials(&self) -> TlsResult<ServerTlsConfig> {
        let identity = self.load_identity(SERVER_CERT_FILE, SERVER_KEY_FILE)?;

        let tls_config = ServerTlsConfig::new()
            .identity(identity)
            .client_ca_root(self.ca.clone())
            .client_auth_optional(false);

        debug!("Server TLS config built with mandatory client certificate verification");

        Ok(tls_config)
    }

    /// Client credentials presenting `client.crt` and trusting the CA pool
    pub fn client_credentials(&self) -> TlsResult<ClientTlsConfig> {
        let identity = self.load_identity(CLIENT_CERT_FILE, CLIENT_KEY_FILE)?;

        let tls_config = ClientTlsConfig::new()
            .ca_certificate(self.ca.clone())
            .identity(identity)
            .domain_name(self.domain_name.clone());

        debug!(
            domain = %self.domain_name,
            "Client TLS config built with mTLS authentication"
        );

        Ok(tls_config)
    }

    fn load_identity(&self, cert_file: &str, key_file: &str) -> TlsResult<Identity> {
        let cert_path = self.certs_dir.join(cert_file);
        let key_path = self.certs_dir.join(key_file);

        let cert_pem = read_file(&cert_path)?;
        let chain = parse_certificates(&cert_path, &cert_pem)?;
        // Leaf first; intermediates follow
        validate_cert_expiration(&cert_path, &chain[0], Utc::now())?;

        let key_pem = read_file(&key_path)?;
        validate_private_key(&key_path, &key_pem)?;

        Ok(Identity::from_pem(cert_pem, key_pem))
    }
}

fn read_file(path: &Path) -> TlsResult<String> {
    fs::read_to_string(path).map_err(|e| TlsError::CertLoadFailure {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validate_private_key(path: &Path, key_pem: &str) -> TlsResult<()> {
    match rustls_pemfile::private_key(&mut key_pem.as_bytes()) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::KeyParseFailure {
            path: path.to_path_buf(),
            reason: "no private key found".to_string(),
        }),
        Err(e) => Err(TlsError::KeyParseFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
