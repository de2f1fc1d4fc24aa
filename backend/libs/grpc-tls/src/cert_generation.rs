//! Certificate Generation for Development and Testing
//!
//! Generates a throwaway CA plus server and client leaves for local mTLS.
//! **WARNING**: NEVER use in production - use proper CA-signed certificates.

use crate::{CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE, SERVER_CERT_FILE, SERVER_KEY_FILE};
use anyhow::{Context, Result};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    SanType,
};
use std::fs;
use std::path::Path;
use tracing::info;

const DEV_ORGANIZATION: &str = "Auth Gateway Development";

/// Bundle of certificates for development
#[derive(Clone)]
pub struct CertificateBundle {
    /// CA certificate (PEM)
    pub ca_cert: String,
    /// CA private key (PEM)
    pub ca_key: String,
    /// Server certificate signed by CA (PEM)
    pub server_cert: String,
    /// Server private key (PEM)
    pub server_key: String,
    /// Client certificate for mTLS (PEM)
    pub client_cert: String,
    /// Client private key (PEM)
    pub client_key: String,
}

/// Generate development certificates (CA, server, client)
///
/// **Usage**: Development and testing only
/// **Server SANs**: `localhost`, `127.0.0.1`
/// **Subject**: CN=Auth Gateway Development CA / CN=localhost / CN=dev-client
pub fn generate_dev_certificates() -> Result<CertificateBundle> {
    // 1. CA
    let mut ca_params = CertificateParams::default();
    ca_params.distinguished_name = dev_name("Auth Gateway Development CA");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);

    let ca_keypair = KeyPair::generate()?;
    let ca_cert = ca_params
        .self_signed(&ca_keypair)
        .context("Failed to generate CA certificate")?;

    // 2. Server leaf signed by CA
    let mut server_params = CertificateParams::default();
    server_params.distinguished_name = dev_name("localhost");
    server_params.subject_alt_names.push(SanType::DnsName(
        "localhost"
            .try_into()
            .context("Failed to create SAN for localhost")?,
    ));
    server_params
        .subject_alt_names
        .push(SanType::IpAddress(std::net::IpAddr::V4(
            std::net::Ipv4Addr::LOCALHOST,
        )));

    let (server_cert, server_key) = sign_leaf(server_params, &ca_cert, &ca_keypair)
        .context("Failed to sign server certificate")?;

    // 3. Client leaf signed by CA
    let mut client_params = CertificateParams::default();
    client_params.distinguished_name = dev_name("dev-client");

    let (client_cert, client_key) = sign_leaf(client_params, &ca_cert, &ca_keypair)
        .context("Failed to sign client certificate")?;

    info!("Generated development certificates (CA, server, client)");

    Ok(CertificateBundle {
        ca_cert: ca_cert.pem(),
        ca_key: ca_keypair.serialize_pem(),
        server_cert,
        server_key,
        client_cert,
        client_key,
    })
}

fn dev_name(common_name: &str) -> DistinguishedName {
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    name.push(DnType::OrganizationName, DEV_ORGANIZATION);
    name
}

fn sign_leaf(
    params: CertificateParams,
    ca_cert: &Certificate,
    ca_keypair: &KeyPair,
) -> Result<(String, String)> {
    let keypair = KeyPair::generate()?;
    let cert = params.signed_by(&keypair, ca_cert, ca_keypair)?;
    Ok((cert.pem(), keypair.serialize_pem()))
}

/// Write certificate bundle to files
///
/// Creates the layout `CredentialStore::load` reads:
/// ```text
/// certs/
///   ca.crt        (CA certificate)
///   ca.key        (CA private key)
///   server.crt    (Server certificate)
///   server.key    (Server private key)
///   client.crt    (Client certificate)
///   client.key    (Client private key)
/// ```
pub fn write_cert_bundle(bundle: &CertificateBundle, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {:?}", output_dir))?;

    let files = [
        (CA_CERT_FILE, &bundle.ca_cert),
        ("ca.key", &bundle.ca_key),
        (SERVER_CERT_FILE, &bundle.server_cert),
        (SERVER_KEY_FILE, &bundle.server_key),
        (CLIENT_CERT_FILE, &bundle.client_cert),
        (CLIENT_KEY_FILE, &bundle.client_key),
    ];

    for (name, contents) in files {
        fs::write(output_dir.join(name), contents)
            .with_context(|| format!("Failed to write {}", name))?;
    }

    info!(output_dir = ?output_dir, "Certificate bundle written to disk");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_dev_certificates() {
        let bundle = generate_dev_certificates().unwrap();

        assert!(bundle.ca_cert.contains("BEGIN CERTIFICATE"));
        assert!(bundle.server_cert.contains("BEGIN CERTIFICATE"));
        assert!(bundle.client_cert.contains("BEGIN CERTIFICATE"));
        assert!(bundle.ca_key.contains("PRIVATE KEY"));
        assert!(bundle.server_key.contains("PRIVATE KEY"));
        assert!(bundle.client_key.contains("PRIVATE KEY"));

        // Each run mints a fresh CA
        let other = generate_dev_certificates().unwrap();
        assert_ne!(bundle.ca_cert, other.ca_cert);
    }

    #[test]
    fn test_write_cert_bundle() {
        let bundle = generate_dev_certificates().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let certs_dir = temp_dir.path().join("certs");

        write_cert_bundle(&bundle, &certs_dir).unwrap();

        for name in [
            CA_CERT_FILE,
            SERVER_CERT_FILE,
            SERVER_KEY_FILE,
            CLIENT_CERT_FILE,
            CLIENT_KEY_FILE,
        ] {
            assert!(certs_dir.join(name).exists(), "{} missing", name);
        }
        assert_eq!(
            fs::read_to_string(certs_dir.join(SERVER_CERT_FILE)).unwrap(),
            bundle.server_cert
        );
    }
}
