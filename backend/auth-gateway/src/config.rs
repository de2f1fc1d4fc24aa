//! Configuration management for the auth gateway
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. Optional YAML file (`AUTH_GATEWAY_CONFIG`, default `config.yaml`)
//! 3. `.env` file (local development)
//! 4. Environment variables, e.g. `AUTH_GATEWAY__JWT__SECRET`
//!
//! # Example
//!
//! ```no_run
//! use auth_gateway::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     settings.validate()?;
//!     println!("listening on {}", settings.bind_addr()?);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use service_token::{ServiceIdentity, TokenService, ValidServiceSet};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "AUTH_GATEWAY";
pub const CONFIG_PATH_ENV: &str = "AUTH_GATEWAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Upper bound on `jwt.validity_minutes` (one year)
pub const MAX_VALIDITY_MINUTES: i64 = 525_600;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub tls: TlsSettings,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on waiting for in-flight calls after a shutdown signal
    pub shutdown_drain_seconds: u64,
}

/// Service token settings
#[derive(Clone, Deserialize)]
pub struct JwtSettings {
    /// Name this service signs into its own tokens
    #[serde(default)]
    pub service_name: String,
    /// Shared HS256 secret
    #[serde(default)]
    pub secret: String,
    pub validity_minutes: i64,
    /// Callers allowed to reach this service
    #[serde(default)]
    pub valid_services: Vec<String>,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("service_name", &self.service_name)
            .field("secret", &"<redacted>")
            .field("validity_minutes", &self.validity_minutes)
            .field("valid_services", &self.valid_services)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsSettings {
    /// Directory holding `ca.crt`, `server.crt/key` and `client.crt/key`
    pub certs_dir: PathBuf,
    /// Name expected in the server certificate when dialing peers
    pub domain_name: String,
}

impl Settings {
    /// Load settings from the config file named by `AUTH_GATEWAY_CONFIG`,
    /// `.env` and the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Some(Path::new(&path)))
    }

    /// Load settings with an explicit (optional) config file
    ///
    /// A missing file is skipped; a present but invalid one is an error.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 50051)?
            .set_default("server.shutdown_drain_seconds", 30)?
            .set_default("jwt.validity_minutes", 60)?
            .set_default("tls.certs_dir", "certs")?
            .set_default("tls.domain_name", "localhost")?
            .set_default("log_level", "info")?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("jwt.valid_services")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("gRPC port must be greater than 0"));
        }

        if self.jwt.secret.is_empty() {
            return Err(anyhow!("JWT secret is required"));
        }

        if self.jwt.service_name.trim().is_empty() {
            return Err(anyhow!("Service name is required"));
        }

        if self.jwt.validity_minutes <= 0 {
            return Err(anyhow!("Token validity window must be greater than 0"));
        }

        if self.jwt.validity_minutes > MAX_VALIDITY_MINUTES {
            return Err(anyhow!(
                "Token validity window must be at most {} minutes",
                MAX_VALIDITY_MINUTES
            ));
        }

        if self.jwt.valid_services.iter().all(|s| s.trim().is_empty()) {
            return Err(anyhow!("At least one valid caller service is required"));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .context("Invalid server address")
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_drain_seconds)
    }

    /// Default tracing filter derived from `log_level`
    pub fn log_filter(&self) -> String {
        format!("auth_gateway={0},{0}", self.log_level)
    }

    /// Token service for this process's identity and allow-list
    pub fn token_service(&self) -> Result<TokenService> {
        let validity_window = chrono::Duration::try_minutes(self.jwt.validity_minutes)
            .ok_or_else(|| anyhow!("Token validity window out of range"))?;
        let identity = ServiceIdentity::new(
            self.jwt.service_name.clone(),
            self.jwt.secret.clone(),
            validity_window,
        );
        let valid_services = self
            .jwt
            .valid_services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        Ok(TokenService::new(
            identity,
            ValidServiceSet::new(valid_services),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: &[&str] = &[
        "AUTH_GATEWAY__SERVER__PORT",
        "AUTH_GATEWAY__JWT__SERVICE_NAME",
        "AUTH_GATEWAY__JWT__SECRET",
        "AUTH_GATEWAY__JWT__VALID_SERVICES",
        "AUTH_GATEWAY__TLS__CERTS_DIR",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn valid_settings() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 50051,
                shutdown_drain_seconds: 30,
            },
            jwt: JwtSettings {
                service_name: "ledger".to_string(),
                secret: "s1".to_string(),
                validity_minutes: 60,
                valid_services: vec!["billing".to_string()],
            },
            tls: TlsSettings {
                certs_dir: PathBuf::from("certs"),
                domain_name: "localhost".to_string(),
            },
            log_level: "info".to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let settings = Settings::load_from(None).unwrap();

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 50051);
        assert_eq!(settings.drain_timeout(), Duration::from_secs(30));
        assert_eq!(settings.jwt.validity_minutes, 60);
        assert_eq!(settings.tls.certs_dir, PathBuf::from("certs"));
        assert_eq!(settings.tls.domain_name, "localhost");
        assert_eq!(settings.log_filter(), "auth_gateway=info,info");

        // Required values have no defaults
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        std::env::set_var("AUTH_GATEWAY__SERVER__PORT", "6000");
        std::env::set_var("AUTH_GATEWAY__JWT__SERVICE_NAME", "ledger");
        std::env::set_var("AUTH_GATEWAY__JWT__SECRET", "s1");
        std::env::set_var("AUTH_GATEWAY__JWT__VALID_SERVICES", "billing,reports");

        let settings = Settings::load_from(None).unwrap();
        clear_env();

        assert_eq!(settings.server.port, 6000);
        assert_eq!(settings.jwt.service_name, "ledger");
        assert_eq!(settings.jwt.valid_services, vec!["billing", "reports"]);
        assert!(settings.validate().is_ok());

        let tokens = settings.token_service().unwrap();
        assert!(tokens.valid_services().contains("billing"));
        assert!(tokens.valid_services().contains("reports"));
        assert!(!tokens.valid_services().contains("ledger"));
    }

    #[test]
    #[serial]
    fn test_yaml_file_then_environment() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "jwt:\n  service_name: ledger\n  secret: from-file\n  valid_services: [billing]\ntls:\n  certs_dir: /etc/ledger/certs"
        )
        .unwrap();
        std::env::set_var("AUTH_GATEWAY__JWT__SECRET", "from-env");

        let settings = Settings::load_from(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(settings.jwt.service_name, "ledger");
        assert_eq!(settings.jwt.secret, "from-env");
        assert_eq!(settings.jwt.valid_services, vec!["billing"]);
        assert_eq!(settings.tls.certs_dir, PathBuf::from("/etc/ledger/certs"));
        // Untouched defaults survive
        assert_eq!(settings.server.port, 50051);
    }

    #[test]
    #[serial]
    fn test_missing_file_is_skipped() {
        clear_env();
        let settings = Settings::load_from(Some(Path::new("/nonexistent/config.yaml"))).unwrap();
        assert_eq!(settings.server.port, 50051);
    }

    #[test]
    fn test_validation() {
        assert!(valid_settings().validate().is_ok());

        let mut settings = valid_settings();
        settings.jwt.secret.clear();
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.jwt.service_name = "  ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.jwt.validity_minutes = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.jwt.validity_minutes = MAX_VALIDITY_MINUTES;
        assert!(settings.validate().is_ok());
        settings.jwt.validity_minutes = MAX_VALIDITY_MINUTES + 1;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.jwt.valid_services.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_token_service_rejects_out_of_range_window() {
        let mut settings = valid_settings();
        settings.jwt.validity_minutes = i64::MAX;

        assert!(settings.token_service().is_err());
    }

    #[test]
    fn test_bind_addr() {
        assert_eq!(
            valid_settings().bind_addr().unwrap(),
            "127.0.0.1:50051".parse::<SocketAddr>().unwrap()
        );

        let mut settings = valid_settings();
        settings.server.host = "not a host".to_string();
        assert!(settings.bind_addr().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", valid_settings());
        assert!(!rendered.contains("\"s1\""));
        assert!(rendered.contains("<redacted>"));
    }
}
