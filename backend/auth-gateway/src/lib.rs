//! Auth Gateway
//!
//! gRPC endpoint that admits only peers holding both a CA-signed client
//! certificate and a valid service token from an allow-listed caller.
//!
//! - `config`: layered settings (defaults, YAML, `.env`, environment)
//! - `bootstrap`: `SecureServer`, the mTLS + interceptor server composition

pub mod bootstrap;
pub mod config;

pub use bootstrap::{shutdown_signal, Protected, SecureServer};
pub use config::Settings;

/// Install the JSON tracing subscriber
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()))
        .with_target(false)
        .json()
        .init();
}
