/// Auth Gateway Main Entry Point
///
/// Starts a gRPC server with:
/// - Mutual TLS from the configured certificate directory
/// - Service token authentication on every call
/// - Standard gRPC health service as the protected handler
///
/// Every credential and config error aborts before the listener is bound.
use anyhow::{Context, Result};
use auth_gateway::{init_tracing, shutdown_signal, SecureServer, Settings};
use grpc_jwt_propagation::ServiceAuthInterceptor;
use grpc_tls::CredentialStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tonic_health::ServingStatus;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23 requires selecting a CryptoProvider at runtime
    grpc_tls::install_crypto_provider();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    init_tracing(&settings.log_filter());

    info!(
        service = %settings.jwt.service_name,
        valid_services = ?settings.jwt.valid_services,
        "Starting auth gateway"
    );

    // Trust pool
    let store = CredentialStore::load(&settings.tls.certs_dir)
        .context("Failed to load CA certificate")?
        .with_domain_name(settings.tls.domain_name.clone());

    // Token verification
    let tokens = Arc::new(settings.token_service()?);
    let interceptor = ServiceAuthInterceptor::new(tokens);

    let server = SecureServer::new(&store, interceptor, settings.drain_timeout())
        .context("Failed to load server credentials")?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_service_status("", ServingStatus::Serving)
        .await;

    let router = server
        .router(health_service)
        .context("Failed to configure gRPC TLS")?;

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Starting gRPC server on {}", addr);

    let shutdown = async move {
        shutdown_signal().await;
        health_reporter
            .set_service_status("", ServingStatus::NotServing)
            .await;
    };

    server
        .serve(router, listener, shutdown)
        .await
        .context("gRPC server error")?;

    info!("Auth gateway shutdown complete");

    Ok(())
}
