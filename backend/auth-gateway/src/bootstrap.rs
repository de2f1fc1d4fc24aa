//! Hardened gRPC server endpoint
//!
//! Every service mounted through `SecureServer` sits behind mutual TLS and the
//! service token interceptor. Credentials are resolved in `SecureServer::new`
//! so a bad certificate directory fails before any socket is opened.

use grpc_jwt_propagation::ServiceAuthInterceptor;
use grpc_tls::{CredentialStore, TlsResult};
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codegen::{http, InterceptedService, Service};
use tonic::server::NamedService;
use tonic::transport::server::Router;
use tonic::transport::{Server, ServerTlsConfig};
use tracing::{info, warn};

/// A gRPC service wrapped in the service token interceptor
pub type Protected<S> = InterceptedService<S, ServiceAuthInterceptor>;

pub struct SecureServer {
    tls: ServerTlsConfig,
    interceptor: ServiceAuthInterceptor,
    drain_timeout: Duration,
}

impl SecureServer {
    /// Resolve server credentials and capture the interceptor
    ///
    /// Fails with the store's `TlsError` when `server.crt`/`server.key` are
    /// missing, unparseable or expired.
    pub fn new(
        store: &CredentialStore,
        interceptor: ServiceAuthInterceptor,
        drain_timeout: Duration,
    ) -> TlsResult<Self> {
        let tls = store.server_credentials()?;

        info!(
            certs_dir = ?store.certs_dir(),
            drain_seconds = drain_timeout.as_secs(),
            "Secure gRPC endpoint configured (mTLS + service tokens)"
        );

        Ok(Self {
            tls,
            interceptor,
            drain_timeout,
        })
    }

    pub fn interceptor(&self) -> &ServiceAuthInterceptor {
        &self.interceptor
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Wrap a service so every call is authenticated first
    pub fn protect<S>(&self, service: S) -> Protected<S> {
        InterceptedService::new(service, self.interceptor.clone())
    }

    /// Router with TLS applied and `service` mounted behind the interceptor
    ///
    /// Further services go through `protect` before `Router::add_service`.
    pub fn router<S>(&self, service: S) -> TlsResult<Router>
    where
        Protected<S>: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + 'static,
        <Protected<S> as Service<http::Request<BoxBody>>>::Future: Send + 'static,
    {
        let mut builder = Server::builder().tls_config(self.tls.clone())?;
        Ok(builder.add_service(self.protect(service)))
    }

    /// Serve until `shutdown` resolves, then drain for at most `drain_timeout`
    ///
    /// After the signal no new connections are accepted. Calls still running
    /// when the drain window closes are abandoned.
    pub async fn serve<F>(
        &self,
        router: Router,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), tonic::transport::Error>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr().ok();
        let incoming = TcpListenerStream::new(listener);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = router.serve_with_incoming_shutdown(incoming, async {
            let _ = stop_rx.await;
        });
        tokio::pin!(server);
        tokio::pin!(shutdown);

        info!(addr = ?local_addr, "gRPC server listening");

        tokio::select! {
            biased;
            result = &mut server => return result,
            _ = &mut shutdown => {
                info!("Shutdown requested, draining in-flight calls");
            }
        }

        let _ = stop_tx.send(());

        match tokio::time::timeout(self.drain_timeout, server).await {
            Ok(result) => {
                info!("gRPC server drained");
                result
            }
            Err(_) => {
                warn!(
                    drain_seconds = self.drain_timeout.as_secs(),
                    "Drain window elapsed with calls in flight, closing"
                );
                Ok(())
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
