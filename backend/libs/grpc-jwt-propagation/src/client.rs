//! Client-side Service Token Interceptor
//!
//! Injects this service's identity token into outgoing gRPC requests.

use crate::AUTHORIZATION_METADATA_KEY;
use service_token::CachingTokenService;
use std::sync::Arc;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::error;

/// Client-side interceptor that attaches a service token to every call
///
/// The token comes from `CachingTokenService::get_or_refresh`, so it is
/// re-signed only when the cached one is about to expire. The value is sent
/// as-is under `authorization`, without a scheme prefix.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_jwt_propagation::ServiceTokenInterceptor;
/// use service_token::{CachingTokenService, ServiceIdentity, TokenService, ValidServiceSet};
/// use std::sync::Arc;
///
/// let identity = ServiceIdentity::new("billing", "shared-secret", chrono::Duration::minutes(60));
/// let tokens = Arc::new(TokenService::new(identity, ValidServiceSet::default()));
/// let interceptor = ServiceTokenInterceptor::new(Arc::new(CachingTokenService::new(tokens)));
///
/// // let mut client = LedgerServiceClient::with_interceptor(channel, interceptor);
/// ```
#[derive(Clone, Debug)]
pub struct ServiceTokenInterceptor {
    tokens: Arc<CachingTokenService>,
}

impl ServiceTokenInterceptor {
    pub fn new(tokens: Arc<CachingTokenService>) -> Self {
        Self { tokens }
    }
}

impl Interceptor for ServiceTokenInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let token = self.tokens.get_or_refresh().map_err(|e| {
            error!(error = %e, "Failed to obtain service token");
            Status::internal("failed to obtain service token")
        })?;

        // Compact JWS is base64url and dots, always valid ASCII
        let value = AsciiMetadataValue::try_from(token.as_str()).map_err(|e| {
            error!(error = %e, "Service token is not a valid metadata value");
            Status::internal("invalid service token encoding")
        })?;

        request
            .metadata_mut()
            .insert(AUTHORIZATION_METADATA_KEY, value);

        Ok(request)
    }
}
