//! Server-side Service Token Interceptor
//!
//! Extracts and validates service tokens from incoming gRPC requests,
//! storing the validated claims in request extensions.

use crate::error::AuthError;
use crate::AUTHORIZATION_METADATA_KEY;
use service_token::{ServiceClaims, TokenService};
use std::future::Future;
use std::sync::Arc;
use tonic::metadata::MetadataMap;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Server-side interceptor that validates service tokens
///
/// Checks run in a fixed order and stop at the first failure:
/// 1. Metadata present
/// 2. Non-empty `authorization` entry
/// 3. Signature and claim shape (`TokenService::verify`)
/// 4. Caller on the allow-list
/// 5. Token not expired at the current instant of the token service clock
///
/// On success the claims are stored in request extensions, typed as
/// `ServiceClaims`, and the call proceeds to the handler.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_jwt_propagation::ServiceAuthInterceptor;
/// use service_token::{ServiceIdentity, TokenService, ValidServiceSet};
/// use std::sync::Arc;
///
/// let identity = ServiceIdentity::new("ledger", "shared-secret", chrono::Duration::minutes(60));
/// let tokens = TokenService::new(identity, ValidServiceSet::new(["billing"]));
/// let interceptor = ServiceAuthInterceptor::new(Arc::new(tokens));
///
/// // let service = LedgerServiceServer::with_interceptor(LedgerService, interceptor);
/// ```
#[derive(Clone, Debug)]
pub struct ServiceAuthInterceptor {
    tokens: Arc<TokenService>,
}

impl ServiceAuthInterceptor {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn token_service(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Run the full check sequence against call metadata
    pub fn authenticate(&self, metadata: Option<&MetadataMap>) -> Result<ServiceClaims, AuthError> {
        // 1. Metadata
        let metadata = metadata.ok_or_else(|| {
            warn!("Rejected call without metadata");
            AuthError::MissingMetadata
        })?;

        // 2. Token
        let raw = metadata.get(AUTHORIZATION_METADATA_KEY).ok_or_else(|| {
            warn!("Missing authorization token");
            AuthError::MissingToken
        })?;
        let token = raw
            .to_str()
            .map_err(|e| {
                warn!("Invalid authorization value encoding: {}", e);
                AuthError::Malformed("authorization value is not visible ASCII".to_string())
            })?
            .trim();
        if token.is_empty() {
            warn!("Empty authorization token");
            return Err(AuthError::MissingToken);
        }

        // 3. Signature and shape
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(error = %e, "Service token verification failed");
            AuthError::from(e)
        })?;

        // 4. Allow-list
        if !self.tokens.is_authorized(&claims) {
            warn!(service = %claims.service_name, "Service not on allow-list");
            return Err(AuthError::UnauthorizedService(claims.service_name));
        }

        // 5. Expiry
        let now = self.tokens.clock().now();
        if claims.is_expired_at(now) {
            warn!(
                service = %claims.service_name,
                exp = claims.exp,
                now = now.timestamp(),
                "Service token expired"
            );
            return Err(AuthError::Expired);
        }

        debug!(service = %claims.service_name, "Service token validated");

        Ok(claims)
    }

    /// Authenticate a call and hand it to `handler` with the verified claims
    ///
    /// The handler's result is returned unchanged. On rejection the handler
    /// is not invoked and the `AuthError` is converted into the handler's
    /// error type.
    pub async fn dispatch<T, R, E, H, Fut>(&self, call: IncomingCall<T>, handler: H) -> Result<R, E>
    where
        H: FnOnce(Authenticated<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<AuthError>,
    {
        let claims = self.authenticate(call.metadata.as_ref())?;
        handler(Authenticated {
            claims,
            request: call.message,
        })
        .await
    }
}

impl Interceptor for ServiceAuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let claims = self.authenticate(Some(request.metadata()))?;

        // Store claims in request extensions for handler access
        request.extensions_mut().insert(claims);

        Ok(request)
    }
}

/// A unary call as seen before authentication
#[derive(Debug)]
pub struct IncomingCall<T> {
    pub metadata: Option<MetadataMap>,
    pub message: T,
}

impl<T> IncomingCall<T> {
    pub fn new(metadata: Option<MetadataMap>, message: T) -> Self {
        Self { metadata, message }
    }
}

impl<T> From<Request<T>> for IncomingCall<T> {
    fn from(request: Request<T>) -> Self {
        let (metadata, _extensions, message) = request.into_parts();
        Self {
            metadata: Some(metadata),
            message,
        }
    }
}

/// A request paired with the claims that authenticated it
#[derive(Debug)]
pub struct Authenticated<T> {
    pub claims: ServiceClaims,
    pub request: T,
}
