//! Request Extension Trait for Service Claims Access
//!
//! Provides ergonomic helpers for reading the verified caller identity from
//! gRPC request handlers.

use service_token::ServiceClaims;
use tonic::{Request, Status};

/// Extension trait for accessing service claims from gRPC requests
///
/// Claims are stored by `ServiceAuthInterceptor`; a request that did not pass
/// through it has none.
pub trait ServiceClaimsExt {
    /// Verified claims of the calling service
    ///
    /// Returns `Status::unauthenticated` if the interceptor was not attached.
    fn service_claims(&self) -> Result<&ServiceClaims, Status>;

    /// Require that the call comes from one specific service
    ///
    /// Useful for endpoints that only one peer may call even though several
    /// are on the allow-list.
    fn require_service(&self, service_name: &str) -> Result<&ServiceClaims, Status>;
}

impl<T> ServiceClaimsExt for Request<T> {
    fn service_claims(&self) -> Result<&ServiceClaims, Status> {
        self.extensions().get::<ServiceClaims>().ok_or_else(|| {
            Status::unauthenticated(
                "No service claims found. Ensure ServiceAuthInterceptor is attached.",
            )
        })
    }

    fn require_service(&self, service_name: &str) -> Result<&ServiceClaims, Status> {
        let claims = self.service_claims()?;

        if claims.service_name != service_name {
            return Err(Status::permission_denied(format!(
                "endpoint restricted to service `{}`",
                service_name
            )));
        }

        Ok(claims)
    }
}
