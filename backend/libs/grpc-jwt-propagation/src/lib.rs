//! Service Token Propagation for gRPC Microservices
//!
//! Carries service-identity tokens between gRPC services and enforces them on
//! the receiving side before any request reaches business logic.
//!
//! ## Core Components
//!
//! - **ServiceAuthInterceptor**: server-side gate; verifies the token in the
//!   `authorization` metadata entry and stores `ServiceClaims` in request
//!   extensions
//! - **ServiceTokenInterceptor**: client-side; attaches this service's cached
//!   token to every outgoing call
//! - **ServiceClaimsExt**: request extension trait for handlers
//! - **AuthError**: classified rejection reasons, mapped to `tonic::Status`
//!
//! ## Usage Example
//!
//! ### Client Side
//!
//! ```rust,no_run
//! use grpc_jwt_propagation::ServiceTokenInterceptor;
//! use service_token::{CachingTokenService, ServiceIdentity, TokenService, ValidServiceSet};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = ServiceIdentity::new("billing", "shared-secret", chrono::Duration::minutes(60));
//! let tokens = Arc::new(TokenService::new(identity, ValidServiceSet::default()));
//! let interceptor = ServiceTokenInterceptor::new(Arc::new(CachingTokenService::new(tokens)));
//!
//! let channel = tonic::transport::Channel::from_static("https://[::1]:50051")
//!     .connect()
//!     .await?;
//!
//! // let mut client = LedgerServiceClient::with_interceptor(channel, interceptor);
//! # Ok(())
//! # }
//! ```
//!
//! ### Server Side
//!
//! ```rust,no_run
//! use grpc_jwt_propagation::{ServiceAuthInterceptor, ServiceClaimsExt};
//! use tonic::{Request, Response, Status};
//!
//! async fn close_ledger(request: Request<()>) -> Result<Response<()>, Status> {
//!     // Verified by ServiceAuthInterceptor before the handler runs
//!     let caller = request.service_claims()?;
//!     tracing::info!(caller = %caller.service_name, "closing ledger");
//!     Ok(Response::new(()))
//! }
//! ```
//!
//! ## Rejections
//!
//! - No metadata / no token = `Status::unauthenticated`
//! - Malformed or badly signed token = `Status::unauthenticated`
//! - Expired token = `Status::unauthenticated`
//! - Caller not on the allow-list = `Status::permission_denied`

mod client;
mod error;
mod extensions;
mod server;

pub use client::ServiceTokenInterceptor;
pub use error::AuthError;
pub use extensions::ServiceClaimsExt;
pub use server::{Authenticated, IncomingCall, ServiceAuthInterceptor};

pub use service_token::ServiceClaims;

/// Metadata key carrying the compact token (no scheme prefix)
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";

// Re-export tonic Status for convenience
pub use tonic::Status;
