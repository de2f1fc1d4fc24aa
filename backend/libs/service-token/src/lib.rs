//! Service-to-service identity tokens
//!
//! Symmetric (HS256) tokens that let one backend service prove its identity to
//! another over gRPC. Every participating service shares one secret; the
//! receiving side additionally restricts which service names may call in.
//!
//! ## Core Components
//!
//! - **TokenService**: stateless issue/verify primitives
//! - **CachingTokenService**: outbound token cache that refreshes one minute
//!   before expiry
//! - **ServiceClaims**: decoded token payload (`servicename`, `exp`)
//! - **Clock**: time source, swappable in tests
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Duration;
//! use service_token::{ServiceIdentity, TokenService, ValidServiceSet};
//!
//! let identity = ServiceIdentity::new("billing", "shared-secret", Duration::minutes(60));
//! let tokens = TokenService::new(identity, ValidServiceSet::new(["billing"]));
//!
//! let token = tokens.issue().unwrap();
//! let claims = tokens.verify(token.as_str()).unwrap();
//! assert!(tokens.is_authorized(&claims));
//! ```

mod cache;
mod claims;
mod clock;
mod error;
mod service;

pub use cache::{CachingTokenService, REFRESH_MARGIN_SECS};
pub use claims::{ServiceClaims, ServiceToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TokenError, TokenResult};
pub use service::{ServiceIdentity, TokenService, ValidServiceSet};
