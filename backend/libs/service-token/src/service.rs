//! Stateless issue/verify primitives for service tokens
//!
//! ## Security Design
//!
//! - **HS256 ONLY**: every service in the mesh holds the same shared secret;
//!   tokens carrying any other algorithm are rejected
//! - **Verification is signature + shape**: expiry and allow-list membership
//!   are separate checks so callers can report which one failed
//! - **Immutable**: identity, secret and allow-list are fixed at construction

use crate::claims::{ServiceClaims, ServiceToken};
use crate::clock::{Clock, SystemClock};
use crate::error::{TokenError, TokenResult};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// JWT algorithm shared by every service
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Issuing side configuration: who we are, the shared secret, token lifetime
#[derive(Clone)]
pub struct ServiceIdentity {
    name: String,
    secret: Vec<u8>,
    validity_window: Duration,
}

impl ServiceIdentity {
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        validity_window: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            validity_window,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validity_window(&self) -> Duration {
        self.validity_window
    }
}

impl fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("validity_window", &self.validity_window)
            .finish()
    }
}

/// Service names allowed to call in. Exact match, no wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidServiceSet {
    names: HashSet<String>,
}

impl ValidServiceSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.names.contains(service_name)
    }

    pub fn authorizes(&self, claims: &ServiceClaims) -> bool {
        self.contains(&claims.service_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ValidServiceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Issues tokens for this service and verifies tokens presented by others
pub struct TokenService {
    identity: ServiceIdentity,
    valid_services: ValidServiceSet,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(identity: ServiceIdentity, valid_services: ValidServiceSet) -> Self {
        Self::with_clock(identity, valid_services, Arc::new(SystemClock))
    }

    pub fn with_clock(
        identity: ServiceIdentity,
        valid_services: ValidServiceSet,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let encoding_key = EncodingKey::from_secret(&identity.secret);
        let decoding_key = DecodingKey::from_secret(&identity.secret);

        // Expiry is checked against `clock` by the caller, not by the library
        // against wall time.
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            identity,
            valid_services,
            encoding_key,
            decoding_key,
            validation,
            clock,
        }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn valid_services(&self) -> &ValidServiceSet {
        &self.valid_services
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue a fresh token expiring `validity_window` from now
    pub fn issue(&self) -> TokenResult<ServiceToken> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.identity.validity_window)
            .ok_or_else(|| {
                TokenError::SigningFailure(format!(
                    "validity window {} overflows expiry",
                    self.identity.validity_window
                ))
            })?;
        let claims = ServiceClaims {
            service_name: self.identity.name.clone(),
            exp: expires_at.timestamp(),
        };

        let value = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailure(e.to_string()))?;

        debug!(
            service = %claims.service_name,
            exp = claims.exp,
            "Issued service token"
        );

        Ok(ServiceToken::new(value, claims))
    }

    /// Check signature and claim shape; expiry and membership are not checked
    pub fn verify(&self, token: &str) -> TokenResult<ServiceClaims> {
        decode::<ServiceClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    /// Is the claimed service on our allow-list
    pub fn is_authorized(&self, claims: &ServiceClaims) -> bool {
        self.valid_services.authorizes(claims)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("identity", &self.identity)
            .field("valid_services", &self.valid_services)
            .field("clock", &self.clock)
            .finish()
    }
}
