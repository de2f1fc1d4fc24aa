//! Outbound token cache
//!
//! A service that calls out repeatedly reuses one token until it is close to
//! expiry instead of signing per call.

use crate::claims::ServiceToken;
use crate::error::TokenResult;
use crate::service::TokenService;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Cached tokens are replaced once this many seconds of validity or less remain
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// `TokenService` plus the token this service currently presents to others
#[derive(Debug)]
pub struct CachingTokenService {
    tokens: Arc<TokenService>,
    current: Mutex<Option<ServiceToken>>,
}

impl CachingTokenService {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self {
            tokens,
            current: Mutex::new(None),
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Return the cached token, or issue and cache a new one if fewer than
    /// `REFRESH_MARGIN_SECS` of validity are left
    ///
    /// The lock covers check, sign and store; concurrent callers see either
    /// the previous token or the new one.
    pub fn get_or_refresh(&self) -> TokenResult<ServiceToken> {
        let mut current = self.current.lock();
        let now = self.tokens.clock().now();

        if let Some(token) = current.as_ref() {
            if token.claims().remaining_secs(now) > REFRESH_MARGIN_SECS {
                return Ok(token.clone());
            }
            debug!(exp = token.exp(), "Cached service token near expiry, refreshing");
        }

        let fresh = self.tokens.issue()?;
        *current = Some(fresh.clone());
        Ok(fresh)
    }
}
