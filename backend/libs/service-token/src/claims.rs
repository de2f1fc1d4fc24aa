//! Token payload and the signed token value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by a service token
///
/// Wire names are fixed: `servicename` and `exp` (Unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClaims {
    /// Name of the calling service
    #[serde(rename = "servicename")]
    pub service_name: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl ServiceClaims {
    /// A token is expired from its `exp` second onwards
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Seconds of validity left at `now` (negative once expired)
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.exp - now.timestamp()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A signed token together with the claims it was issued for
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceToken {
    value: String,
    claims: ServiceClaims,
}

impl ServiceToken {
    pub(crate) fn new(value: String, claims: ServiceClaims) -> Self {
        Self { value, claims }
    }

    /// Compact JWS form, as sent in the `authorization` metadata entry
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn claims(&self) -> &ServiceClaims {
        &self.claims
    }

    pub fn exp(&self) -> i64 {
        self.claims.exp
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

// The token is a bearer credential; keep it out of logs.
impl fmt::Debug for ServiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceToken")
            .field("value", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_expiring_at(exp: DateTime<Utc>) -> ServiceClaims {
        ServiceClaims {
            service_name: "billing".to_string(),
            exp: exp.timestamp(),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let exp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = claims_expiring_at(exp);

        assert!(!claims.is_expired_at(exp - Duration::seconds(1)));
        assert!(!claims.is_expired_at(exp - Duration::milliseconds(500)));
        assert!(claims.is_expired_at(exp));
        assert!(claims.is_expired_at(exp + Duration::seconds(1)));
    }

    #[test]
    fn test_wire_field_names() {
        let claims = ServiceClaims {
            service_name: "billing".to_string(),
            exp: 42,
        };
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["servicename"], "billing");
        assert_eq!(json["exp"], 42);
    }

    #[test]
    fn test_debug_redacts_token_value() {
        let token = ServiceToken::new(
            "header.payload.signature".to_string(),
            ServiceClaims {
                service_name: "billing".to_string(),
                exp: 42,
            },
        );

        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("signature"));
        assert!(rendered.contains("billing"));
    }
}
