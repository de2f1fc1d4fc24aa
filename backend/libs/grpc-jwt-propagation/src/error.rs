use service_token::TokenError;
use thiserror::Error;
use tonic::{Code, Status};

/// Why an inbound call was rejected
///
/// Every variant is terminal for the call; the handler is never reached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing metadata")]
    MissingMetadata,

    #[error("missing authorization token")]
    MissingToken,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("service `{0}` is not authorized")]
    UnauthorizedService(String),

    #[error("token has expired")]
    Expired,
}

impl AuthError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            AuthError::UnauthorizedService(_) => {
                Status::new(Code::PermissionDenied, self.to_string())
            }
            _ => Status::new(Code::Unauthenticated, self.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Malformed(reason) => AuthError::Malformed(reason),
            TokenError::SigningFailure(reason) => {
                AuthError::Malformed(format!("unexpected signing error: {}", reason))
            }
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        err.to_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingMetadata.to_status().code(), Code::Unauthenticated);
        assert_eq!(AuthError::MissingToken.to_status().code(), Code::Unauthenticated);
        assert_eq!(
            AuthError::Malformed("bad".into()).to_status().code(),
            Code::Unauthenticated
        );
        assert_eq!(AuthError::InvalidSignature.to_status().code(), Code::Unauthenticated);
        assert_eq!(AuthError::Expired.to_status().code(), Code::Unauthenticated);
        assert_eq!(
            AuthError::UnauthorizedService("reports".into()).to_status().code(),
            Code::PermissionDenied
        );
    }

    #[test]
    fn test_status_messages_distinguish_reasons() {
        let messages: Vec<String> = [
            AuthError::MissingMetadata,
            AuthError::MissingToken,
            AuthError::InvalidSignature,
            AuthError::Expired,
        ]
        .iter()
        .map(|e| e.to_status().message().to_string())
        .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_from_token_error() {
        assert_eq!(
            AuthError::from(TokenError::InvalidSignature),
            AuthError::InvalidSignature
        );
        assert_eq!(
            AuthError::from(TokenError::Malformed("x".into())),
            AuthError::Malformed("x".into())
        );
        assert!(matches!(
            AuthError::from(TokenError::SigningFailure("x".into())),
            AuthError::Malformed(reason) if reason.contains("signing")
        ));
    }
}
