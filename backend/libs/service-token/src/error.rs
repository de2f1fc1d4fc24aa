use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type TokenResult<T> = std::result::Result<T, TokenError>;

/// Failures of the issue/verify primitives
///
/// Expiry and allow-list membership are not represented: `verify` only
/// answers "was this signed by someone holding our secret, and does it have
/// the expected shape". Callers run the remaining checks themselves.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("failed to sign token: {0}")]
    SigningFailure(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            // A token carrying any algorithm other than HS256 cannot have been
            // signed under our scheme.
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::MissingRequiredClaim(claim) => {
                TokenError::Malformed(format!("missing required claim `{claim}`"))
            }
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}
