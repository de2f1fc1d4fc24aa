//! TLS error types

use std::path::PathBuf;
use thiserror::Error;

pub type TlsResult<T> = Result<T, TlsError>;

#[derive(Debug, Error)]
pub enum TlsError {
    /// File missing or unreadable
    #[error("failed to load certificate material from {path:?}: {source}")]
    CertLoadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File read but holds no usable X.509 certificate
    #[error("failed to parse certificate {path:?}: {reason}")]
    CertParseFailure { path: PathBuf, reason: String },

    #[error("failed to parse private key {path:?}: {reason}")]
    KeyParseFailure { path: PathBuf, reason: String },

    #[error("certificate {path:?} expired at {not_after}")]
    Expired {
        path: PathBuf,
        not_after: chrono::DateTime<chrono::Utc>,
    },

    #[error("TLS transport configuration rejected: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl TlsError {
    /// Path of the offending file, when the error concerns one
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            TlsError::CertLoadFailure { path, .. }
            | TlsError::CertParseFailure { path, .. }
            | TlsError::KeyParseFailure { path, .. }
            | TlsError::Expired { path, .. } => Some(path),
            TlsError::Transport(_) => None,
        }
    }
}
