use crate::verification::{DigestParseError, Sha256Digest};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A request that can never succeed as written. Detected before any network
/// activity.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Repository key `{key}` must have the form owner/repo")]
    InvalidKey { key: String },

    #[error("Request for {key} has an empty {field}")]
    EmptyField { key: String, field: &'static str },

    #[error(transparent)]
    InvalidDigest(#[from] DigestParseError),

    #[error("Invalid source host `{host}`: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Destination {} is targeted by more than one request", path.display())]
    DuplicateDestination { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Response body ended after {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single fetch did not succeed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    Verification {
        expected: Sha256Digest,
        actual: Sha256Digest,
    },

    #[error("Local I/O error at {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch was cancelled")]
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Validation,
    Transport,
    Verification,
    LocalIo,
    Cancelled,
}

impl FetchError {
    pub fn local_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        FetchError::LocalIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Validation(_) => FetchErrorKind::Validation,
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::Verification { .. } => FetchErrorKind::Verification,
            FetchError::LocalIo { .. } => FetchErrorKind::LocalIo,
            FetchError::Cancelled => FetchErrorKind::Cancelled,
        }
    }

    /// Transport failures and digest mismatches may go away on a fresh
    /// download. Everything else is final for the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            FetchErrorKind::Transport | FetchErrorKind::Verification
        )
    }
}
