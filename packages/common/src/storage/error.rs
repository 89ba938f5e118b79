use std::fmt;

/// Errors raised by the content-addressed asset store.
#[derive(Debug)]
pub enum StorageError {
    /// No blob is stored under the requested content hash. Usually means the
    /// asset was garbage-collected or the hash came from a stale manifest.
    NotFound(String),
    Io(std::io::Error),
    /// The string is not a well-formed SHA-256 hex hash.
    InvalidHash(String),
    /// The asset is larger than the store's configured maximum.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(hash) => write!(f, "no asset stored under hash {hash}"),
            Self::Io(err) => write!(f, "asset store IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "asset of {actual} bytes exceeds the {limit} byte limit")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
