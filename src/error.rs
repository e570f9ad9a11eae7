//! Error types for the annotated disk cache.
//!
//! Storage and cache operations report [`CacheError`]; the token index wraps
//! whatever its backing mapping reported into a single [`IndexError`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing the store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another edit is outstanding for the same internal key.
    ///
    /// This is transient; the caller may retry once the other writer is done.
    #[error("concurrent edit in progress for key '{key}'")]
    ConcurrentEdit { key: String },

    /// The directory is already in use by a live cache instance.
    #[error("cache directory '{}' was used before", .0.display())]
    DuplicateDirectory(PathBuf),

    /// A stored payload or metadata slot could not be reconstructed.
    #[error("decode error: {0}")]
    Decode(String),

    /// A value or metadata map could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The store has been closed.
    #[error("cache is closed")]
    Closed,

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::ConcurrentEdit { .. })
    }
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failure raised by the token index while indexing or searching.
///
/// Carries the underlying mapping failure as its source. After an
/// `IndexError` the affected token's stored set may be stale.
#[derive(Debug, Error)]
#[error("index failure: {source}")]
pub struct IndexError {
    #[from]
    source: CacheError,
}

impl IndexError {
    /// The mapping failure that caused this error.
    pub fn cause(&self) -> &CacheError {
        &self.source
    }

    /// Unwrap into the mapping failure.
    pub fn into_cause(self) -> CacheError {
        self.source
    }
}

/// A specialized Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = CacheError::ConcurrentEdit {
            key: "abc".to_string(),
        };
        assert_eq!(format!("{}", err), "concurrent edit in progress for key 'abc'");

        let err = CacheError::DuplicateDirectory(PathBuf::from("/tmp/cache"));
        assert_eq!(format!("{}", err), "cache directory '/tmp/cache' was used before");

        assert_eq!(format!("{}", CacheError::Closed), "cache is closed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let cache_err: CacheError = io_err.into();
        assert!(matches!(cache_err, CacheError::Io(_)));
        assert!(cache_err.source().is_some());
    }

    #[test]
    fn test_only_concurrent_edit_is_retryable() {
        assert!(CacheError::ConcurrentEdit { key: "k".into() }.is_retryable());
        assert!(!CacheError::Closed.is_retryable());
        assert!(!CacheError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn test_index_error_carries_cause() {
        let err = IndexError::from(CacheError::Closed);
        assert!(matches!(err.cause(), CacheError::Closed));
        assert_eq!(format!("{}", err), "index failure: cache is closed");
        assert!(err.source().is_some());
    }
}
