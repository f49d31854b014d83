//! Error types for the GPV download and rendering pipeline.

use thiserror::Error;

/// Result type alias using GpvError.
pub type GpvResult<T> = Result<T, GpvError>;

/// Primary error type for the data acquisition pipeline.
///
/// The variants map onto the retry policy of the fetcher: transient
/// network failures and integrity mismatches are retried, HTTP status
/// errors and local filesystem problems abort immediately.
#[derive(Debug, Error)]
pub enum GpvError {
    // === Discovery ===
    #[error("no candidate file found within the lookback window")]
    CandidateNotFound,

    #[error("invalid cycle time: {0}")]
    InvalidCycle(String),

    // === Network ===
    #[error("transient network error: {0}")]
    NetworkTransient(String),

    #[error("HTTP error status: {0}")]
    NetworkFatal(String),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    IntegrityMismatch { expected: u64, actual: u64 },

    // === Local resources ===
    #[error("insufficient disk space: {required} bytes required, {available} available")]
    DiskSpaceInsufficient { required: u64, available: u64 },

    #[error("no local dataset file available")]
    DatasetMissing,

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl GpvError {
    /// Whether the fetcher should retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GpvError::NetworkTransient(_) | GpvError::IntegrityMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(GpvError::NetworkTransient("timeout".into()).is_retryable());
        assert!(GpvError::IntegrityMismatch {
            expected: 10,
            actual: 5
        }
        .is_retryable());
        assert!(!GpvError::NetworkFatal("404 Not Found".into()).is_retryable());
        assert!(!GpvError::DiskSpaceInsufficient {
            required: 100,
            available: 0
        }
        .is_retryable());
    }
}
