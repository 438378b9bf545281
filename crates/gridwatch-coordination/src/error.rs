//! Error types for coordination primitives.

use std::fmt;

use gridwatch_core::KeyValueStoreError;
use snafu::Snafu;

/// Errors from site statistics aggregation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AggregationError {
    /// Data in storage is corrupted or unparseable.
    #[snafu(display("corrupted data in key '{key}': {reason}"))]
    CorruptedData {
        /// The key with corrupted data.
        key: String,
        /// Description of what went wrong.
        reason: String,
    },

    /// The store acknowledged a batch but returned outputs of an
    /// unexpected shape.
    #[snafu(display("malformed reply from store during {operation}"))]
    MalformedReply {
        /// Description of the operation.
        operation: String,
    },

    /// Underlying storage error.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying error.
        source: KeyValueStoreError,
    },
}

impl From<KeyValueStoreError> for AggregationError {
    fn from(source: KeyValueStoreError) -> Self {
        AggregationError::Storage { source }
    }
}

/// Error when rate limited or unable to check the rate limit.
///
/// Distinguishes between the expected business outcome (the window is
/// full) and storage failures (the limit state cannot be determined).
/// Callers branch on `LimitExceeded` routinely; fail-open versus
/// fail-closed on `StorageUnavailable` is a deployment decision.
#[derive(Debug, Clone)]
pub enum RateLimitError {
    /// The subject's window is full; the hit was rejected.
    LimitExceeded {
        /// The rate-limited subject.
        subject: String,
        /// Hits currently recorded in the window, including this one.
        hits: u64,
        /// Maximum hits allowed in the window.
        max_hits: u64,
    },
    /// Storage unavailable, rate limit state cannot be determined.
    StorageUnavailable {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl RateLimitError {
    /// Returns true for the expected limit-exceeded outcome.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, RateLimitError::LimitExceeded { .. })
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::LimitExceeded { subject, hits, max_hits } => write!(
                f,
                "rate limit exceeded for '{}': {} hits in window (max {})",
                subject, hits, max_hits
            ),
            RateLimitError::StorageUnavailable { reason } => {
                write!(f, "rate limiter storage unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_exceeded_display() {
        let err = RateLimitError::LimitExceeded {
            subject: "foo".to_string(),
            hits: 6,
            max_hits: 5,
        };
        assert_eq!(err.to_string(), "rate limit exceeded for 'foo': 6 hits in window (max 5)");
        assert!(err.is_limit_exceeded());
    }

    #[test]
    fn storage_unavailable_display() {
        let err = RateLimitError::StorageUnavailable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rate limiter storage unavailable: connection refused"
        );
        assert!(!err.is_limit_exceeded());
    }

    #[test]
    fn corrupted_data_display() {
        let err = AggregationError::CorruptedData {
            key: "sites:stats:2026-08-23:1".to_string(),
            reason: "invalid float in field 'max_wh_generated'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupted data in key 'sites:stats:2026-08-23:1': invalid float in field 'max_wh_generated'"
        );
    }

    #[test]
    fn storage_error_wraps_source() {
        let err: AggregationError = KeyValueStoreError::EmptyKey.into();
        assert_eq!(err.to_string(), "storage error: key cannot be empty");
    }
}
