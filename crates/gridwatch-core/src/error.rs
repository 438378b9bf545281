//! Error types for key-value store operations.
//!
//! Provides explicit error types with actionable context.

use snafu::Snafu;

/// Errors from key-value store operations.
///
/// Infrastructure failures only: absence of a key, field, or record is
/// reported through the command outputs, never as an error.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum KeyValueStoreError {
    /// A command referenced an empty key or field.
    #[snafu(display("key cannot be empty"))]
    EmptyKey,

    /// Key exceeds the fixed size limit.
    #[snafu(display("key size {size} exceeds maximum of {max} bytes"))]
    KeyTooLarge {
        /// Actual key size in bytes.
        size: u32,
        /// Maximum allowed size in bytes.
        max: u32,
    },

    /// Value or hash field exceeds the fixed size limit.
    #[snafu(display("value size {size} exceeds maximum of {max} bytes"))]
    ValueTooLarge {
        /// Actual value size in bytes.
        size: u32,
        /// Maximum allowed size in bytes.
        max: u32,
    },

    /// Batch holds more commands than the fixed limit.
    #[snafu(display("batch size {size} exceeds maximum of {max} commands"))]
    BatchTooLarge {
        /// Actual number of commands.
        size: u32,
        /// Maximum allowed number of commands.
        max: u32,
    },

    /// Batch holds no commands.
    #[snafu(display("batch must contain at least one command"))]
    EmptyBatch,

    /// A sorted-set score was NaN or infinite.
    #[snafu(display("non-finite score for key '{key}'"))]
    NonFiniteScore {
        /// The key the score was destined for.
        key: String,
    },

    /// A command addressed a key holding a different structure.
    #[snafu(display("key '{key}' holds a {actual} value, expected {expected}"))]
    WrongType {
        /// The key that was addressed.
        key: String,
        /// Structure the command expected.
        expected: &'static str,
        /// Structure actually stored.
        actual: &'static str,
    },

    /// Backend-specific failure (store unreachable, transaction aborted).
    #[snafu(display("operation failed: {reason}"))]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_display() {
        assert_eq!(KeyValueStoreError::EmptyKey.to_string(), "key cannot be empty");
    }

    #[test]
    fn key_too_large_display() {
        let err = KeyValueStoreError::KeyTooLarge { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "key size 2048 exceeds maximum of 1024 bytes");
    }

    #[test]
    fn batch_too_large_display() {
        let err = KeyValueStoreError::BatchTooLarge { size: 200, max: 100 };
        assert_eq!(err.to_string(), "batch size 200 exceeds maximum of 100 commands");
    }

    #[test]
    fn wrong_type_display() {
        let err = KeyValueStoreError::WrongType {
            key: "stats".to_string(),
            expected: "hash",
            actual: "sorted set",
        };
        assert_eq!(err.to_string(), "key 'stats' holds a sorted set value, expected hash");
    }

    #[test]
    fn error_equality() {
        let err1 = KeyValueStoreError::EmptyKey;
        let err2 = KeyValueStoreError::EmptyKey;
        let err3 = KeyValueStoreError::EmptyBatch;

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn error_clone() {
        let err = KeyValueStoreError::Failed {
            reason: "connection reset".to_string(),
        };
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
