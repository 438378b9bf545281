//! Public API constants for gridwatch store operations.
//!
//! Tiger Style: Constants are fixed and immutable, enforced at compile time.
//! Each constant has explicit bounds to prevent unbounded resource allocation.

/// Maximum size of a single key in bytes (1 KB).
///
/// Tiger Style: Fixed limit prevents memory exhaustion from oversized keys.
/// Applied to every command before a batch is submitted.
pub const MAX_KEY_SIZE: u32 = 1024;

/// Maximum size of a single value or hash field in bytes (1 MB).
///
/// Tiger Style: Fixed limit prevents memory exhaustion from oversized values.
pub const MAX_VALUE_SIZE: u32 = 1024 * 1024;

/// Maximum number of commands in a single batch (100).
///
/// Batches are meant to be short and non-cancellable; a fixed limit
/// keeps the store's exclusive section bounded.
pub const MAX_BATCH_COMMANDS: u32 = 100;
