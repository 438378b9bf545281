//! Core types and traits for gridwatch store access.
//!
//! This crate provides the foundational pieces shared by gridwatch
//! coordination primitives: the batched [`KeyValueStore`] trait, the
//! command/output types it speaks, fixed resource limits, and a
//! deterministic in-memory backend for tests.
//!
//! # Key Components
//!
//! - **Traits**: [`KeyValueStore`]
//! - **Types**: [`StoreCommand`], [`CommandOutput`], [`BatchRequest`], [`BatchResult`]
//! - **Constants**: fixed size limits applied before batch submission
//! - **Testing**: [`memory::MemoryKeyValueStore`]

pub mod constants;
pub mod error;
pub mod kv;
pub mod memory;
pub mod time;
pub mod traits;

// Re-export all public types at crate root for convenience

// Constants
pub use constants::MAX_BATCH_COMMANDS;
pub use constants::MAX_KEY_SIZE;
pub use constants::MAX_VALUE_SIZE;
// Error types
pub use error::KeyValueStoreError;
// KV types
pub use kv::BatchRequest;
pub use kv::BatchResult;
pub use kv::CommandOutput;
pub use kv::StoreCommand;
pub use kv::validate_batch;
// In-memory deterministic implementation for testing
pub use memory::MemoryKeyValueStore;
// Clock
pub use time::now_unix_ms;
// Traits
pub use traits::KeyValueStore;
