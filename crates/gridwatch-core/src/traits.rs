//! Core trait for gridwatch store access.

use async_trait::async_trait;

use crate::error::KeyValueStoreError;
use crate::kv::BatchRequest;
use crate::kv::BatchResult;

/// Shared key-value store with atomic batch execution.
///
/// A batch's commands are executed as one indivisible unit: no other
/// client's commands interleave with them on the same keys, and the
/// per-command outputs are returned only after the whole unit is
/// acknowledged. Callers that abandon a call mid-flight observe the
/// store as if the batch had completed; there is no partial-batch
/// rollback beyond what the backend's own transaction primitive
/// guarantees.
///
/// Implementations own connection acquisition and release for the
/// duration of one `execute` call, on every exit path.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Execute the batch atomically and return per-command outputs.
    async fn execute(&self, request: BatchRequest) -> Result<BatchResult, KeyValueStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn execute(&self, request: BatchRequest) -> Result<BatchResult, KeyValueStoreError> {
        (**self).execute(request).await
    }
}
