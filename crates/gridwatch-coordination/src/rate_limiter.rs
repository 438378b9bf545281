//! Sliding-window rate limiter backed by the shared store.
//!
//! Tracks timestamped events per subject in a sorted set and enforces
//! the limit with one atomic insert+prune+count batch per hit. All
//! coordination happens in the store; concurrent callers never share
//! in-process state.

use std::sync::Arc;

use gridwatch_core::BatchRequest;
use gridwatch_core::KeyValueStore;
use gridwatch_core::StoreCommand;
use gridwatch_core::now_unix_ms;
use tracing::debug;
use uuid::Uuid;

use crate::error::RateLimitError;
use crate::schema;

/// Configuration for the sliding-window rate limiter.
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindowConfig {
    /// Length of the trailing window in seconds.
    pub window_seconds: u32,
    /// Maximum hits allowed within the window.
    pub max_hits: u64,
}

impl SlidingWindowConfig {
    /// Create a config for `max_hits` hits per `window_seconds` window.
    pub fn new(window_seconds: u32, max_hits: u64) -> Self {
        // Tiger Style: argument validation
        assert!(window_seconds > 0, "LIMITER: window_seconds must be positive");
        assert!(max_hits > 0, "LIMITER: max_hits must be positive");
        Self {
            window_seconds,
            max_hits,
        }
    }
}

/// Sliding-window rate limiter over a shared key-value store.
///
/// Each limiter instance gets its own identity, so two limiters over
/// the same subject name maintain independent windows. The limiter is
/// window-accurate rather than call-serialized: each `hit` observes
/// its own insert plus whatever concurrent inserts the store ordered
/// before it.
pub struct SlidingWindowLimiter<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    config: SlidingWindowConfig,
    limiter_id: Uuid,
}

impl<S: KeyValueStore + ?Sized> SlidingWindowLimiter<S> {
    /// Create a new limiter with a fresh instance identity.
    pub fn new(store: Arc<S>, config: SlidingWindowConfig) -> Self {
        Self {
            store,
            config,
            limiter_id: Uuid::new_v4(),
        }
    }

    /// This limiter's instance identity (part of its keys).
    pub fn limiter_id(&self) -> Uuid {
        self.limiter_id
    }

    /// Register a hit for `subject`.
    ///
    /// Issues one atomic batch: insert an event scored with the
    /// current epoch-millisecond time, evict everything that has aged
    /// out of the window, and count the survivors. If the count
    /// exceeds the configured maximum the call fails with
    /// [`RateLimitError::LimitExceeded`], but the event has already
    /// been recorded, so a rejected caller still consumes a slot in
    /// the window and retrying inside the window cannot bypass the
    /// limit.
    ///
    /// Store failures surface as
    /// [`RateLimitError::StorageUnavailable`], never as a limit
    /// decision.
    pub async fn hit(&self, subject: &str) -> Result<(), RateLimitError> {
        let now_ms = now_unix_ms();
        let key = schema::rate_limiter_key(subject, &self.limiter_id);
        // Unique member per event: same-millisecond hits never collide.
        let member = format!("{}:{}", subject, Uuid::new_v4());
        let window_ms = u64::from(self.config.window_seconds) * 1000;
        let cutoff_ms = now_ms.saturating_sub(window_ms);

        let batch = BatchRequest::new(vec![
            StoreCommand::SortedSetAdd {
                key: key.clone(),
                score: now_ms as f64,
                member,
            },
            StoreCommand::SortedSetRemoveRangeByScore {
                key: key.clone(),
                min: f64::NEG_INFINITY,
                max: cutoff_ms as f64,
            },
            StoreCommand::SortedSetCard { key: key.clone() },
        ]);

        let result = match self.store.execute(batch).await {
            Ok(result) => result,
            Err(e) => {
                // Storage unavailable - return distinct error for caller to handle
                return Err(RateLimitError::StorageUnavailable { reason: e.to_string() });
            }
        };

        let hits = result
            .integer(2)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| RateLimitError::StorageUnavailable {
                reason: format!("missing cardinality reply for key '{key}'"),
            })?;

        if hits > self.config.max_hits {
            debug!(
                subject = %subject,
                hits,
                max_hits = self.config.max_hits,
                "hit rejected, window full"
            );
            return Err(RateLimitError::LimitExceeded {
                subject: subject.to_string(),
                hits,
                max_hits: self.config.max_hits,
            });
        }

        debug!(
            subject = %subject,
            hits,
            max_hits = self.config.max_hits,
            "hit recorded"
        );
        Ok(())
    }
}
