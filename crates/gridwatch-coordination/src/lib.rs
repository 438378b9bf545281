//! Store-mediated coordination primitives for gridwatch.
//!
//! This crate provides two primitives that use a shared key-value
//! store as the single source of truth for concurrent clients:
//!
//! - [`SlidingWindowLimiter`] - bounds the hits a subject may register
//!   within a trailing time window
//! - [`SiteStatsAggregator`] - maintains running min/max/count
//!   statistics per site per day under concurrent writers
//!
//! Both are stateless between calls and hold no in-process lock; all
//! ordering guarantees come from the store's atomic batch execution
//! through the [`gridwatch_core::KeyValueStore`] trait.
//!
//! ## Rate Limiter Example
//!
//! ```ignore
//! use gridwatch_coordination::{SlidingWindowConfig, SlidingWindowLimiter};
//!
//! let limiter = SlidingWindowLimiter::new(store, SlidingWindowConfig::new(60, 10));
//!
//! match limiter.hit("api-client-7").await {
//!     Ok(()) => { /* admit the request */ }
//!     Err(e) if e.is_limit_exceeded() => { /* deny, window is full */ }
//!     Err(e) => { /* storage failure: fail open or closed, caller's choice */ }
//! }
//! ```
//!
//! ## Statistics Example
//!
//! ```ignore
//! use gridwatch_coordination::SiteStatsAggregator;
//!
//! let stats = SiteStatsAggregator::new(store);
//! stats.update(&reading).await?;
//!
//! if let Some(today) = stats.find_current(reading.site_id).await? {
//!     println!("{} readings so far", today.meter_reading_count);
//! }
//! ```

mod error;
mod rate_limiter;
pub mod schema;
mod site_stats;
mod types;

pub use error::AggregationError;
pub use error::RateLimitError;
pub use rate_limiter::SlidingWindowConfig;
pub use rate_limiter::SlidingWindowLimiter;
pub use site_stats::STATS_RETENTION_SECONDS;
pub use site_stats::SiteStatsAggregator;
pub use types::COUNT_FIELD;
pub use types::MAX_CAPACITY_FIELD;
pub use types::MAX_WH_FIELD;
pub use types::MIN_WH_FIELD;
pub use types::MeterReading;
pub use types::REPORTING_TIME_FIELD;
pub use types::SiteStats;
