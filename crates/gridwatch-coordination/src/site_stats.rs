//! Optimistic per-site statistics aggregation.
//!
//! Maintains running min/max/count statistics per site per day bucket
//! in a shared hash, tolerating concurrent writers through a two-phase
//! read-then-conditional-write protocol instead of a lock service.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use gridwatch_core::BatchRequest;
use gridwatch_core::KeyValueStore;
use gridwatch_core::StoreCommand;
use tracing::debug;

use crate::error::AggregationError;
use crate::schema;
use crate::types::COUNT_FIELD;
use crate::types::MAX_CAPACITY_FIELD;
use crate::types::MAX_WH_FIELD;
use crate::types::MIN_WH_FIELD;
use crate::types::MeterReading;
use crate::types::REPORTING_TIME_FIELD;
use crate::types::SiteStats;

/// How long a statistics bucket lives after its last update (one week).
pub const STATS_RETENTION_SECONDS: u32 = 60 * 60 * 24 * 7;

/// Aggregates meter readings into per-site, per-day statistics.
///
/// Stateless between calls; every invariant lives in the store.
pub struct SiteStatsAggregator<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> SiteStatsAggregator<S> {
    /// Create a new aggregator over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fold a reading into its site's statistics bucket.
    ///
    /// Two atomic batches. The first unconditionally advances the
    /// monotonic fields (reporting time, reading count, retention
    /// deadline) and reads
    /// back the extrema as of transaction time. The second writes only
    /// the extrema this reading improves on, re-derived from that
    /// snapshot rather than mutated in place; when nothing improves,
    /// no second batch is issued.
    ///
    /// Between the two batches another writer's second phase can
    /// interleave, so under contention a stored extremum can
    /// transiently regress to an older value. Count and reporting
    /// time are exact under all interleavings.
    pub async fn update(&self, reading: &MeterReading) -> Result<(), AggregationError> {
        let key = schema::site_stats_key(reading.site_id, &reading.timestamp);
        let reported_at = Utc::now().to_rfc3339();

        let snapshot = self
            .store
            .execute(BatchRequest::new(vec![
                StoreCommand::HashSet {
                    key: key.clone(),
                    field: REPORTING_TIME_FIELD.to_string(),
                    value: reported_at,
                },
                StoreCommand::HashIncrBy {
                    key: key.clone(),
                    field: COUNT_FIELD.to_string(),
                    delta: 1,
                },
                StoreCommand::Expire {
                    key: key.clone(),
                    ttl_seconds: STATS_RETENTION_SECONDS,
                },
                StoreCommand::HashGet {
                    key: key.clone(),
                    field: MAX_WH_FIELD.to_string(),
                },
                StoreCommand::HashGet {
                    key: key.clone(),
                    field: MIN_WH_FIELD.to_string(),
                },
                StoreCommand::HashGet {
                    key: key.clone(),
                    field: MAX_CAPACITY_FIELD.to_string(),
                },
            ]))
            .await?;

        let max_wh = read_float(snapshot.value(3), &key, MAX_WH_FIELD)?;
        let min_wh = read_float(snapshot.value(4), &key, MIN_WH_FIELD)?;
        let max_capacity = read_float(snapshot.value(5), &key, MAX_CAPACITY_FIELD)?;

        let mut writes = Vec::new();
        if max_wh.is_none_or(|current| reading.wh_generated > current) {
            writes.push(StoreCommand::HashSet {
                key: key.clone(),
                field: MAX_WH_FIELD.to_string(),
                value: reading.wh_generated.to_string(),
            });
        }
        if min_wh.is_none_or(|current| reading.wh_generated < current) {
            writes.push(StoreCommand::HashSet {
                key: key.clone(),
                field: MIN_WH_FIELD.to_string(),
                value: reading.wh_generated.to_string(),
            });
        }
        let capacity = reading.current_capacity();
        if max_capacity.is_none_or(|current| capacity > current) {
            writes.push(StoreCommand::HashSet {
                key: key.clone(),
                field: MAX_CAPACITY_FIELD.to_string(),
                value: capacity.to_string(),
            });
        }

        let fields_written = writes.len();
        if !writes.is_empty() {
            self.store.execute(BatchRequest::new(writes)).await?;
        }

        debug!(
            site_id = reading.site_id,
            key = %key,
            fields_written,
            "meter reading aggregated"
        );
        Ok(())
    }

    /// Fetch a site's statistics for the day `bucket` falls in.
    ///
    /// A bucket that never received a reading is `Ok(None)`, not an
    /// error.
    pub async fn find_by_id(
        &self,
        site_id: u64,
        bucket: &DateTime<Utc>,
    ) -> Result<Option<SiteStats>, AggregationError> {
        let key = schema::site_stats_key(site_id, bucket);
        let result = self
            .store
            .execute(BatchRequest::single(StoreCommand::HashGetAll { key: key.clone() }))
            .await?;

        let fields = result
            .fields(0)
            .ok_or_else(|| AggregationError::MalformedReply {
                operation: format!("find_by_id for key '{key}'"),
            })?;
        if fields.is_empty() {
            return Ok(None);
        }
        SiteStats::from_fields(&key, fields).map(Some)
    }

    /// Fetch a site's statistics for the current UTC day.
    pub async fn find_current(&self, site_id: u64) -> Result<Option<SiteStats>, AggregationError> {
        self.find_by_id(site_id, &Utc::now()).await
    }
}

/// Parse a snapshot field reply as a float; absence is `Ok(None)`.
fn read_float(
    reply: Option<Option<&str>>,
    key: &str,
    field: &str,
) -> Result<Option<f64>, AggregationError> {
    let value = reply.ok_or_else(|| AggregationError::MalformedReply {
        operation: format!("snapshot read of field '{field}' for key '{key}'"),
    })?;
    value
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| AggregationError::CorruptedData {
                key: key.to_string(),
                reason: format!("invalid float in field '{field}'"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use gridwatch_core::BatchResult;
    use gridwatch_core::KeyValueStoreError;
    use gridwatch_core::MemoryKeyValueStore;

    use super::*;

    /// Store whose every batch fails, as if the backend were down.
    struct UnreachableStore;

    #[async_trait]
    impl KeyValueStore for UnreachableStore {
        async fn execute(&self, _request: BatchRequest) -> Result<BatchResult, KeyValueStoreError> {
            Err(KeyValueStoreError::Failed {
                reason: "connection reset".to_string(),
            })
        }
    }

    fn reading(site_id: u64, wh_generated: f64, wh_used: f64) -> MeterReading {
        MeterReading {
            site_id,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap(),
            wh_generated,
            wh_used,
        }
    }

    #[tokio::test]
    async fn absent_bucket_is_none() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        let bucket = Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap();
        assert_eq!(stats.find_by_id(1, &bucket).await.unwrap(), None);
    }

    #[tokio::test]
    async fn first_reading_creates_record() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        let r = reading(1, 5.0, 2.0);
        stats.update(&r).await.unwrap();

        let found = stats.find_by_id(1, &r.timestamp).await.unwrap().unwrap();
        assert_eq!(found.meter_reading_count, 1);
        assert_eq!(found.min_wh_generated, Some(5.0));
        assert_eq!(found.max_wh_generated, Some(5.0));
        assert_eq!(found.max_capacity, Some(3.0));
        assert!(found.last_reporting_time.is_some());
    }

    #[tokio::test]
    async fn extrema_settle_regardless_of_order() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        for wh in [5.0, 9.0, 3.0] {
            stats.update(&reading(1, wh, 1.0)).await.unwrap();
        }

        let found = stats
            .find_by_id(1, &reading(1, 0.0, 0.0).timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.meter_reading_count, 3);
        assert_eq!(found.max_wh_generated, Some(9.0));
        assert_eq!(found.min_wh_generated, Some(3.0));
        assert_eq!(found.max_capacity, Some(8.0));
    }

    #[tokio::test]
    async fn repeated_reading_counts_twice() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        let r = reading(1, 4.0, 1.0);
        stats.update(&r).await.unwrap();
        stats.update(&r).await.unwrap();

        let found = stats.find_by_id(1, &r.timestamp).await.unwrap().unwrap();
        assert_eq!(found.meter_reading_count, 2);
        assert_eq!(found.min_wh_generated, Some(4.0));
        assert_eq!(found.max_wh_generated, Some(4.0));
    }

    #[tokio::test]
    async fn sites_and_days_bucket_independently() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        let monday = MeterReading {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap(),
            ..reading(1, 5.0, 1.0)
        };
        let tuesday = MeterReading {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 25, 9, 0, 0).unwrap(),
            ..reading(1, 8.0, 1.0)
        };
        stats.update(&monday).await.unwrap();
        stats.update(&tuesday).await.unwrap();
        stats.update(&MeterReading { site_id: 2, ..monday.clone() }).await.unwrap();

        let mon = stats.find_by_id(1, &monday.timestamp).await.unwrap().unwrap();
        let tue = stats.find_by_id(1, &tuesday.timestamp).await.unwrap().unwrap();
        assert_eq!(mon.meter_reading_count, 1);
        assert_eq!(mon.max_wh_generated, Some(5.0));
        assert_eq!(tue.meter_reading_count, 1);
        assert_eq!(tue.max_wh_generated, Some(8.0));
    }

    #[tokio::test]
    async fn concurrent_updates_keep_count_exact() {
        let store = MemoryKeyValueStore::new();
        let stats = Arc::new(SiteStatsAggregator::new(store));

        let updates = (0..20).map(|i| {
            let stats = Arc::clone(&stats);
            tokio::spawn(async move { stats.update(&reading(1, f64::from(i), 1.0)).await })
        });
        for result in futures::future::join_all(updates).await {
            result.expect("task panicked").unwrap();
        }

        let found = stats
            .find_by_id(1, &reading(1, 0.0, 0.0).timestamp)
            .await
            .unwrap()
            .unwrap();
        // Monotonic fields are exact under interleaving; extrema land
        // within the submitted value set.
        assert_eq!(found.meter_reading_count, 20);
        let max = found.max_wh_generated.unwrap();
        let min = found.min_wh_generated.unwrap();
        assert!((0.0..=19.0).contains(&max));
        assert!((0.0..=19.0).contains(&min));
        assert!(min <= max);
    }

    #[tokio::test]
    async fn find_current_reads_todays_bucket() {
        let store = MemoryKeyValueStore::new();
        let stats = SiteStatsAggregator::new(store);

        let r = MeterReading {
            timestamp: Utc::now(),
            ..reading(7, 6.0, 2.0)
        };
        stats.update(&r).await.unwrap();

        let found = stats.find_current(7).await.unwrap().unwrap();
        assert_eq!(found.meter_reading_count, 1);
        assert_eq!(found.max_wh_generated, Some(6.0));
        assert_eq!(found.max_capacity, Some(4.0));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_storage_error() {
        let stats = SiteStatsAggregator::new(Arc::new(UnreachableStore));

        let err = stats.update(&reading(1, 1.0, 0.5)).await.unwrap_err();
        assert!(matches!(err, AggregationError::Storage { .. }));

        let err = stats.find_current(1).await.unwrap_err();
        assert!(matches!(err, AggregationError::Storage { .. }));
    }

    #[tokio::test]
    async fn corrupted_count_surfaces_as_error() {
        let store = MemoryKeyValueStore::new();
        let key = schema::site_stats_key(1, &Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap());
        store
            .execute(BatchRequest::single(StoreCommand::HashSet {
                key,
                field: COUNT_FIELD.to_string(),
                value: "many".to_string(),
            }))
            .await
            .unwrap();

        let stats = SiteStatsAggregator::new(store);
        let err = stats
            .find_by_id(1, &Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregationError::CorruptedData { .. }));
    }
}
