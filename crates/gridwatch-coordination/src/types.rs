//! Shared types for coordination primitives.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::AggregationError;

/// Hash field holding the last reporting time (RFC 3339 UTC).
pub const REPORTING_TIME_FIELD: &str = "last_reporting_time";
/// Hash field holding the number of readings recorded for the bucket.
pub const COUNT_FIELD: &str = "meter_reading_count";
/// Hash field holding the largest generated amount seen in the bucket.
pub const MAX_WH_FIELD: &str = "max_wh_generated";
/// Hash field holding the smallest generated amount seen in the bucket.
pub const MIN_WH_FIELD: &str = "min_wh_generated";
/// Hash field holding the largest derived capacity seen in the bucket.
pub const MAX_CAPACITY_FIELD: &str = "max_capacity";

/// A single meter reading reported by a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeterReading {
    /// The reporting site.
    pub site_id: u64,
    /// When the reading was taken; derives the statistics bucket.
    pub timestamp: DateTime<Utc>,
    /// Watt-hours generated.
    pub wh_generated: f64,
    /// Watt-hours used.
    pub wh_used: f64,
}

impl MeterReading {
    /// Capacity headroom this reading demonstrates: generated minus used.
    pub fn current_capacity(&self) -> f64 {
        self.wh_generated - self.wh_used
    }
}

/// Running statistics for one site over one day bucket.
///
/// Extremum fields are absent until the first reading lands in the
/// bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteStats {
    /// Last time any writer recorded a reading (last-write-wins).
    pub last_reporting_time: Option<DateTime<Utc>>,
    /// Number of readings recorded; never decreases.
    pub meter_reading_count: i64,
    /// Smallest generated amount observed.
    pub min_wh_generated: Option<f64>,
    /// Largest generated amount observed.
    pub max_wh_generated: Option<f64>,
    /// Largest derived capacity observed.
    pub max_capacity: Option<f64>,
}

impl SiteStats {
    /// Reconstruct stats from the stored hash fields.
    ///
    /// `key` is used for error context only.
    pub fn from_fields(key: &str, fields: &BTreeMap<String, String>) -> Result<Self, AggregationError> {
        let corrupted = |reason: String| AggregationError::CorruptedData {
            key: key.to_string(),
            reason,
        };

        let last_reporting_time = fields
            .get(REPORTING_TIME_FIELD)
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| corrupted(format!("invalid timestamp in field '{REPORTING_TIME_FIELD}'")))
            })
            .transpose()?;

        let meter_reading_count = fields
            .get(COUNT_FIELD)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| corrupted(format!("invalid integer in field '{COUNT_FIELD}'")))
            })
            .transpose()?
            .unwrap_or(0);

        let parse_float = |field: &str| {
            fields
                .get(field)
                .map(|raw| {
                    raw.parse::<f64>()
                        .map_err(|_| corrupted(format!("invalid float in field '{field}'")))
                })
                .transpose()
        };

        Ok(Self {
            last_reporting_time,
            meter_reading_count,
            min_wh_generated: parse_float(MIN_WH_FIELD)?,
            max_wh_generated: parse_float(MAX_WH_FIELD)?,
            max_capacity: parse_float(MAX_CAPACITY_FIELD)?,
        })
    }
}
