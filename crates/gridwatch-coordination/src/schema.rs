//! Key naming scheme shared by the coordination primitives.
//!
//! Keys must stay bit-compatible with existing deployments: rate
//! limiter keys are `"<subject>:<limiter-id>"`, site statistics keys
//! are `"sites:stats:<yyyy-mm-dd>:<site-id>"`.

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// Key of a subject's sliding-window event set.
///
/// The limiter id distinguishes independently configured windows over
/// the same subject name.
pub fn rate_limiter_key(subject: &str, limiter_id: &Uuid) -> String {
    format!("{}:{}", subject, limiter_id)
}

/// Key of a site's statistics hash for the day `bucket` falls in.
pub fn site_stats_key(site_id: u64, bucket: &DateTime<Utc>) -> String {
    format!("sites:stats:{}:{}", bucket.format("%Y-%m-%d"), site_id)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn rate_limiter_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            rate_limiter_key("foo", &id),
            "foo:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn site_stats_key_layout() {
        let day = Utc.with_ymd_and_hms(2026, 8, 23, 14, 30, 0).unwrap();
        assert_eq!(site_stats_key(42, &day), "sites:stats:2026-08-23:42");
    }

    #[test]
    fn same_day_timestamps_share_a_bucket() {
        let morning = Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 1).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 8, 23, 23, 59, 59).unwrap();
        assert_eq!(site_stats_key(1, &morning), site_stats_key(1, &evening));
    }

    #[test]
    fn different_days_use_different_buckets() {
        let today = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap();
        assert_ne!(site_stats_key(1, &today), site_stats_key(1, &tomorrow));
    }
}
