use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::model::Timestamped;

/// UTC calendar date (`YYYY-MM-DD`) of a UNIX timestamp.
pub fn utc_day_key(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Group samples by UTC calendar day and keep the `day_count` earliest days.
///
/// Dates are compared as ISO strings, which orders them chronologically.
/// Samples keep their input order within a day.
pub fn bucket_by_day<T: Timestamped>(
    samples: impl IntoIterator<Item = T>,
    day_count: usize,
) -> BTreeMap<String, Vec<T>> {
    let mut buckets: BTreeMap<String, Vec<T>> = BTreeMap::new();

    for sample in samples {
        let Some(day) = utc_day_key(sample.timestamp()) else {
            tracing::debug!(ts = sample.timestamp(), "dropping sample with out-of-range timestamp");
            continue;
        };
        buckets.entry(day).or_default().push(sample);
    }

    // BTreeMap iterates in key order, so this keeps the earliest days.
    buckets.into_iter().take(day_count).collect()
}

/// Buckets for the requested day keys only. Samples on any other day are dropped,
/// and a requested day with no samples has no entry.
pub fn bucket_for_days<T: Timestamped>(
    samples: impl IntoIterator<Item = T>,
    days: &[String],
) -> BTreeMap<String, Vec<T>> {
    let mut buckets = bucket_by_day(samples, usize::MAX);
    buckets.retain(|day, _| days.contains(day));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastSlot;

    fn slot(dt: i64) -> ForecastSlot {
        ForecastSlot { dt, temp: None, wind_ms: None, rain_mm: None }
    }

    // 2024-06-01T00:00:00Z
    const JUNE_1: i64 = 1_717_200_000;
    const DAY: i64 = 86_400;

    #[test]
    fn day_key_is_utc_date() {
        assert_eq!(utc_day_key(JUNE_1).as_deref(), Some("2024-06-01"));
        assert_eq!(utc_day_key(JUNE_1 - 1).as_deref(), Some("2024-05-31"));
        assert_eq!(utc_day_key(JUNE_1 + DAY - 1).as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn groups_slots_into_days() {
        let samples = (0..16).map(|i| slot(JUNE_1 + i * 3 * 3600));
        let buckets = bucket_by_day(samples, 5);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets["2024-06-01"].len(), 8);
        assert_eq!(buckets["2024-06-02"].len(), 8);
    }

    #[test]
    fn keeps_only_the_earliest_days_regardless_of_input_order() {
        let samples = vec![
            slot(JUNE_1 + 3 * DAY),
            slot(JUNE_1 + DAY),
            slot(JUNE_1 + 2 * DAY),
            slot(JUNE_1),
        ];
        let buckets = bucket_by_day(samples, 2);

        let days: Vec<&str> = buckets.keys().map(String::as_str).collect();
        assert_eq!(days, vec!["2024-06-01", "2024-06-02"]);
    }

    #[test]
    fn date_key_matches_timestamp_key() {
        let june_1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(date_key(june_1), utc_day_key(JUNE_1).unwrap());
    }

    #[test]
    fn bucket_for_days_keeps_only_requested_days() {
        let samples = (0..3).map(|i| slot(JUNE_1 + i * DAY));
        let wanted = vec!["2024-05-31".to_string(), "2024-06-02".to_string()];
        let buckets = bucket_for_days(samples, &wanted);

        let days: Vec<&str> = buckets.keys().map(String::as_str).collect();
        assert_eq!(days, vec!["2024-06-02"]);
    }

    #[test]
    fn zero_days_yields_empty_map() {
        assert!(bucket_by_day(vec![slot(JUNE_1)], 0).is_empty());
    }
}
