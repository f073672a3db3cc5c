use std::collections::BTreeMap;

use crate::{
    advice::air_alerts,
    model::{AirDaySummary, AirSample, DaySummary, ForecastSlot, TemperatureUnit, round1},
};

/// Reduce one day's forecast slots to a [`DaySummary`].
pub fn aggregate(day: &str, bucket: &[ForecastSlot], unit: TemperatureUnit) -> DaySummary {
    let temps: Vec<f64> = bucket.iter().filter_map(|s| s.temp).collect();
    let temp_avg_c = if temps.is_empty() {
        None
    } else {
        let mean = temps.iter().sum::<f64>() / temps.len() as f64;
        Some(round1(unit.to_celsius(mean)))
    };

    let wind_max = bucket
        .iter()
        .filter_map(|s| s.wind_ms)
        .fold(0.0_f64, f64::max);
    let rain_total: f64 = bucket.iter().map(|s| s.rain_mm.unwrap_or(0.0)).sum();

    DaySummary {
        day: day.to_string(),
        temp_avg_c,
        wind_max_ms: round1(wind_max),
        rain_mm: round1(rain_total),
    }
}

/// One summary per requested day, in the order given.
///
/// A day with no bucket is emitted as [`DaySummary::missing`].
pub fn aggregate_days(
    buckets: &BTreeMap<String, Vec<ForecastSlot>>,
    days: &[String],
    unit: TemperatureUnit,
) -> Vec<DaySummary> {
    days.iter()
        .map(|day| match buckets.get(day) {
            Some(slots) => aggregate(day, slots, unit),
            None => {
                tracing::debug!(%day, "no forecast slots for day");
                DaySummary::missing(day.as_str())
            }
        })
        .collect()
}

/// Highest concentration seen per pollutant across a day's samples.
pub fn max_components(bucket: &[AirSample]) -> BTreeMap<String, f64> {
    let mut maxima: BTreeMap<String, f64> = BTreeMap::new();
    for sample in bucket {
        for (name, value) in &sample.components {
            maxima
                .entry(name.clone())
                .and_modify(|m| *m = m.max(*value))
                .or_insert(*value);
        }
    }
    maxima
}

/// Reduce air buckets to per-day AQI maxima and threshold alerts.
pub fn aggregate_air_days(buckets: BTreeMap<String, Vec<AirSample>>) -> Vec<AirDaySummary> {
    let days: Vec<String> = buckets.keys().cloned().collect();
    let maxima: Vec<BTreeMap<String, f64>> = buckets.values().map(|b| max_components(b)).collect();
    let aqi: Vec<u8> = buckets
        .values()
        .map(|b| b.iter().filter_map(|s| s.aqi).max().unwrap_or(0))
        .collect();

    days.into_iter()
        .zip(aqi)
        .zip(air_alerts(&maxima))
        .map(|((day, aqi_max), alerts)| AirDaySummary { day, aqi_max, alerts })
        .collect()
}
