//! Field normalization for untrusted upstream weather and air records.
//!
//! Day summaries and forecast slots carry the same semantic fields under
//! different keys. Each field has a table of candidate paths, tried in order;
//! the first numeric hit wins.

use serde_json::Value;

use crate::model::{AirSample, DaySummary, ForecastSlot, round1};

/// A way of reading one numeric field out of a JSON record.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    Path(&'static [&'static str]),
    /// Midpoint of two sibling values, both of which must be present.
    Midpoint(&'static [&'static str], &'static [&'static str]),
}

impl Probe {
    fn read(&self, raw: &Value) -> Option<f64> {
        match self {
            Probe::Path(path) => number_at(raw, path),
            Probe::Midpoint(low, high) => {
                let low = number_at(raw, low)?;
                let high = number_at(raw, high)?;
                Some((low + high) / 2.0)
            }
        }
    }
}

pub const TEMPERATURE: &[Probe] = &[
    Probe::Path(&["temp_avg_c"]),
    Probe::Path(&["temperature", "day"]),
    Probe::Path(&["temperature", "average"]),
    Probe::Midpoint(&["temperature", "min"], &["temperature", "max"]),
    Probe::Path(&["main", "temp"]),
];

pub const WIND: &[Probe] = &[
    Probe::Path(&["wind_max_ms"]),
    Probe::Path(&["wind", "max", "speed"]),
    Probe::Path(&["wind", "speed"]),
];

pub const RAIN: &[Probe] = &[
    Probe::Path(&["rain_mm"]),
    Probe::Path(&["precipitation", "total"]),
    Probe::Path(&["rain", "total"]),
    Probe::Path(&["rain", "3h"]),
    Probe::Path(&["rain", "1h"]),
];

fn number_at(raw: &Value, path: &[&str]) -> Option<f64> {
    path.iter()
        .try_fold(raw, |node, key| node.get(key))?
        .as_f64()
}

/// First value any probe in `table` can read from `raw`.
pub fn probe(raw: &Value, table: &[Probe]) -> Option<f64> {
    table.iter().find_map(|p| p.read(raw))
}

/// Normalize an already-aggregated day record into a [`DaySummary`].
///
/// Temperatures are expected in Celsius (day summaries are requested with
/// metric units). A missing temperature stays `None`; missing wind or rain
/// means none was observed.
pub fn normalize_day(raw: &Value, day: &str) -> DaySummary {
    DaySummary {
        day: day.to_string(),
        temp_avg_c: probe(raw, TEMPERATURE).map(round1),
        wind_max_ms: round1(probe(raw, WIND).unwrap_or(0.0)),
        rain_mm: round1(probe(raw, RAIN).unwrap_or(0.0)),
    }
}

/// Read one forecast slot. Slots without a timestamp cannot be bucketed and are skipped.
pub fn normalize_slot(raw: &Value) -> Option<ForecastSlot> {
    Some(ForecastSlot {
        dt: raw.get("dt")?.as_i64()?,
        temp: probe(raw, TEMPERATURE),
        wind_ms: probe(raw, WIND),
        rain_mm: probe(raw, RAIN),
    })
}

/// Read one hourly air-quality sample, keeping only numeric components.
pub fn normalize_air_sample(raw: &Value) -> Option<AirSample> {
    let dt = raw.get("dt")?.as_i64()?;
    let aqi = raw
        .get("main")
        .and_then(|m| m.get("aqi"))
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok());

    let components = raw
        .get("components")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default();

    Some(AirSample { dt, aqi, components })
}
