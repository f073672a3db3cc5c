use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TravelError};

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO date pattern is valid")
});

/// Geocoded place every downstream fetch is keyed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

/// Unit the upstream reported temperatures in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Kelvin,
    Celsius,
}

impl TemperatureUnit {
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => value - 273.15,
            TemperatureUnit::Celsius => value,
        }
    }
}

/// One 3-hour forecast slot. Any measurement may be missing upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSlot {
    pub dt: i64,
    pub temp: Option<f64>,
    pub wind_ms: Option<f64>,
    pub rain_mm: Option<f64>,
}

/// One hourly air-quality sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AirSample {
    pub dt: i64,
    pub aqi: Option<u8>,
    pub components: BTreeMap<String, f64>,
}

/// Anything the time bucketer can place on a calendar day.
pub trait Timestamped {
    fn timestamp(&self) -> i64;
}

impl Timestamped for ForecastSlot {
    fn timestamp(&self) -> i64 {
        self.dt
    }
}

impl Timestamped for AirSample {
    fn timestamp(&self) -> i64 {
        self.dt
    }
}

/// Canonical per-day weather record, regardless of which upstream path produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: String,
    pub temp_avg_c: Option<f64>,
    pub wind_max_ms: f64,
    pub rain_mm: f64,
}

impl DaySummary {
    /// Placeholder for a day whose upstream fetch failed.
    pub fn missing(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            temp_avg_c: None,
            wind_max_ms: 0.0,
            rain_mm: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirDaySummary {
    pub day: String,
    pub aqi_max: u8,
    pub alerts: Vec<PollutantAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantAlert {
    pub pollutant: String,
    pub value: f64,
    pub good_max: f64,
    /// How far above the "Good" ceiling the value sits.
    pub elevation: f64,
    pub percent_of_good: i64,
    pub risk: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packing {
    Cold,
    Mild,
    Hot,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub umbrella: bool,
    pub packing: Packing,
    pub mean_temp_c: Option<f64>,
}

/// Packing checklist produced by the text-generation provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Which weather path feeds a multi-day advisory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    /// Pre-aggregated per-day summaries (premium tier).
    #[default]
    Daily,
    /// Client-side bucketing of 3-hour slots (free tier).
    Slots,
}

impl WeatherSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherSource::Daily => "daily",
            WeatherSource::Slots => "slots",
        }
    }
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherSource {
    type Err = TravelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "daily" => Ok(WeatherSource::Daily),
            "slots" => Ok(WeatherSource::Slots),
            _ => Err(TravelError::InvalidInput(format!(
                "unknown source '{value}', expected 'daily' or 'slots'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub city: String,
    pub days: u32,
    pub start: Option<NaiveDate>,
    pub source: WeatherSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub days: Vec<DaySummary>,
    pub advice: Advice,
    pub air_alerts: Vec<PollutantAlert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirReport {
    pub location: Location,
    pub days: Vec<AirDaySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub location: Location,
    pub source: WeatherSource,
    pub days: Vec<DaySummary>,
    pub advice: Advice,
    pub air_days: Vec<AirDaySummary>,
    pub checklist: Option<Checklist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReport {
    pub location: Location,
    pub day: DaySummary,
    pub advice: Advice,
}

/// Parse a strict `YYYY-MM-DD` request parameter.
pub fn parse_request_date(raw: &str) -> Result<NaiveDate> {
    if !ISO_DATE.is_match(raw) {
        return Err(TravelError::InvalidInput(format!(
            "date '{raw}' must be formatted as YYYY-MM-DD"
        )));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| TravelError::InvalidInput(format!("date '{raw}' is not a calendar date")))
}

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_freezing_point_is_zero_celsius() {
        assert_eq!(round1(TemperatureUnit::Kelvin.to_celsius(273.15)), 0.0);
        assert_eq!(TemperatureUnit::Celsius.to_celsius(21.5), 21.5);
    }

    #[test]
    fn round1_rounds_half_away_from_zero() {
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(-1.25), -1.3);
        assert_eq!(round1(12.3456), 12.3);
    }

    #[test]
    fn request_date_must_match_strict_pattern() {
        assert_eq!(
            parse_request_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );

        for bad in ["2024-6-1", "24-06-01", "2024-06-01T00:00", " 2024-06-01", ""] {
            assert!(
                matches!(parse_request_date(bad), Err(TravelError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn request_date_must_exist_on_calendar() {
        assert!(matches!(
            parse_request_date("2023-02-30"),
            Err(TravelError::InvalidInput(_))
        ));
    }

    #[test]
    fn weather_source_parses_case_insensitively() {
        assert_eq!("Daily".parse::<WeatherSource>().unwrap(), WeatherSource::Daily);
        assert_eq!("slots".parse::<WeatherSource>().unwrap(), WeatherSource::Slots);
        assert!("hourly".parse::<WeatherSource>().is_err());
    }

    #[test]
    fn missing_day_has_null_temperature_and_zero_defaults() {
        let day = DaySummary::missing("2024-06-02");
        assert_eq!(day.temp_avg_c, None);
        assert_eq!(day.wind_max_ms, 0.0);
        assert_eq!(day.rain_mm, 0.0);
    }
}
