//! Request-scoped sequencing of geocoding, upstream fetches, aggregation and advice.

use chrono::{Days, NaiveDate, Utc};
use futures::future::join_all;

use crate::{
    Config,
    advice::{packing_advice, pollution_alerts},
    aggregate::{aggregate_air_days, aggregate_days, max_components},
    bucket::{bucket_for_days, date_key},
    checklist::{SYSTEM_PROMPT, build_prompt, parse_checklist},
    error::{Result, TravelError},
    geocode::resolve,
    model::{
        Advisory, AdvisoryRequest, AirDaySummary, AirReport, Checklist, DayReport, DaySummary,
        Location, TemperatureUnit, WeatherReport, WeatherSource,
    },
    normalize::normalize_day,
    provider::{
        TextGenerator, WeatherProvider, http_client, text_generator_from_config,
        weather_provider_from_config,
    },
};

/// Longest horizon of the free 3-hour forecast and the air-pollution forecast.
pub const MAX_FORECAST_DAYS: u32 = 5;
pub const MAX_ADVISORY_DAYS: u32 = 7;
pub const DEFAULT_DAYS: u32 = 3;

#[derive(Debug)]
pub struct Orchestrator {
    weather: Box<dyn WeatherProvider>,
    text: Option<Box<dyn TextGenerator>>,
}

impl Orchestrator {
    pub fn new(weather: Box<dyn WeatherProvider>, text: Option<Box<dyn TextGenerator>>) -> Self {
        Self { weather, text }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = http_client(config)?;
        let weather = weather_provider_from_config(config, http.clone())?;
        let text = text_generator_from_config(config, http);
        if text.is_none() {
            tracing::info!(
                "no text-generation provider configured; advisories will omit checklists"
            );
        }
        Ok(Self::new(weather, text))
    }

    /// Slot-based forecast with packing advice and current pollution alerts.
    pub async fn weather(&self, city: &str, days: u32) -> Result<WeatherReport> {
        validate_days(days, MAX_FORECAST_DAYS)?;
        let dates = consecutive_dates(today(), days)?;
        let location = resolve(self.weather.as_ref(), city).await?;

        let days = self.slot_summaries(&location, &dates).await?;
        let advice = packing_advice(&days);

        let current = self.weather.current_air(&location).await?;
        let air_alerts = pollution_alerts(&max_components(&current));

        Ok(WeatherReport { location, days, advice, air_alerts })
    }

    pub async fn air(&self, city: &str, days: u32) -> Result<AirReport> {
        validate_days(days, MAX_FORECAST_DAYS)?;
        let dates = consecutive_dates(today(), days)?;
        let location = resolve(self.weather.as_ref(), city).await?;
        let days = self.air_days(&location, &dates).await?;

        Ok(AirReport { location, days })
    }

    /// Combined weather, air and checklist advisory.
    pub async fn advisory(&self, request: &AdvisoryRequest) -> Result<Advisory> {
        validate_days(request.days, MAX_ADVISORY_DAYS)?;
        let start = request.start.unwrap_or_else(today);
        let dates = consecutive_dates(start, request.days)?;
        let location = resolve(self.weather.as_ref(), &request.city).await?;

        let days = match request.source {
            WeatherSource::Daily => self.daily_summaries(&location, &dates).await?,
            WeatherSource::Slots => self.slot_summaries(&location, &dates).await?,
        };
        let advice = packing_advice(&days);
        let air_days = self.air_days(&location, &dates).await?;

        let checklist = match &self.text {
            Some(text) => {
                let prompt = build_prompt(&location, &days, &advice, &air_days);
                Some(request_checklist(text.as_ref(), &prompt).await?)
            }
            None => None,
        };

        tracing::info!(
            city = %location.name,
            source = %request.source,
            days = days.len(),
            air_days = air_days.len(),
            "advisory assembled"
        );

        Ok(Advisory {
            location,
            source: request.source,
            days,
            advice,
            air_days,
            checklist,
        })
    }

    /// Summary for one explicit date. Every failure is surfaced.
    pub async fn day(&self, city: &str, date: NaiveDate) -> Result<DayReport> {
        let location = resolve(self.weather.as_ref(), city).await?;
        let day = self.fetch_day(&location, date).await?;
        let advice = packing_advice(std::slice::from_ref(&day));

        Ok(DayReport { location, day, advice })
    }

    /// One day-summary call per date, fanned out; output stays in date order.
    pub async fn daily_summaries(
        &self,
        location: &Location,
        dates: &[NaiveDate],
    ) -> Result<Vec<DaySummary>> {
        let outcomes = join_all(dates.iter().map(|date| self.fetch_day(location, *date))).await;

        collect_days(dates, outcomes)
    }

    async fn fetch_day(&self, location: &Location, date: NaiveDate) -> Result<DaySummary> {
        let raw = self.weather.day_summary(location, date).await?;
        Ok(normalize_day(&raw, &date_key(date)))
    }

    /// One summary per date from the 3-hour forecast. Dates outside the
    /// forecast window come back as missing days.
    async fn slot_summaries(
        &self,
        location: &Location,
        dates: &[NaiveDate],
    ) -> Result<Vec<DaySummary>> {
        let keys: Vec<String> = dates.iter().copied().map(date_key).collect();
        let slots = self.weather.forecast_slots(location).await?;
        let buckets = bucket_for_days(slots, &keys);

        Ok(aggregate_days(&buckets, &keys, TemperatureUnit::Kelvin))
    }

    /// Air days for the requested dates the air forecast covers; uncovered dates are omitted.
    async fn air_days(
        &self,
        location: &Location,
        dates: &[NaiveDate],
    ) -> Result<Vec<AirDaySummary>> {
        let keys: Vec<String> = dates.iter().copied().map(date_key).collect();
        let samples = self.weather.air_forecast(location).await?;

        Ok(aggregate_air_days(bucket_for_days(samples, &keys)))
    }
}

async fn request_checklist(text: &dyn TextGenerator, prompt: &str) -> Result<Checklist> {
    let reply = text.generate(SYSTEM_PROMPT, prompt).await?;
    Ok(parse_checklist(&reply))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn validate_days(days: u32, max: u32) -> Result<()> {
    if (1..=max).contains(&days) {
        Ok(())
    } else {
        Err(TravelError::InvalidInput(format!("days must be between 1 and {max}, got {days}")))
    }
}

fn consecutive_dates(start: NaiveDate, days: u32) -> Result<Vec<NaiveDate>> {
    (0..u64::from(days))
        .map(|offset| {
            start.checked_add_days(Days::new(offset)).ok_or_else(|| {
                TravelError::InvalidInput(format!("date range starting {start} is out of range"))
            })
        })
        .collect()
}

/// Fold per-day outcomes into a fixed-length sequence.
///
/// Authorization failures abort the whole request; any other failure leaves a
/// placeholder day so the caller still gets one entry per date.
pub fn collect_days(
    dates: &[NaiveDate],
    outcomes: Vec<Result<DaySummary>>,
) -> Result<Vec<DaySummary>> {
    dates
        .iter()
        .zip(outcomes)
        .map(|(date, outcome)| match outcome {
            Ok(day) => Ok(day),
            Err(err) if err.is_fatal_for_day_loop() => Err(err),
            Err(err) => {
                tracing::warn!(%date, error = %err, "day fetch failed; using empty summary");
                Ok(DaySummary::missing(date_key(*date)))
            }
        })
        .collect()
}
