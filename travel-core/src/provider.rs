use crate::{
    Config,
    error::Result,
    model::{AirSample, ForecastSlot, Location},
    provider::{llm::OpenAiCompatibleGenerator, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};

pub mod llm;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Llm,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Llm => "llm",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Llm]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "llm" => Ok(ProviderId::Llm),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, llm."
            )),
        }
    }
}

/// Geocoding, weather and air-quality data source.
///
/// Responses are untrusted: slot and day payloads are handed back as loosely
/// typed records and normalized by the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Best match for a city name, or `None` when the provider knows no such place.
    async fn geocode(&self, city: &str) -> Result<Option<Location>>;

    /// 3-hour forecast slots, temperatures in Kelvin.
    async fn forecast_slots(&self, location: &Location) -> Result<Vec<ForecastSlot>>;

    /// Pre-aggregated summary for one calendar day, temperatures in Celsius.
    async fn day_summary(&self, location: &Location, date: NaiveDate) -> Result<Value>;

    async fn current_air(&self, location: &Location) -> Result<Vec<AirSample>>;

    async fn air_forecast(&self, location: &Location) -> Result<Vec<AirSample>>;
}

/// Black-box text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Shared HTTP client for every provider built from one config.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_secs))
        .build()
        .map_err(Into::into)
}

/// Construct the weather provider from config.
pub fn weather_provider_from_config(
    config: &Config,
    http: Client,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = ProviderId::OpenWeather;
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `travel configure {id}` or set OPENWEATHER_API_KEY."
        )
    })?;

    let mut provider = OpenWeatherProvider::with_client(api_key.to_owned(), http);
    if let Some(base_url) = config.provider_config(id).and_then(|c| c.base_url.as_deref()) {
        provider = provider.with_base_url(base_url);
    }

    Ok(Box::new(provider))
}

/// Construct the text generator, if one is configured. Checklists are skipped otherwise.
pub fn text_generator_from_config(config: &Config, http: Client) -> Option<Box<dyn TextGenerator>> {
    let id = ProviderId::Llm;
    if !config.is_provider_configured(id) {
        return None;
    }
    let cfg = config.provider_config(id)?;

    let mut generator = OpenAiCompatibleGenerator::with_client(cfg.api_key.trim().to_owned(), http);
    if let Some(base_url) = cfg.base_url.as_deref() {
        generator = generator.with_base_url(base_url);
    }
    if let Some(model) = cfg.model.as_deref() {
        generator = generator.with_model(model);
    }

    Some(Box::new(generator))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
