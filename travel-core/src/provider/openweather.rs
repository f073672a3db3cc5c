use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Result, TravelError},
    model::{AirSample, ForecastSlot, Location},
    normalize::{normalize_air_sample, normalize_slot},
};

use super::{WeatherProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const PROVIDER: &str = "openweather";

pub const DAY_SUMMARY_TIER: &str = "OpenWeather One Call API 3.0 (day summary)";
pub const DAY_SUMMARY_HINT: &str = "Subscribe to One Call API 3.0 for this key, or use /api/weather \
     (or source=slots), which aggregates the free 3-hour forecast instead.";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, Client::new())
    }

    pub fn with_client(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// GET `path` with the API key appended and return the body of a successful response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        Ok((status, body))
    }

    async fn get_ok(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let (status, body) = self.get(path, query).await?;

        if !status.is_success() {
            return Err(TravelError::Upstream {
                provider: PROVIDER,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }

    fn coords(location: &Location) -> [(&'static str, String); 2] {
        [("lat", location.lat.to_string()), ("lon", location.lon.to_string())]
    }

    fn air_samples(body: &str) -> Result<Vec<AirSample>> {
        let parsed: OwListResponse = serde_json::from_str(body)?;
        Ok(parsed.list.iter().filter_map(normalize_air_sample).collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

/// Shared envelope of the forecast and air-pollution endpoints.
#[derive(Debug, Deserialize)]
struct OwListResponse {
    #[serde(default)]
    list: Vec<Value>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, city: &str) -> Result<Option<Location>> {
        let body = self
            .get_ok("/geo/1.0/direct", &[("q", city.to_string()), ("limit", "1".to_string())])
            .await?;

        let entries: Vec<OwGeoEntry> = serde_json::from_str(&body)?;

        Ok(entries.into_iter().next().map(|e| Location {
            lat: e.lat,
            lon: e.lon,
            name: e.name,
            country: e.country,
        }))
    }

    async fn forecast_slots(&self, location: &Location) -> Result<Vec<ForecastSlot>> {
        // No `units` parameter: the standard unit set reports Kelvin.
        let body = self.get_ok("/data/2.5/forecast", &Self::coords(location)).await?;
        let parsed: OwListResponse = serde_json::from_str(&body)?;

        Ok(parsed.list.iter().filter_map(normalize_slot).collect())
    }

    async fn day_summary(&self, location: &Location, date: NaiveDate) -> Result<Value> {
        let [lat, lon] = Self::coords(location);
        let query = [
            lat,
            lon,
            ("date", date.format("%Y-%m-%d").to_string()),
            ("units", "metric".to_string()),
        ];

        let (status, body) = self.get("/data/3.0/onecall/day_summary", &query).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TravelError::UpstreamUnauthorized {
                tier: DAY_SUMMARY_TIER.to_string(),
                hint: DAY_SUMMARY_HINT.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TravelError::Upstream {
                provider: PROVIDER,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn current_air(&self, location: &Location) -> Result<Vec<AirSample>> {
        let body = self.get_ok("/data/2.5/air_pollution", &Self::coords(location)).await?;
        Self::air_samples(&body)
    }

    async fn air_forecast(&self, location: &Location) -> Result<Vec<AirSample>> {
        let body = self
            .get_ok("/data/2.5/air_pollution/forecast", &Self::coords(location))
            .await?;
        Self::air_samples(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("test_key".into()).with_base_url(&server.uri())
    }

    fn paris() -> Location {
        Location { lat: 48.8566, lon: 2.3522, name: "Paris".into(), country: "FR".into() }
    }

    #[tokio::test]
    async fn geocode_requests_single_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Paris"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "Paris", "lat": 48.8566, "lon": 2.3522, "country": "FR", "state": "Ile-de-France" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let location = provider(&server).geocode("Paris").await.unwrap();
        assert_eq!(location, Some(paris()));
    }

    #[tokio::test]
    async fn geocode_empty_result_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert_eq!(provider(&server).geocode("Nowhere123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn forecast_slots_skip_entries_without_timestamp() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "48.8566"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": "200",
                "list": [
                    { "dt": 1717200000, "main": { "temp": 290.15 }, "wind": { "speed": 3.0 } },
                    { "main": { "temp": 291.15 } },
                    { "dt": 1717210800, "main": { "temp": 292.15 }, "rain": { "3h": 1.5 } }
                ]
            })))
            .mount(&server)
            .await;

        let slots = provider(&server).forecast_slots(&paris()).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].rain_mm, Some(1.5));
    }

    #[tokio::test]
    async fn day_summary_unauthorized_names_the_tier() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall/day_summary"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Please note that using One Call 3.0 requires a separate subscription"
            })))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let err = provider(&server).day_summary(&paris(), date).await.unwrap_err();

        match err {
            TravelError::UpstreamUnauthorized { tier, hint } => {
                assert!(tier.contains("One Call"));
                assert!(hint.contains("/api/weather"));
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn day_summary_passes_date_and_metric_units() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall/day_summary"))
            .and(query_param("date", "2024-06-01"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "date": "2024-06-01",
                "temperature": { "min": 14.0, "max": 22.0 }
            })))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let raw = provider(&server).day_summary(&paris(), date).await.unwrap();
        assert_eq!(raw["temperature"]["max"], 22.0);
    }

    #[tokio::test]
    async fn non_success_status_is_forwarded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = provider(&server).current_air(&paris()).await.unwrap_err();
        match err {
            TravelError::Upstream { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn air_forecast_reads_components() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coord": { "lat": 48.8566, "lon": 2.3522 },
                "list": [
                    { "dt": 1717200000, "main": { "aqi": 2 }, "components": { "pm2_5": 9.1, "o3": 61.2 } },
                    { "dt": 1717203600, "main": { "aqi": 3 }, "components": { "pm2_5": 13.4, "o3": 55.0 } }
                ]
            })))
            .mount(&server)
            .await;

        let samples = provider(&server).air_forecast(&paris()).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].aqi, Some(3));
        assert_eq!(samples[1].components["pm2_5"], 13.4);
    }
}
