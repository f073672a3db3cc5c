use crate::{
    error::{Result, TravelError},
    model::Location,
    provider::WeatherProvider,
};

/// Resolve a free-text city name to its best-matching location.
pub async fn resolve(provider: &dyn WeatherProvider, city: &str) -> Result<Location> {
    let city = city.trim();
    if city.is_empty() {
        return Err(TravelError::InvalidInput("city must not be empty".to_string()));
    }

    match provider.geocode(city).await? {
        Some(location) => {
            tracing::debug!(city, lat = location.lat, lon = location.lon, "geocoded");
            Ok(location)
        }
        None => Err(TravelError::NotFound(city.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openweather::OpenWeatherProvider;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn blank_city_is_rejected_without_calling_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&server.uri());
        let err = resolve(&provider, "   ").await.unwrap_err();
        assert!(matches!(err, TravelError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn city_is_trimmed_and_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Nowhere123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new("k".into()).with_base_url(&server.uri());
        let err = resolve(&provider, " Nowhere123 ").await.unwrap_err();
        assert!(matches!(err, TravelError::NotFound(ref c) if c == "Nowhere123"));
    }
}
