//! HTTP surface: every endpoint answers JSON, including errors.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use travel_core::{
    AdvisoryRequest, Orchestrator, TravelError, WeatherSource,
    model::parse_request_date,
    orchestrator::DEFAULT_DAYS,
};

type AppState = Arc<Orchestrator>;

/// Wrapper so core errors can be rendered as HTTP responses.
#[derive(Debug)]
pub struct ApiError(TravelError);

impl From<TravelError> for ApiError {
    fn from(err: TravelError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            TravelError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            TravelError::NotFound(city) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "city not found", "city": city }),
            ),
            TravelError::UpstreamUnauthorized { tier, hint } => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.0.to_string(), "tier": tier, "hint": hint }),
            ),
            TravelError::Upstream { provider, status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({
                    "error": "upstream request failed",
                    "provider": provider,
                    "upstream_status": status,
                    "body": body,
                }),
            ),
            TravelError::Transport(_) | TravelError::Decode(_) => {
                let status = self
                    .0
                    .upstream_status()
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, json!({ "error": self.0.to_string() }))
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// All parameters arrive as optional strings and are validated by hand.
/// Query strings that fail to deserialize at all (duplicate keys, bad
/// percent-encoding) are turned into `InvalidInput` by [`trip_query`].
#[derive(Debug, Default, Deserialize)]
pub struct TripQuery {
    city: Option<String>,
    days: Option<String>,
    start: Option<String>,
    source: Option<String>,
    date: Option<String>,
}

impl TripQuery {
    fn city(&self) -> Result<&str, TravelError> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| TravelError::InvalidInput("query parameter 'city' is required".into()))
    }

    fn days(&self) -> Result<u32, TravelError> {
        match self.days.as_deref() {
            None => Ok(DEFAULT_DAYS),
            Some(raw) => raw.parse().map_err(|_| {
                TravelError::InvalidInput(format!(
                    "query parameter 'days' must be a number, got '{raw}'"
                ))
            }),
        }
    }
}

fn trip_query(query: Result<Query<TripQuery>, QueryRejection>) -> Result<TripQuery, ApiError> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| TravelError::InvalidInput(rejection.body_text()).into())
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(weather))
        .route("/api/air", get(air))
        .route("/api/advisory", get(advisory))
        .route("/api/day", get(day))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn weather(
    State(state): State<AppState>,
    query: Result<Query<TripQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = trip_query(query)?;
    let report = state.weather(query.city()?, query.days()?).await?;
    Ok(Json(report))
}

async fn air(
    State(state): State<AppState>,
    query: Result<Query<TripQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = trip_query(query)?;
    let report = state.air(query.city()?, query.days()?).await?;
    Ok(Json(report))
}

async fn advisory(
    State(state): State<AppState>,
    query: Result<Query<TripQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = trip_query(query)?;
    let request = AdvisoryRequest {
        city: query.city()?.to_string(),
        days: query.days()?,
        start: query.start.as_deref().map(parse_request_date).transpose()?,
        source: query
            .source
            .as_deref()
            .map(str::parse::<WeatherSource>)
            .transpose()?
            .unwrap_or_default(),
    };

    let advisory = state.advisory(&request).await?;
    Ok(Json(advisory))
}

async fn day(
    State(state): State<AppState>,
    query: Result<Query<TripQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = trip_query(query)?;
    let city = query.city()?;
    let raw = query
        .date
        .as_deref()
        .ok_or_else(|| TravelError::InvalidInput("query parameter 'date' is required".into()))?;
    let date = parse_request_date(raw)?;

    let report = state.day(city, date).await?;
    Ok(Json(report))
}
