//! Core library for travel advisories.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Adapters for the geocoding, weather, air-quality and text-generation providers
//! - The aggregation pipeline: field normalization, day bucketing, daily
//!   aggregation and advice
//! - The orchestrator that sequences one request end to end
//!
//! It is used by `travel-cli`, but can also be reused by other binaries or services.

pub mod advice;
pub mod aggregate;
pub mod bucket;
pub mod checklist;
pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod provider;

pub use config::{Config, ProviderConfig, ServerConfig};
pub use error::TravelError;
pub use model::{
    Advice, Advisory, AdvisoryRequest, AirDaySummary, AirReport, Checklist, DayReport,
    DaySummary, Location, Packing, PollutantAlert, WeatherReport, WeatherSource,
};
pub use orchestrator::Orchestrator;
pub use provider::{ProviderId, TextGenerator, WeatherProvider};
