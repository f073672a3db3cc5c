use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use serde::Serialize;
use travel_core::{
    AdvisoryRequest, Config, Orchestrator, ProviderId, WeatherSource,
    model::parse_request_date,
    orchestrator::DEFAULT_DAYS,
};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "travel", version, about = "Travel weather and air-quality advisories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "openweather" or "llm".
        provider: String,
    },

    /// Serve the JSON HTTP API.
    Serve {
        /// Address to bind; defaults to the configured `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Multi-day forecast from 3-hour slots, with packing advice.
    Forecast {
        city: String,
        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,
    },

    /// Daily air-quality maxima and pollutant alerts.
    Air {
        city: String,
        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,
    },

    /// Combined weather, air-quality and packing checklist.
    Advisory {
        city: String,
        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,
        /// First day, YYYY-MM-DD; defaults to today (UTC).
        #[arg(long)]
        start: Option<String>,
        /// "daily" (One Call day summaries) or "slots" (free 3-hour forecast).
        #[arg(long, default_value = "daily")]
        source: String,
    },

    /// Summary for a single date.
    Day {
        city: String,
        /// Date as YYYY-MM-DD.
        #[arg(long)]
        date: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Serve { bind } => {
                let config = load_config()?;
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                serve(Orchestrator::from_config(&config)?, &bind).await?;
            }
            Command::Forecast { city, days } => {
                print_json(&orchestrator()?.weather(&city, days).await?)?;
            }
            Command::Air { city, days } => {
                print_json(&orchestrator()?.air(&city, days).await?)?;
            }
            Command::Advisory { city, days, start, source } => {
                let request = AdvisoryRequest {
                    city,
                    days,
                    start: start.as_deref().map(parse_request_date).transpose()?,
                    source: source.parse::<WeatherSource>()?,
                };
                print_json(&orchestrator()?.advisory(&request).await?)?;
            }
            Command::Day { city, date } => {
                let date = parse_request_date(&date)?;
                print_json(&orchestrator()?.day(&city, date).await?)?;
            }
        }

        Ok(())
    }
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

fn orchestrator() -> anyhow::Result<Orchestrator> {
    Orchestrator::from_config(&load_config()?)
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if id == ProviderId::Llm {
        let base_url = Text::new("Base URL (blank for api.openai.com):")
            .prompt()
            .context("Failed to read base URL")?;
        let model = Text::new("Model (blank for default):")
            .prompt()
            .context("Failed to read model")?;

        if let Some(entry) = config.providers.get_mut(id.as_str()) {
            entry.base_url = Some(base_url.trim().to_string()).filter(|s| !s.is_empty());
            entry.model = Some(model.trim().to_string()).filter(|s| !s.is_empty());
        }
    }

    config.save()?;
    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn serve(orchestrator: Orchestrator, bind: &str) -> anyhow::Result<()> {
    let app = server::router(Arc::new(orchestrator));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    tracing::info!(%bind, "travel advisory API listening");
    axum::serve(listener, app).await.context("HTTP server error")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
