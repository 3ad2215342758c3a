use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use clima_core::{
    Config, ConditionCodeMapper, Coordinate, Phase, ProviderId, WeatherSession,
    location::{FixedPosition, NoPosition, PositionSource},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Weather with provider fallback")]
pub struct Cli {
    /// Log every provider and geocoder attempt.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Optional explicit position. Without it the configured fallback city is used.
#[derive(Debug, Clone, Copy, Args)]
pub struct Position {
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl Position {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lon?))
    }

    fn source(&self) -> Arc<dyn PositionSource> {
        match self.coordinate() {
            Some(coord) => Arc::new(FixedPosition(coord)),
            None => Arc::new(NoPosition),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a provider.
    Configure {
        /// Provider short name, e.g. "google".
        provider: String,

        /// Also make this the provider tried first.
        #[arg(long)]
        prefer: bool,
    },

    /// Current conditions, next hours and the coming days.
    Show {
        #[command(flatten)]
        position: Position,
    },

    /// The 10-day window only.
    Forecast {
        #[command(flatten)]
        position: Position,
    },

    /// Name of the place at a coordinate.
    City {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Find cities by name.
    Search { query: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider, prefer } => configure(&provider, prefer),
            Command::Show { position } => {
                let session = session(position.source())?;
                let mapper = ConditionCodeMapper::standard();
                let observer = |phase: Phase| tracing::debug!(%phase, "refresh");

                let snapshot = match position.coordinate() {
                    Some(coord) => session.refresh_at(coord, observer).await,
                    None => session.refresh(observer).await,
                }
                .context("Could not load weather; try again later")?;

                render::snapshot(&snapshot, &mapper);
                Ok(())
            }
            Command::Forecast { position } => {
                let session = session(position.source())?;
                let coord = session.resolve_location().await;
                let (window, place) = tokio::join!(session.get_10_day_forecast(coord), session.resolve_city_name(coord));
                let window = window.context("Could not load the forecast; try again later")?;

                render::forecast_window(&place, &window, &ConditionCodeMapper::standard());
                Ok(())
            }
            Command::City { lat, lon } => {
                let session = session(Arc::new(NoPosition))?;
                let place = session.resolve_city_name(Coordinate::new(lat, lon)).await;
                println!("{place}");
                Ok(())
            }
            Command::Search { query } => {
                let session = session(Arc::new(NoPosition))?;
                let hits = session.search_cities(&query).await?;
                render::candidates(&hits);
                Ok(())
            }
        }
    }
}

fn session(position: Arc<dyn PositionSource>) -> anyhow::Result<WeatherSession> {
    let config = Config::load()?;
    WeatherSession::from_config(&config, position)
}

fn configure(provider: &str, prefer: bool) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_credential() {
        let api_key = inquire::Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?;

        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            bail!("API key must not be empty");
        }
        config.upsert_provider_api_key(id, api_key);
    } else if !prefer {
        println!("{id} needs no API key.");
        return Ok(());
    }

    if prefer {
        config.set_preferred_provider(id);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
