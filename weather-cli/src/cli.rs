use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Password, Select};
use weather_core::{
    Config, Coordinates, FetchOrchestrator, FixedLocation, Geolocator, MeasurementUnit,
    NoGeolocation, presentation, provider::client_from_config,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Metric,
    Imperial,
}

impl From<UnitArg> for MeasurementUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Metric => MeasurementUnit::Metric,
            UnitArg::Imperial => MeasurementUnit::Imperial,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and defaults.
    Configure,

    /// Show current weather for one or more cities.
    Show {
        /// City names, e.g. "Paris" "New York".
        #[arg(required = true)]
        cities: Vec<String>,

        /// Unit system; defaults to the configured one.
        #[arg(long, value_enum)]
        units: Option<UnitArg>,

        /// Print the detail chart for this city.
        #[arg(long)]
        detail: Option<String>,

        /// Print map pins.
        #[arg(long)]
        map: bool,
    },

    /// Show current weather at a position.
    Here {
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        lon: f64,

        #[arg(long, value_enum)]
        units: Option<UnitArg>,
    },

    /// Interactive session: search cities, switch units, inspect records.
    Session {
        /// Starting position; falls back to the configured home location.
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64, requires = "lat")]
        lon: Option<f64>,

        #[arg(long, value_enum)]
        units: Option<UnitArg>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { cities, units, detail, map } => {
                let config = Config::load()?;
                let orchestrator = build_orchestrator(&config, units)?;

                for city in &cities {
                    if orchestrator.search(city).await.is_err() {
                        let state = orchestrator.snapshot().await;
                        render::print_error(&state, Some(city.as_str()));
                    }
                }

                if let Some(name) = detail {
                    if !orchestrator.select(&name).await {
                        eprintln!("No weather loaded for '{name}'.");
                    }
                }

                let state = orchestrator.snapshot().await;
                render::print_cards(&presentation::cards(&state));
                if let Some(chart) = presentation::detail(&state) {
                    render::print_detail(&chart);
                }
                if map {
                    render::print_map(&presentation::map_pins(state.records.all(), state.unit));
                }
                Ok(())
            }
            Command::Here { lat, lon, units } => {
                let config = Config::load()?;
                let orchestrator = build_orchestrator(&config, units)?;

                let geo = FixedLocation(Coordinates::new(lat, lon));
                let result = orchestrator.startup(&geo).await;

                let state = orchestrator.snapshot().await;
                if result.is_err() {
                    render::print_error(&state, None);
                }
                render::print_cards(&presentation::cards(&state));
                Ok(())
            }
            Command::Session { lat, lon, units } => {
                let config = Config::load()?;
                let orchestrator = build_orchestrator(&config, units)?;

                let position = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
                    _ => config.home,
                };
                let geolocator: Box<dyn Geolocator> = match position {
                    Some(c) => Box::new(FixedLocation(c)),
                    None => Box::new(NoGeolocation),
                };

                session::run(orchestrator, geolocator.as_ref()).await
            }
        }
    }
}

fn finite_f64(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("'{raw}' is not a finite number")),
        Err(e) => Err(e.to_string()),
    }
}

fn build_orchestrator(
    config: &Config,
    units: Option<UnitArg>,
) -> anyhow::Result<FetchOrchestrator> {
    let client = client_from_config(config)?;
    let unit = units.map(MeasurementUnit::from).unwrap_or(config.unit);
    Ok(FetchOrchestrator::new(Arc::new(client), unit))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    config.unit = Select::new("Default units:", MeasurementUnit::all().to_vec())
        .prompt()
        .context("Failed to read unit selection")?;

    let set_home = Confirm::new("Set a home location for session start?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read confirmation")?;

    config.home = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Failed to read longitude")?;
        Some(Coordinates::new(latitude, longitude))
    } else {
        None
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
