//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather client abstraction and its OpenWeather implementation
//! - The record store and the fetch orchestrator that keeps it up to date
//! - Display-ready views (cards, detail chart, map pins)
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod geolocation;
pub mod model;
pub mod orchestrator;
pub mod presentation;
pub mod provider;
pub mod store;

pub use config::Config;
pub use geolocation::{FixedLocation, Geolocator, LocationError, NoGeolocation};
pub use model::{Condition, Coordinates, MeasurementUnit, WeatherRecord};
pub use orchestrator::{AppState, FetchOrchestrator, RefreshSummary, TriggerError};
pub use provider::{FetchError, WeatherClient, openweather::OpenWeatherClient};
pub use store::RecordStore;
