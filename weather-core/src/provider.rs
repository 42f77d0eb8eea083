use crate::{
    Config,
    model::{Coordinates, Locator, MeasurementUnit, WeatherRecord},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Failure of a single weather lookup.
///
/// Transport errors, timeouts, non-success statuses and unreadable bodies all map to
/// `NotFound`; callers only ever show one message for them. `reason` is for logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("weather for '{locator}' not found: {reason}")]
    NotFound { locator: String, reason: String },

    #[error("invalid lookup: {0}")]
    InvalidInput(String),
}

impl FetchError {
    pub(crate) fn not_found(locator: &Locator, reason: impl Into<String>) -> Self {
        FetchError::NotFound { locator: locator.to_string(), reason: reason.into() }
    }
}

/// Source of current-weather records. Each call issues exactly one request.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_by_city(
        &self,
        city: &str,
        unit: MeasurementUnit,
    ) -> Result<WeatherRecord, FetchError>;

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
        unit: MeasurementUnit,
    ) -> Result<WeatherRecord, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: set OPENWEATHER_API_KEY or run `weather configure` and enter your API key."
        )
    })?;

    OpenWeatherClient::builder(api_key.to_owned())
        .base_url(config.base_url())
        .timeout(config.timeout())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = client_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn client_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(client_from_config(&cfg).is_ok());
    }

    #[test]
    fn not_found_message_names_the_locator() {
        let err = FetchError::not_found(&Locator::City("Atlantis".into()), "status 404");
        let msg = err.to_string();
        assert!(msg.contains("Atlantis"));
        assert!(msg.contains("status 404"));
    }
}
