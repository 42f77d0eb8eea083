use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{Condition, Coordinates, Locator, MeasurementUnit, WeatherRecord};

use super::{FetchError, WeatherClient};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Current-weather client for the OpenWeather `data/2.5/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherClient { api_key: self.api_key, base_url: self.base_url, http })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: String) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    async fn fetch(
        &self,
        locator: &Locator,
        unit: MeasurementUnit,
    ) -> Result<WeatherRecord, FetchError> {
        let mut query: Vec<(&str, String)> = match locator {
            Locator::City(name) => vec![("q", name.clone())],
            Locator::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
        };
        query.push(("appid", self.api_key.clone()));
        query.push(("units", unit.as_query().to_string()));

        tracing::debug!(%locator, %unit, "requesting current weather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| FetchError::not_found(locator, format!("request failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::not_found(locator, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::not_found(
                locator,
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::not_found(locator, format!("unreadable response: {e}")))?;

        Ok(parsed.into_record(unit))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    coord: OwCoord,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_record(self, unit: MeasurementUnit) -> WeatherRecord {
        let (condition, description) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (Condition::from_main(&w.main), w.description))
            .unwrap_or_else(|| (Condition::Other("Unknown".to_string()), "Unknown".to_string()));

        WeatherRecord {
            name: self.name,
            country: self.sys.country,
            coordinates: Coordinates::new(self.coord.lat, self.coord.lon),
            temperature: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            condition,
            description,
            unit,
            observed_at: self.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch_by_city(
        &self,
        city: &str,
        unit: MeasurementUnit,
    ) -> Result<WeatherRecord, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::InvalidInput("city name is empty".to_string()));
        }

        self.fetch(&Locator::City(city.to_string()), unit).await
    }

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
        unit: MeasurementUnit,
    ) -> Result<WeatherRecord, FetchError> {
        if !coordinates.is_finite() {
            return Err(FetchError::InvalidInput(format!(
                "coordinates must be finite, got ({}, {})",
                coordinates.latitude, coordinates.longitude
            )));
        }

        self.fetch(&Locator::Coordinates(coordinates), unit).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATH: &str = "/data/2.5/weather";

    fn paris_body(temp: f64) -> serde_json::Value {
        json!({
            "coord": { "lon": 2.3488, "lat": 48.8534 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": { "temp": temp, "feels_like": temp - 1.0, "humidity": 56, "pressure": 1016 },
            "wind": { "speed": 4.1, "deg": 250 },
            "dt": 1_700_000_000,
            "sys": { "country": "FR" },
            "name": "Paris",
            "cod": 200
        })
    }

    async fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::builder("KEY".to_string())
            .base_url(format!("{}{}", server.uri(), PATH))
            .build()
            .expect("client should build")
    }

    #[tokio::test]
    async fn fetch_by_city_sends_query_and_parses_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .and(query_param("q", "Paris"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body(64.4)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let record = client
            .fetch_by_city("  Paris ", MeasurementUnit::Imperial)
            .await
            .expect("lookup should succeed");

        assert_eq!(record.name, "Paris");
        assert_eq!(record.country, "FR");
        assert_eq!(record.condition, Condition::Clear);
        assert_eq!(record.description, "clear sky");
        assert_eq!(record.humidity_pct, 56);
        assert_eq!(record.unit, MeasurementUnit::Imperial);
        assert!((record.temperature - 64.4).abs() < f64::EPSILON);
        assert!((record.coordinates.latitude - 48.8534).abs() < 1e-9);
        assert_eq!(record.observed_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn fetch_by_coordinates_sends_lat_lon() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body(18.0)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let record = client
            .fetch_by_coordinates(Coordinates::new(48.85, 2.35), MeasurementUnit::Metric)
            .await
            .expect("lookup should succeed");

        assert_eq!(record.name, "Paris");
        assert_eq!(record.unit, MeasurementUnit::Metric);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_by_city("Atlantis", MeasurementUnit::Metric).await.unwrap_err();

        match err {
            FetchError::NotFound { locator, reason } => {
                assert_eq!(locator, "Atlantis");
                assert!(reason.contains("404"));
                assert!(reason.contains("city not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_by_city("Paris", MeasurementUnit::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn timeout_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(paris_body(18.0))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::builder("KEY".to_string())
            .base_url(format!("{}{}", server.uri(), PATH))
            .timeout(Duration::from_millis(50))
            .build()
            .expect("client should build");

        let err = client.fetch_by_city("Paris", MeasurementUnit::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body(18.0)))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let err = client.fetch_by_city("   ", MeasurementUnit::Metric).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));

        let err = client
            .fetch_by_coordinates(Coordinates::new(f64::NAN, 0.0), MeasurementUnit::Metric)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
    }

    #[test]
    fn missing_weather_entry_falls_back_to_unknown() {
        let mut body = paris_body(18.0);
        body["weather"] = json!([]);
        let parsed: OwCurrentResponse = serde_json::from_value(body).unwrap();
        let record = parsed.into_record(MeasurementUnit::Metric);

        assert_eq!(record.condition, Condition::Other("Unknown".into()));
        assert_eq!(record.description, "Unknown");
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let t = truncate_body(&long);
        assert_eq!(t.len(), 203);
        assert!(t.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
