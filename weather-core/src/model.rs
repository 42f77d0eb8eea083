use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement system used both for outgoing requests and for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Metric,
    Imperial,
}

impl MeasurementUnit {
    /// Value of the `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            MeasurementUnit::Metric => "metric",
            MeasurementUnit::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            MeasurementUnit::Metric => "°C",
            MeasurementUnit::Imperial => "°F",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            MeasurementUnit::Metric => "m/s",
            MeasurementUnit::Imperial => "mph",
        }
    }

    pub const fn all() -> &'static [MeasurementUnit] {
        &[MeasurementUnit::Metric, MeasurementUnit::Imperial]
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl TryFrom<&str> for MeasurementUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Ok(MeasurementUnit::Metric),
            "imperial" | "fahrenheit" | "f" => Ok(MeasurementUnit::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

impl std::str::FromStr for MeasurementUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementUnit::try_from(s)
    }
}

/// Condition category as reported in `weather[0].main`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Other(String),
}

impl Condition {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Condition::Clear,
            "Clouds" => Condition::Clouds,
            "Rain" => Condition::Rain,
            "Snow" => Condition::Snow,
            "Thunderstorm" => Condition::Thunderstorm,
            other => Condition::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Other(s) => s.as_str(),
        }
    }

    /// Glyph for cards. Unknown categories share the cloud glyph.
    pub fn icon(&self) -> &'static str {
        match self {
            Condition::Clear => "☀",
            Condition::Rain => "🌧",
            Condition::Snow => "❄",
            Condition::Thunderstorm => "⛈",
            Condition::Clouds | Condition::Other(_) => "☁",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What a single request asks the data source for.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    City(String),
    Coordinates(Coordinates),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::City(name) => f.write_str(name),
            Locator::Coordinates(coords) => write!(f, "({coords})"),
        }
    }
}

/// One city's current weather snapshot.
///
/// `name` is the de-duplication key, compared exactly as the data source returned it.
/// Numeric fields are expressed in `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub condition: Condition,
    pub description: String,
    pub unit: MeasurementUnit,
    pub observed_at: DateTime<Utc>,
}

impl WeatherRecord {
    /// "Name, CC", or just the name when the country is missing.
    pub fn title(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_roundtrip_and_aliases() {
        for unit in MeasurementUnit::all() {
            let parsed = MeasurementUnit::try_from(unit.as_query()).expect("roundtrip should succeed");
            assert_eq!(*unit, parsed);
        }

        assert_eq!(MeasurementUnit::try_from("Fahrenheit").unwrap(), MeasurementUnit::Imperial);
        assert_eq!(" celsius ".parse::<MeasurementUnit>().unwrap(), MeasurementUnit::Metric);
    }

    #[test]
    fn unknown_unit_error() {
        let err = MeasurementUnit::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit"));
    }

    #[test]
    fn unit_labels() {
        assert_eq!(MeasurementUnit::Metric.temperature_symbol(), "°C");
        assert_eq!(MeasurementUnit::Imperial.temperature_symbol(), "°F");
        assert_eq!(MeasurementUnit::Metric.speed_label(), "m/s");
        assert_eq!(MeasurementUnit::Imperial.speed_label(), "mph");
    }

    #[test]
    fn condition_parsing_keeps_unknown_categories() {
        assert_eq!(Condition::from_main("Rain"), Condition::Rain);
        let mist = Condition::from_main("Mist");
        assert_eq!(mist, Condition::Other("Mist".into()));
        assert_eq!(mist.label(), "Mist");
        assert_eq!(mist.icon(), Condition::Clouds.icon());
    }

    #[test]
    fn coordinates_reject_non_finite() {
        assert!(Coordinates::new(48.85, 2.35).is_finite());
        assert!(!Coordinates::new(f64::NAN, 2.35).is_finite());
        assert!(!Coordinates::new(1.0, f64::INFINITY).is_finite());
    }
}
