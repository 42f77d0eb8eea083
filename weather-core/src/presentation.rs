//! Display-ready views of the app state: cards, the detail chart and map pins.
//!
//! Formatting follows the *current* unit, so a record that has not been refreshed yet
//! after a unit change still shows the new unit's labels.

use chrono::{DateTime, Utc};

use crate::{
    model::{Coordinates, MeasurementUnit, WeatherRecord},
    orchestrator::AppState,
};

pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates { latitude: 51.505, longitude: -0.09 };
pub const NO_DATA_POPUP: &str = "No weather data available.";

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub icon: &'static str,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind_speed: String,
    pub observed_at: DateTime<Utc>,
}

impl Card {
    pub fn new(record: &WeatherRecord, unit: MeasurementUnit) -> Self {
        Self {
            title: record.title(),
            icon: record.condition.icon(),
            temperature: format_temperature(record.temperature, unit),
            description: record.description.clone(),
            humidity: format!("{}%", record.humidity_pct),
            wind_speed: format!("{} {}", record.wind_speed, unit.speed_label()),
            observed_at: record.observed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
}

/// Bar chart of the selected record's metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailChart {
    pub title: String,
    pub temperature: String,
    pub description: String,
    pub bars: Vec<Bar>,
}

impl DetailChart {
    pub fn new(record: &WeatherRecord, unit: MeasurementUnit) -> Self {
        Self {
            title: record.title(),
            temperature: format_temperature(record.temperature, unit),
            description: record.description.clone(),
            bars: vec![
                Bar { label: "Temperature", value: record.temperature },
                Bar { label: "Humidity", value: f64::from(record.humidity_pct) },
                Bar { label: "Wind Speed", value: record.wind_speed },
            ],
        }
    }

    /// Upper bound for the value axis; the axis always starts at zero.
    pub fn axis_max(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPin {
    pub id: String,
    pub coordinates: Coordinates,
    pub name: String,
    /// `None` on the placeholder pin.
    pub temperature: Option<f64>,
    pub popup: String,
}

/// One pin per record, or a single placeholder pin when there is nothing to show.
pub fn map_pins(records: &[WeatherRecord], unit: MeasurementUnit) -> Vec<MapPin> {
    if records.is_empty() {
        return vec![MapPin {
            id: "default".to_string(),
            coordinates: DEFAULT_MAP_CENTER,
            name: String::new(),
            temperature: None,
            popup: NO_DATA_POPUP.to_string(),
        }];
    }

    records
        .iter()
        .map(|r| MapPin {
            id: r.name.clone(),
            coordinates: r.coordinates,
            name: r.name.clone(),
            temperature: Some(r.temperature),
            popup: format!("{}\nTemperature: {}", r.name, format_temperature(r.temperature, unit)),
        })
        .collect()
}

pub fn cards(state: &AppState) -> Vec<Card> {
    state.records.all().iter().map(|r| Card::new(r, state.unit)).collect()
}

pub fn detail(state: &AppState) -> Option<DetailChart> {
    state.selected_record().map(|r| DetailChart::new(r, state.unit))
}

pub fn format_temperature(value: f64, unit: MeasurementUnit) -> String {
    format!("{}{}", value, unit.temperature_symbol())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::record;

    #[test]
    fn card_uses_current_unit_labels() {
        let r = record("Paris", 18.5, MeasurementUnit::Metric);

        let metric = Card::new(&r, MeasurementUnit::Metric);
        assert_eq!(metric.title, "Paris, XX");
        assert_eq!(metric.temperature, "18.5°C");
        assert_eq!(metric.humidity, "50%");
        assert_eq!(metric.wind_speed, "3 m/s");

        let imperial = Card::new(&r, MeasurementUnit::Imperial);
        assert_eq!(imperial.temperature, "18.5°F");
        assert_eq!(imperial.wind_speed, "3 mph");
    }

    #[test]
    fn detail_chart_has_three_bars() {
        let r = record("Oslo", -4.0, MeasurementUnit::Metric);
        let chart = DetailChart::new(&r, MeasurementUnit::Metric);

        let labels: Vec<_> = chart.bars.iter().map(|b| b.label).collect();
        assert_eq!(labels, ["Temperature", "Humidity", "Wind Speed"]);
        assert_eq!(chart.axis_max(), 50.0);
    }

    #[test]
    fn empty_map_gets_placeholder_pin() {
        let pins = map_pins(&[], MeasurementUnit::Metric);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].coordinates, DEFAULT_MAP_CENTER);
        assert_eq!(pins[0].popup, NO_DATA_POPUP);
        assert_eq!(pins[0].temperature, None);
    }

    #[test]
    fn map_pins_follow_record_order() {
        let records = vec![
            record("Rome", 24.0, MeasurementUnit::Metric),
            record("Paris", 18.0, MeasurementUnit::Metric),
        ];
        let pins = map_pins(&records, MeasurementUnit::Metric);

        let ids: Vec<_> = pins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["Rome", "Paris"]);
        assert_eq!(pins[0].name, "Rome");
        assert_eq!(pins[0].temperature, Some(24.0));
        assert_eq!(pins[1].coordinates, Coordinates::new(10.0, 20.0));
        assert!(pins[0].popup.contains("Temperature: 24°C"));
    }

    #[test]
    fn detail_is_none_without_selection() {
        let mut state = AppState::new(MeasurementUnit::Metric);
        state.records.upsert(record("Paris", 18.0, MeasurementUnit::Metric));
        assert!(detail(&state).is_none());

        state.selected = Some("Paris".to_string());
        assert_eq!(detail(&state).map(|d| d.title), Some("Paris, XX".to_string()));
        assert_eq!(cards(&state).len(), 1);
    }
}
