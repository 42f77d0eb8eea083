//! Plain-text rendering of the core's view-models.

use chrono::Local;
use weather_core::{
    AppState,
    presentation::{Card, DetailChart, MapPin},
};

const BAR_WIDTH: f64 = 30.0;

pub fn print_cards(cards: &[Card]) {
    if cards.is_empty() {
        println!("No weather loaded yet.");
        return;
    }

    for card in cards {
        println!("{} {}", card.icon, card.title);
        println!("  Temperature: {}", card.temperature);
        println!("  Weather:     {}", card.description);
        println!("  Humidity:    {}", card.humidity);
        println!("  Wind Speed:  {}", card.wind_speed);
        println!("  Updated:     {}", card.observed_at.with_timezone(&Local).format("%H:%M"));
    }
}

pub fn print_detail(chart: &DetailChart) {
    println!();
    println!("== {} ==", chart.title);
    println!("Temperature: {}", chart.temperature);
    println!("Weather: {}", chart.description);

    for line in bar_lines(chart) {
        println!("{line}");
    }
}

pub fn print_map(pins: &[MapPin]) {
    println!();
    println!("Map:");
    for pin in pins {
        println!("  [{}] {}", pin.coordinates, pin.popup.replace('\n', " | "));
    }
}

pub fn print_error(state: &AppState, context: Option<&str>) {
    if let Some(msg) = &state.error {
        match context {
            Some(ctx) => eprintln!("{ctx}: {msg}"),
            None => eprintln!("{msg}"),
        }
    }
}

/// Horizontal bars scaled to the largest value; the axis starts at zero.
fn bar_lines(chart: &DetailChart) -> Vec<String> {
    let max = chart.axis_max();
    chart
        .bars
        .iter()
        .map(|bar| {
            let len = if max > 0.0 {
                (bar.value.max(0.0) / max * BAR_WIDTH).round() as usize
            } else {
                0
            };
            format!("{:<12} {:<30} {}", bar.label, "#".repeat(len), bar.value)
        })
        .collect()
}
