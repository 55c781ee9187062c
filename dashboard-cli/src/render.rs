//! Plain-text rendering of dashboard state.

use std::fmt::Write;

use weather_dashboard_core::{
    CityCard, Dashboard, KeyValueStore, SearchResult, provider::openweather::icon_url,
};

pub fn watchlist<S: KeyValueStore>(dashboard: &Dashboard<S>) -> String {
    if dashboard.cities().is_empty() {
        return "No cities added yet\nSearch for a city to add it to your dashboard\n".to_string();
    }

    dashboard
        .cards()
        .map(|card| city_card(dashboard, &card))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn city_card<S: KeyValueStore>(dashboard: &Dashboard<S>, card: &CityCard<'_>) -> String {
    let mut out = format!("{}\n", card.name);

    if card.loading {
        out.push_str("  Loading...\n");
        return out;
    }

    let Some(snapshot) = card.snapshot else {
        out.push_str("  No data available\n");
        return out;
    };

    let _ = writeln!(
        out,
        "  {}  {}",
        dashboard.format_temperature(snapshot.temperature_celsius),
        snapshot.condition
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Wind {} km/h",
        snapshot.humidity_percent, snapshot.wind_speed_kph
    );
    let _ = writeln!(
        out,
        "  Updated {}  {}",
        snapshot.observed_at.with_timezone(&chrono::Local).format("%H:%M"),
        icon_url(&snapshot.icon)
    );
    out
}

pub fn search_results(results: &[SearchResult]) -> String {
    results.iter().map(|r| format!("{r}\n")).collect()
}
