use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one watched city, normalized from the weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Display name as reported by the provider.
    pub city: String,
    /// Rounded to the nearest whole degree.
    pub temperature_celsius: i32,
    pub condition: String,
    pub humidity_percent: u8,
    pub wind_speed_kph: f64,
    /// Provider icon code, e.g. "04d".
    pub icon: String,
    pub observed_at: DateTime<Utc>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub country: String,
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.country)
    }
}
