use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{FetchError, WeatherSnapshot, units::round_half_up};

use super::{WeatherProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeatherMap current-weather client, always asking for metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to reach OpenWeather: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            FetchError::Transport(format!("failed to read OpenWeather response body: {e}"))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<OwErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("status {status}: {}", truncate_body(&body)));
            return Err(FetchError::ProviderRejected(message));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::Transport(format!("failed to parse OpenWeather current JSON: {e}"))
        })?;

        snapshot_from_response(parsed)
    }
}

fn snapshot_from_response(parsed: OwCurrentResponse) -> Result<WeatherSnapshot, FetchError> {
    let first = parsed.weather.into_iter().next().ok_or_else(|| {
        FetchError::Transport("OpenWeather response contained no condition entries".to_string())
    })?;

    let observed_at = parsed
        .dt
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(WeatherSnapshot {
        city: parsed.name,
        temperature_celsius: round_half_up(parsed.main.temp) as i32,
        condition: first.description,
        humidity_percent: parsed.main.humidity,
        wind_speed_kph: parsed.wind.speed,
        icon: first.icon,
        observed_at,
    })
}

/// URL of the provider's artwork for an icon code.
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        tracing::debug!(city, "fetching current weather");
        self.fetch_current(city).await
    }
}
