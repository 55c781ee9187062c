use crate::{
    Config, FetchError, SearchError, SearchResult, WeatherSnapshot,
    provider::{citysearch::RapidApiCitySearch, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod citysearch;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    CitySearch,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::CitySearch => "citysearch",
        }
    }

    /// Environment variable consulted when no key is stored in the config file.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::CitySearch => "RAPIDAPI_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => openweather::DEFAULT_BASE_URL,
            ProviderId::CitySearch => citysearch::DEFAULT_BASE_URL,
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::CitySearch]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "citysearch" | "rapidapi" => Ok(ProviderId::CitySearch),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, citysearch."
            )),
        }
    }
}

/// Source of current conditions for a city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Single attempt; every failure is reported as a `FetchError`.
    async fn fetch(&self, city: &str) -> Result<WeatherSnapshot, FetchError>;
}

/// Source of city-name autocomplete suggestions.
#[async_trait]
pub trait CitySearchProvider: Send + Sync + Debug {
    async fn autocomplete(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Build the HTTP client shared by the providers, honoring the configured timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn require_api_key(id: ProviderId, config: &Config) -> anyhow::Result<String> {
    config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-dashboard configure {id}` or set {}.",
            id.env_var()
        )
    })
}

/// Construct the weather provider from config.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let id = ProviderId::OpenWeather;
    let api_key = require_api_key(id, config)?;
    let provider = OpenWeatherProvider::with_client(
        api_key,
        config.provider_base_url(id).to_owned(),
        http_client(config)?,
    );
    Ok(Arc::new(provider))
}

/// Construct the city autocomplete provider from config.
pub fn city_search_from_config(config: &Config) -> anyhow::Result<Arc<dyn CitySearchProvider>> {
    let id = ProviderId::CitySearch;
    let api_key = require_api_key(id, config)?;
    let provider = RapidApiCitySearch::with_client(
        api_key,
        config.provider_base_url(id).to_owned(),
        http_client(config)?,
    );
    Ok(Arc::new(provider))
}

/// Shorten a provider response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
