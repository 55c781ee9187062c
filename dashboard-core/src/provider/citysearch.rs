use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{SearchError, SearchResult};

use super::{CitySearchProvider, truncate_body};

pub const DEFAULT_BASE_URL: &str = "https://city-search2.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "city-search2.p.rapidapi.com";

/// RapidAPI `city-search2` autocomplete client.
#[derive(Debug, Clone)]
pub struct RapidApiCitySearch {
    api_key: String,
    base_url: String,
    http: Client,
}

impl RapidApiCitySearch {
    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    data: Vec<AutocompleteItem>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteItem {
    name: String,
    #[serde(default)]
    country: String,
}

#[async_trait]
impl CitySearchProvider for RapidApiCitySearch {
    async fn autocomplete(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/city/autocomplete", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("input", query)])
            .header("x-rapidapi-key", self.api_key.as_str())
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("failed to reach city search: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            SearchError::Transport(format!("failed to read city search response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(SearchError::ProviderRejected(format!(
                "status {status}: {}",
                truncate_body(&body)
            )));
        }

        let parsed: AutocompleteResponse = serde_json::from_str(&body).map_err(|e| {
            SearchError::Transport(format!("failed to parse city search JSON: {e}"))
        })?;

        Ok(parsed
            .data
            .into_iter()
            .map(|item| SearchResult {
                name: item.name,
                country: item.country,
            })
            .collect())
    }
}
