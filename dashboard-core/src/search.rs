//! City autocomplete front door.

use std::sync::Arc;

use crate::{SearchError, SearchResult, provider::CitySearchProvider};

/// Wraps an autocomplete provider and skips the network for blank queries.
#[derive(Debug, Clone)]
pub struct CitySearch {
    provider: Option<Arc<dyn CitySearchProvider>>,
}

impl CitySearch {
    pub fn new(provider: Arc<dyn CitySearchProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A search with no provider behind it; every non-blank query is rejected.
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        match &self.provider {
            Some(provider) => provider.autocomplete(query).await,
            None => Err(SearchError::ProviderRejected(
                "city search is not configured".to_string(),
            )),
        }
    }
}
