//! Core library for the `weather-dashboard` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather and city-autocomplete providers
//! - Watchlist persistence over a key-value store
//! - The watchlist orchestrator and the runtime that drives its fetches
//!
//! It is used by `weather-dashboard-cli`, but can also back other front ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod provider;
pub mod runtime;
pub mod search;
pub mod store;
pub mod units;

pub use config::{Config, ProviderConfig};
pub use dashboard::{CityCard, Dashboard, Effect};
pub use error::{FetchError, PersistenceError, SearchError};
pub use model::{SearchResult, WeatherSnapshot};
pub use provider::{CitySearchProvider, ProviderId, WeatherProvider};
pub use runtime::Runtime;
pub use search::CitySearch;
pub use store::{FileStore, KeyValueStore, MemoryStore, WatchlistStore};
pub use units::{TemperatureUnit, format_temperature};
