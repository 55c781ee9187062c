//! Executes dashboard effects against the configured providers.

use std::{collections::HashMap, sync::Arc};

use tokio::task::{Id, JoinSet};

use crate::{
    FetchError, SearchError, SearchResult, TemperatureUnit, WeatherSnapshot,
    dashboard::{Dashboard, Effect},
    provider::WeatherProvider,
    search::CitySearch,
    store::KeyValueStore,
};

/// Outcome of one spawned effect.
#[derive(Debug)]
pub enum Completion {
    Weather {
        city: String,
        ticket: u64,
        result: Result<WeatherSnapshot, FetchError>,
    },
    Search {
        seq: u64,
        result: Result<Vec<SearchResult>, SearchError>,
    },
}

/// Owns a [`Dashboard`] and runs its effects as tokio tasks.
///
/// Only the task holding the runtime mutates the dashboard; spawned tasks just
/// talk to the providers and hand back a [`Completion`].
pub struct Runtime<S> {
    dashboard: Dashboard<S>,
    weather: Arc<dyn WeatherProvider>,
    search: CitySearch,
    tasks: JoinSet<Completion>,
    pending: HashMap<Id, Effect>,
}

impl<S: KeyValueStore> Runtime<S> {
    pub fn new(
        dashboard: Dashboard<S>,
        weather: Arc<dyn WeatherProvider>,
        search: CitySearch,
    ) -> Self {
        Self {
            dashboard,
            weather,
            search,
            tasks: JoinSet::new(),
            pending: HashMap::new(),
        }
    }

    pub fn dashboard(&self) -> &Dashboard<S> {
        &self.dashboard
    }

    /// Fetch weather for every restored city.
    pub fn start(&mut self) {
        let effects = self.dashboard.reconcile();
        self.spawn_all(effects);
    }

    pub fn add_city(&mut self, name: &str) {
        let effects = self.dashboard.add_city(name);
        self.spawn_all(effects);
    }

    /// Returns `false` if the city was not watched.
    pub fn remove_city(&mut self, name: &str) -> bool {
        if !self.dashboard.contains(name) {
            return false;
        }
        let effects = self.dashboard.remove_city(name);
        self.spawn_all(effects);
        true
    }

    /// Returns `false` if the city is unknown or already loading.
    pub fn refresh(&mut self, name: &str) -> bool {
        match self.dashboard.refresh(name) {
            Some(effect) => {
                self.spawn(effect);
                true
            }
            None => false,
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        if let Some(effect) = self.dashboard.set_search_query(query) {
            self.spawn(effect);
        }
    }

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.dashboard.set_unit(unit);
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn spawn_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.spawn(effect);
        }
    }

    fn spawn(&mut self, effect: Effect) {
        let handle = match effect.clone() {
            Effect::FetchWeather { city, ticket } => {
                let weather = Arc::clone(&self.weather);
                self.tasks.spawn(async move {
                    let result = weather.fetch(&city).await;
                    Completion::Weather {
                        city,
                        ticket,
                        result,
                    }
                })
            }
            Effect::SearchCities { seq, query } => {
                let search = self.search.clone();
                self.tasks.spawn(async move {
                    let result = search.search(&query).await;
                    Completion::Search { seq, result }
                })
            }
        };
        self.pending.insert(handle.id(), effect);
    }

    /// Wait for one effect to finish and apply it.
    ///
    /// Returns `false` once nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        let Some(joined) = self.tasks.join_next_with_id().await else {
            return false;
        };

        let completion = match joined {
            Ok((id, completion)) => {
                self.pending.remove(&id);
                completion
            }
            Err(err) => {
                tracing::error!(error = %err, "effect task failed");
                match self.pending.remove(&err.id()) {
                    Some(effect) => failed(effect, err.to_string()),
                    None => return true,
                }
            }
        };

        self.apply(completion);
        true
    }

    /// Apply completions until every spawned effect has finished.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Weather {
                city,
                ticket,
                result,
            } => {
                self.dashboard.weather_fetched(&city, ticket, result);
            }
            Completion::Search { seq, result } => {
                self.dashboard.search_finished(seq, result);
            }
        }
    }
}

fn failed(effect: Effect, reason: String) -> Completion {
    match effect {
        Effect::FetchWeather { city, ticket } => Completion::Weather {
            city,
            ticket,
            result: Err(FetchError::Transport(reason)),
        },
        Effect::SearchCities { seq, .. } => Completion::Search {
            seq,
            result: Err(SearchError::Transport(reason)),
        },
    }
}
