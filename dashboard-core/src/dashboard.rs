//! Watchlist orchestration.
//!
//! [`Dashboard`] owns the watched cities, their cached snapshots and loading
//! flags, the search box state and the unit preference. It never performs I/O
//! on the network itself: operations that need a provider call return
//! [`Effect`]s, and the caller reports the outcome back through
//! [`Dashboard::weather_fetched`] or [`Dashboard::search_finished`].

use std::collections::HashMap;

use crate::{
    FetchError, SearchError, SearchResult, TemperatureUnit, WeatherSnapshot,
    store::{KeyValueStore, WatchlistStore},
    units,
};

/// Network work requested by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch current weather for a watched city.
    FetchWeather { city: String, ticket: u64 },
    /// Run an autocomplete query. Only the latest `seq` is applied.
    SearchCities { seq: u64, query: String },
}

#[derive(Debug, Default)]
struct CityRecord {
    snapshot: Option<WeatherSnapshot>,
    loading: bool,
    /// Identifies the fetch currently in flight for this city.
    ticket: u64,
}

/// Read-only view of one watched city for rendering.
#[derive(Debug, Clone, Copy)]
pub struct CityCard<'a> {
    pub name: &'a str,
    pub snapshot: Option<&'a WeatherSnapshot>,
    pub loading: bool,
}

#[derive(Debug)]
pub struct Dashboard<S> {
    store: WatchlistStore<S>,
    cities: Vec<String>,
    records: HashMap<String, CityRecord>,
    next_ticket: u64,

    search_query: String,
    search_results: Vec<SearchResult>,
    search_seq: u64,
    is_searching: bool,

    unit: TemperatureUnit,
}

impl<S: KeyValueStore> Dashboard<S> {
    /// Restore the watchlist from `store`. Call [`Dashboard::reconcile`] afterwards
    /// to start fetching the restored cities.
    pub fn new(store: WatchlistStore<S>) -> Self {
        let mut cities: Vec<String> = Vec::new();
        for city in store.load() {
            if !cities.contains(&city) {
                cities.push(city);
            }
        }
        tracing::debug!(count = cities.len(), "restored watchlist");

        let records = cities
            .iter()
            .map(|city| (city.clone(), CityRecord::default()))
            .collect();

        Self {
            store,
            cities,
            records,
            next_ticket: 0,
            search_query: String::new(),
            search_results: Vec::new(),
            search_seq: 0,
            is_searching: false,
            unit: TemperatureUnit::default(),
        }
    }

    // ----- watchlist -----

    /// Append `name` to the watchlist and request its weather.
    ///
    /// Always closes the search: the query and results are cleared and any
    /// in-flight search is invalidated, even when `name` is already watched.
    pub fn add_city(&mut self, name: &str) -> Vec<Effect> {
        self.clear_search();

        if name.trim().is_empty() || self.contains(name) {
            return Vec::new();
        }

        self.cities.push(name.to_string());
        self.records.insert(name.to_string(), CityRecord::default());
        self.store.save(&self.cities);
        tracing::info!(city = name, "added city");

        self.reconcile()
    }

    /// Drop `name` together with its snapshot and loading flag.
    ///
    /// Returns the fetches issued by the reconciliation that follows the
    /// mutation; removing an unknown city is a no-op.
    pub fn remove_city(&mut self, name: &str) -> Vec<Effect> {
        let Some(index) = self.cities.iter().position(|c| c == name) else {
            return Vec::new();
        };

        self.cities.remove(index);
        self.records.remove(name);
        self.store.save(&self.cities);
        tracing::info!(city = name, "removed city");

        self.reconcile()
    }

    /// Start a fetch for every watched city that has no snapshot and is not loading.
    pub fn reconcile(&mut self) -> Vec<Effect> {
        let pending: Vec<String> = self
            .cities
            .iter()
            .filter(|city| {
                self.records
                    .get(city.as_str())
                    .is_none_or(|r| r.snapshot.is_none() && !r.loading)
            })
            .cloned()
            .collect();

        pending.into_iter().map(|city| self.issue_fetch(city)).collect()
    }

    /// Re-fetch a watched city. The current snapshot stays visible until replaced.
    pub fn refresh(&mut self, name: &str) -> Option<Effect> {
        let loading = self.records.get(name)?.loading;
        if loading {
            return None;
        }
        Some(self.issue_fetch(name.to_string()))
    }

    fn issue_fetch(&mut self, city: String) -> Effect {
        self.next_ticket += 1;
        let ticket = self.next_ticket;

        let record = self.records.entry(city.clone()).or_default();
        record.loading = true;
        record.ticket = ticket;

        tracing::debug!(city = %city, ticket, "issuing weather fetch");
        Effect::FetchWeather { city, ticket }
    }

    /// Apply the outcome of a [`Effect::FetchWeather`].
    ///
    /// Returns `false` when the completion was discarded because the city is
    /// no longer watched or a newer fetch superseded it.
    pub fn weather_fetched(
        &mut self,
        city: &str,
        ticket: u64,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> bool {
        let Some(record) = self.records.get_mut(city) else {
            tracing::debug!(city, "discarding weather for unwatched city");
            return false;
        };
        if !record.loading || record.ticket != ticket {
            tracing::debug!(city, ticket, "discarding stale weather");
            return false;
        }

        record.loading = false;
        match result {
            Ok(snapshot) => record.snapshot = Some(snapshot),
            Err(err) => tracing::warn!(city, error = %err, "error fetching weather data"),
        }
        true
    }

    // ----- search -----

    /// Update the search text. Returns the query to run, if any.
    pub fn set_search_query(&mut self, query: impl Into<String>) -> Option<Effect> {
        self.search_query = query.into();
        self.search_seq += 1;

        if self.search_query.trim().is_empty() {
            self.search_results.clear();
            self.is_searching = false;
            return None;
        }

        self.is_searching = true;
        Some(Effect::SearchCities {
            seq: self.search_seq,
            query: self.search_query.clone(),
        })
    }

    /// Apply the outcome of a [`Effect::SearchCities`]; stale sequences are ignored.
    pub fn search_finished(
        &mut self,
        seq: u64,
        result: Result<Vec<SearchResult>, SearchError>,
    ) -> bool {
        if seq != self.search_seq {
            tracing::debug!(seq, latest = self.search_seq, "discarding stale search results");
            return false;
        }

        self.is_searching = false;
        self.search_results = result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "error fetching cities");
            Vec::new()
        });
        true
    }

    fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_results.clear();
        self.search_seq += 1;
        self.is_searching = false;
    }

    // ----- units -----

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
    }

    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.unit = self.unit.toggle();
        self.unit
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Format a stored Celsius value in the current unit.
    pub fn format_temperature(&self, temp_celsius: i32) -> String {
        units::format_temperature(temp_celsius, self.unit)
    }

    // ----- accessors -----

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn snapshot(&self, city: &str) -> Option<&WeatherSnapshot> {
        self.records.get(city).and_then(|r| r.snapshot.as_ref())
    }

    pub fn is_loading(&self, city: &str) -> bool {
        self.records.get(city).is_some_and(|r| r.loading)
    }

    pub fn cards(&self) -> impl Iterator<Item = CityCard<'_>> {
        self.cities.iter().map(|name| {
            let record = self.records.get(name.as_str());
            CityCard {
                name,
                snapshot: record.and_then(|r| r.snapshot.as_ref()),
                loading: record.is_some_and(|r| r.loading),
            }
        })
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn store(&self) -> &WatchlistStore<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PersistenceError, store::MemoryStore, store::WATCHLIST_KEY};
    use chrono::Utc;
    use std::{cell::RefCell, rc::Rc};

    type Writes = Rc<RefCell<Vec<Vec<String>>>>;

    /// Memory store that remembers every write to the watchlist slot.
    #[derive(Debug, Default, Clone)]
    struct RecordingStore {
        inner: MemoryStore,
        writes: Writes,
    }

    impl KeyValueStore for RecordingStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
            if key == WATCHLIST_KEY {
                self.writes.borrow_mut().push(serde_json::from_str(value)?);
            }
            self.inner.set(key, value)
        }
    }

    fn dashboard_with(cities: &[&str]) -> (Dashboard<RecordingStore>, Writes) {
        let mut store = RecordingStore::default();
        if !cities.is_empty() {
            store
                .inner
                .set(WATCHLIST_KEY, &serde_json::to_string(cities).unwrap())
                .unwrap();
        }
        let writes = store.writes.clone();
        (Dashboard::new(WatchlistStore::new(store)), writes)
    }

    fn snapshot(city: &str, temp: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            city: city.to_string(),
            temperature_celsius: temp,
            condition: "clear sky".into(),
            humidity_percent: 60,
            wind_speed_kph: 10.0,
            icon: "01d".into(),
            observed_at: Utc::now(),
        }
    }

    fn ticket_for(effects: &[Effect], city: &str) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchWeather { city: c, ticket } if c == city => Some(*ticket),
                _ => None,
            })
            .expect("fetch effect for city")
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_and_remove_keep_insertion_order() {
        let (mut dash, _) = dashboard_with(&[]);

        dash.add_city("Paris");
        dash.add_city("Berlin");
        dash.add_city("Kyiv");
        dash.remove_city("Berlin");
        dash.add_city("Oslo");
        dash.add_city("Berlin");

        assert_eq!(dash.cities(), names(&["Paris", "Kyiv", "Oslo", "Berlin"]).as_slice());
    }

    #[test]
    fn every_mutation_saves_the_new_watchlist_once() {
        let (mut dash, writes) = dashboard_with(&[]);

        dash.add_city("Paris");
        dash.add_city("Berlin");
        dash.remove_city("Paris");

        assert_eq!(
            *writes.borrow(),
            vec![names(&["Paris"]), names(&["Paris", "Berlin"]), names(&["Berlin"])]
        );
    }

    #[test]
    fn adding_a_watched_city_changes_nothing() {
        let (mut dash, writes) = dashboard_with(&[]);
        let effects = dash.add_city("Paris");
        dash.weather_fetched("Paris", ticket_for(&effects, "Paris"), Ok(snapshot("Paris", 18)));

        let effects = dash.add_city("Paris");

        assert!(effects.is_empty());
        assert_eq!(dash.cities(), names(&["Paris"]).as_slice());
        assert_eq!(writes.borrow().len(), 1);
        assert_eq!(dash.snapshot("Paris").map(|s| s.temperature_celsius), Some(18));
        assert!(!dash.is_loading("Paris"));
    }

    #[test]
    fn adding_a_loading_city_issues_no_second_fetch() {
        let (mut dash, _) = dashboard_with(&[]);
        assert_eq!(dash.add_city("Paris").len(), 1);
        assert!(dash.is_loading("Paris"));

        assert!(dash.add_city("Paris").is_empty());
        assert!(dash.refresh("Paris").is_none());
    }

    #[test]
    fn city_identity_is_case_sensitive() {
        let (mut dash, _) = dashboard_with(&[]);
        dash.add_city("Paris");
        dash.add_city("paris");
        assert_eq!(dash.cities(), names(&["Paris", "paris"]).as_slice());
    }

    #[test]
    fn blank_names_are_ignored() {
        let (mut dash, writes) = dashboard_with(&[]);
        assert!(dash.add_city("   ").is_empty());
        assert!(dash.cities().is_empty());
        assert!(writes.borrow().is_empty());
    }

    #[test]
    fn removing_an_unknown_city_does_not_save() {
        let (mut dash, writes) = dashboard_with(&["Paris"]);
        assert!(dash.remove_city("Rome").is_empty());
        assert!(writes.borrow().is_empty());
    }

    #[test]
    fn startup_reconcile_fetches_restored_cities() {
        let (mut dash, writes) = dashboard_with(&["Paris", "Lima"]);

        let effects = dash.reconcile();

        assert_eq!(effects.len(), 2);
        assert!(dash.is_loading("Paris"));
        assert!(dash.is_loading("Lima"));
        assert!(writes.borrow().is_empty());

        // A second pass issues nothing while the fetches are in flight.
        assert!(dash.reconcile().is_empty());
    }

    #[test]
    fn restored_duplicates_are_collapsed() {
        let (dash, _) = dashboard_with(&["Paris", "Paris", "Lima"]);
        assert_eq!(dash.cities(), names(&["Paris", "Lima"]).as_slice());
    }

    #[test]
    fn weather_after_removal_is_discarded() {
        let (mut dash, _) = dashboard_with(&[]);
        let effects = dash.add_city("Paris");
        let ticket = ticket_for(&effects, "Paris");

        dash.remove_city("Paris");
        let applied = dash.weather_fetched("Paris", ticket, Ok(snapshot("Paris", 18)));

        assert!(!applied);
        assert!(dash.snapshot("Paris").is_none());
        assert!(!dash.is_loading("Paris"));
    }

    #[test]
    fn late_weather_from_a_previous_add_is_discarded() {
        let (mut dash, _) = dashboard_with(&[]);
        let old = ticket_for(&dash.add_city("Paris"), "Paris");
        dash.remove_city("Paris");
        let new = ticket_for(&dash.add_city("Paris"), "Paris");

        assert!(!dash.weather_fetched("Paris", old, Ok(snapshot("Paris", 1))));
        assert!(dash.is_loading("Paris"));

        assert!(dash.weather_fetched("Paris", new, Ok(snapshot("Paris", 2))));
        assert_eq!(dash.snapshot("Paris").map(|s| s.temperature_celsius), Some(2));
    }

    #[test]
    fn failure_clears_loading_and_keeps_previous_snapshot() {
        let (mut dash, _) = dashboard_with(&[]);
        let ticket = ticket_for(&dash.add_city("Paris"), "Paris");
        dash.weather_fetched("Paris", ticket, Ok(snapshot("Paris", 18)));

        let Some(Effect::FetchWeather { ticket, .. }) = dash.refresh("Paris") else {
            panic!("refresh should issue a fetch");
        };
        assert!(dash.is_loading("Paris"));
        assert_eq!(dash.snapshot("Paris").map(|s| s.temperature_celsius), Some(18));

        dash.weather_fetched("Paris", ticket, Err(FetchError::Transport("boom".into())));

        assert!(!dash.is_loading("Paris"));
        assert_eq!(dash.snapshot("Paris").map(|s| s.temperature_celsius), Some(18));
    }

    #[test]
    fn failed_city_is_retried_on_next_watchlist_change() {
        let (mut dash, _) = dashboard_with(&[]);
        let ticket = ticket_for(&dash.add_city("Paris"), "Paris");
        dash.weather_fetched(
            "Paris",
            ticket,
            Err(FetchError::ProviderRejected("city not found".into())),
        );
        assert!(dash.snapshot("Paris").is_none());
        assert!(!dash.is_loading("Paris"));

        let effects = dash.add_city("Berlin");

        assert_eq!(effects.len(), 2);
        ticket_for(&effects, "Paris");
        ticket_for(&effects, "Berlin");
    }

    #[test]
    fn failed_city_is_retried_after_a_removal() {
        let (mut dash, writes) = dashboard_with(&[]);
        let paris = ticket_for(&dash.add_city("Paris"), "Paris");
        let berlin = ticket_for(&dash.add_city("Berlin"), "Berlin");
        dash.weather_fetched("Berlin", berlin, Ok(snapshot("Berlin", 12)));
        dash.weather_fetched("Paris", paris, Err(FetchError::Transport("offline".into())));
        assert!(!dash.is_loading("Paris"));

        let effects = dash.remove_city("Berlin");

        assert_eq!(effects.len(), 1);
        let retry = ticket_for(&effects, "Paris");
        assert_ne!(retry, paris);
        assert!(dash.is_loading("Paris"));
        assert_eq!(writes.borrow().last(), Some(&names(&["Paris"])));
    }

    #[test]
    fn blank_query_short_circuits() {
        let (mut dash, _) = dashboard_with(&[]);
        assert!(dash.set_search_query("").is_none());
        assert!(dash.set_search_query("   ").is_none());
        assert!(!dash.is_searching());
        assert!(dash.search_results().is_empty());
    }

    #[test]
    fn only_latest_search_is_applied() {
        let (mut dash, _) = dashboard_with(&[]);
        let Some(Effect::SearchCities { seq: first, .. }) = dash.set_search_query("Pa") else {
            panic!("expected search effect");
        };
        let Some(Effect::SearchCities { seq: second, query }) = dash.set_search_query("Par") else {
            panic!("expected search effect");
        };
        assert_eq!(query, "Par");
        assert!(dash.is_searching());

        let paris = vec![SearchResult {
            name: "Paris".into(),
            country: "France".into(),
        }];
        assert!(dash.search_finished(second, Ok(paris.clone())));
        assert!(!dash.search_finished(
            first,
            Ok(vec![SearchResult {
                name: "Pamplona".into(),
                country: "Spain".into(),
            }])
        ));

        assert_eq!(dash.search_results(), paris.as_slice());
        assert!(!dash.is_searching());
    }

    #[test]
    fn search_error_degrades_to_no_results() {
        let (mut dash, _) = dashboard_with(&[]);
        let Some(Effect::SearchCities { seq, .. }) = dash.set_search_query("Par") else {
            panic!("expected search effect");
        };

        dash.search_finished(seq, Err(SearchError::Transport("offline".into())));

        assert!(dash.search_results().is_empty());
        assert!(!dash.is_searching());
        assert_eq!(dash.search_query(), "Par");
    }

    #[test]
    fn adding_a_city_closes_the_search() {
        let (mut dash, _) = dashboard_with(&[]);
        let Some(Effect::SearchCities { seq, .. }) = dash.set_search_query("Par") else {
            panic!("expected search effect");
        };

        dash.add_city("Paris");

        assert_eq!(dash.search_query(), "");
        assert!(!dash.is_searching());
        assert!(!dash.search_finished(
            seq,
            Ok(vec![SearchResult {
                name: "Paris".into(),
                country: "France".into(),
            }])
        ));
        assert!(dash.search_results().is_empty());
    }

    #[test]
    fn paris_round_trip() {
        let (mut dash, writes) = dashboard_with(&[]);

        let effects = dash.add_city("Paris");
        assert_eq!(effects.len(), 1);
        assert!(dash.is_loading("Paris"));

        dash.weather_fetched("Paris", ticket_for(&effects, "Paris"), Ok(snapshot("Paris", 18)));
        let card = dash.cards().next().expect("one card");
        assert_eq!(card.name, "Paris");
        assert!(!card.loading);
        let temp = card.snapshot.map(|s| s.temperature_celsius).unwrap();
        assert_eq!(dash.format_temperature(temp), "18°C");

        dash.toggle_unit();
        assert_eq!(dash.unit(), TemperatureUnit::Fahrenheit);
        assert_eq!(dash.format_temperature(temp), "64°F");

        dash.remove_city("Paris");
        assert!(dash.cities().is_empty());
        assert!(dash.snapshot("Paris").is_none());
        assert_eq!(writes.borrow().last(), Some(&Vec::<String>::new()));
        assert!(dash.store().load().is_empty());
    }
}
