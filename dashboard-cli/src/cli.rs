use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_dashboard_core::{
    CitySearch, Config, Dashboard, FileStore, KeyValueStore, ProviderId, Runtime,
    TemperatureUnit, WatchlistStore,
    provider::{city_search_from_config, weather_provider_from_config},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather for a watchlist of cities")]
pub struct Cli {
    /// Show temperatures in Fahrenheit instead of Celsius.
    #[arg(short, long, global = true)]
    pub fahrenheit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a provider ("openweather" or "citysearch").
    Configure {
        provider: String,
    },

    /// Show current weather for every watched city.
    List,

    /// Add a city to the watchlist and show its weather.
    Add {
        city: String,
    },

    /// Remove a city from the watchlist.
    Remove {
        city: String,
    },

    /// Look up city names.
    Search {
        query: String,

        /// Choose one of the results interactively and add it.
        #[arg(long)]
        pick: bool,
    },
}

impl Cli {
    fn unit(&self) -> TemperatureUnit {
        if self.fahrenheit {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let unit = self.unit();

        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Remove { city } => {
                let config = Config::load()?;
                let mut dashboard = Dashboard::new(open_store(&config)?);
                if dashboard.contains(&city) {
                    // Nothing is fetched here; reconciliation effects are dropped.
                    dashboard.remove_city(&city);
                    println!("Removed {city}.");
                } else {
                    println!("{city} is not on the watchlist.");
                }
                Ok(())
            }
            Command::List => {
                let mut rt = open_runtime(unit)?;
                rt.start();
                rt.settle().await;
                print!("{}", render::watchlist(rt.dashboard()));
                Ok(())
            }
            Command::Add { city } => {
                let mut rt = open_runtime(unit)?;
                print!("{}", add_and_show(&mut rt, &city).await);
                Ok(())
            }
            Command::Search { query, pick } => {
                let mut rt = open_runtime(unit)?;
                rt.set_search_query(query);
                rt.settle().await;

                let results = rt.dashboard().search_results().to_vec();
                if results.is_empty() {
                    println!("No results.");
                    return Ok(());
                }
                if !pick {
                    print!("{}", render::search_results(&results));
                    return Ok(());
                }

                let choice = Select::new("Add which city?", results)
                    .prompt()
                    .context("City selection was cancelled")?;
                print!("{}", add_and_show(&mut rt, &choice.name).await);
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key prompt was cancelled")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved API key for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<WatchlistStore<FileStore>> {
    let path = config.storage_file_path()?;
    tracing::debug!(path = %path.display(), "opening watchlist storage");
    Ok(WatchlistStore::new(FileStore::new(path)))
}

fn open_runtime(unit: TemperatureUnit) -> anyhow::Result<Runtime<FileStore>> {
    let config = Config::load()?;
    let weather = weather_provider_from_config(&config)?;

    let search = match city_search_from_config(&config) {
        Ok(provider) => CitySearch::new(provider),
        Err(err) => {
            tracing::debug!(error = %err, "city search unavailable");
            CitySearch::disabled()
        }
    };

    let mut dashboard = Dashboard::new(open_store(&config)?);
    dashboard.set_unit(unit);
    Ok(Runtime::new(dashboard, weather, search))
}

/// Add `city` (or refresh it when already watched) and render its card.
async fn add_and_show<S: KeyValueStore>(rt: &mut Runtime<S>, city: &str) -> String {
    let mut out = String::new();

    if rt.dashboard().contains(city) {
        out.push_str(&format!("{city} is already on the watchlist.\n"));
        rt.refresh(city);
    } else {
        rt.add_city(city);
    }
    rt.settle().await;

    if let Some(card) = rt.dashboard().cards().find(|c| c.name == city) {
        out.push_str(&render::city_card(rt.dashboard(), &card));
    }
    out
}
