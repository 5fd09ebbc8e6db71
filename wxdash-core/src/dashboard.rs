//! The watch-list container.
//!
//! Every mutation writes the full list back to the store before the in-memory
//! list is replaced, so a failed lookup or write leaves both untouched.

use std::{collections::HashSet, sync::Arc};

use crate::{
    card::{self, Card},
    model::{Coordinates, Selection, TemperatureUnit, WatchedCity},
    provider::{ApiError, WeatherApi},
    storage::{self, KeyValueStore, StorageError},
};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0} is not on the watch-list")]
    NotWatched(String),
    #[error("{0} is already on the watch-list")]
    AlreadyWatched(String),
}

#[derive(Debug)]
pub struct Dashboard<S: KeyValueStore> {
    api: Arc<dyn WeatherApi>,
    store: S,
    cities: Vec<WatchedCity>,
    unit: TemperatureUnit,
}

impl<S: KeyValueStore> Dashboard<S> {
    /// Open the dashboard on whatever the store currently holds.
    pub fn load(api: Arc<dyn WeatherApi>, store: S) -> Result<Self, DashboardError> {
        let cities = storage::load_cities(&store)?;
        tracing::debug!("Loaded {} watched cities", cities.len());

        Ok(Self {
            api,
            store,
            cities,
            unit: TemperatureUnit::default(),
        })
    }

    pub fn cities(&self) -> &[WatchedCity] {
        &self.cities
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_watched(&self, name: &str) -> bool {
        self.cities.iter().any(|c| c.name == name)
    }

    /// Look a city up by name and append it.
    pub async fn add_city(&mut self, name: &str) -> Result<&WatchedCity, DashboardError> {
        let fetched = self.api.current_by_name(name).await?;
        self.append(fetched)
    }

    /// Append the city picked from the search suggestions, looked up by its coordinates.
    pub async fn add_selection(
        &mut self,
        selection: &Selection,
    ) -> Result<&WatchedCity, DashboardError> {
        let fetched = self
            .api
            .current_by_coords(selection.lat, selection.lon)
            .await?;
        self.append(fetched)
    }

    fn append(&mut self, city: WatchedCity) -> Result<&WatchedCity, DashboardError> {
        if self.is_watched(&city.name) {
            return Err(DashboardError::AlreadyWatched(city.name));
        }

        let name = city.name.clone();
        let mut next = self.cities.clone();
        next.push(city);
        self.commit(next)?;

        tracing::info!("Added {name} to the watch-list");
        Ok(&self.cities[self.cities.len() - 1])
    }

    /// Re-fetch `name` and replace every entry carrying that name.
    ///
    /// Entries with stored coordinates are re-fetched by coordinates, so a
    /// city picked from the suggestions keeps pointing at the same place.
    /// Returns how many entries were replaced.
    pub async fn refresh_city(&mut self, name: &str) -> Result<usize, DashboardError> {
        if !self.is_watched(name) {
            return Err(DashboardError::NotWatched(name.to_string()));
        }

        // One request per distinct location, even with duplicate entries.
        let mut fetched: Vec<(Option<Coordinates>, WatchedCity)> = Vec::new();
        let mut next = Vec::with_capacity(self.cities.len());
        let mut replaced = 0;

        for city in &self.cities {
            if city.name != name {
                next.push(city.clone());
                continue;
            }

            let fresh = match fetched.iter().find(|(at, _)| *at == city.coord) {
                Some((_, fresh)) => fresh.clone(),
                None => {
                    let fresh = self.refetch(city).await?;
                    fetched.push((city.coord, fresh.clone()));
                    fresh
                }
            };
            next.push(fresh);
            replaced += 1;
        }
        self.commit(next)?;

        tracing::info!("Refreshed {name}");
        Ok(replaced)
    }

    async fn refetch(&self, current: &WatchedCity) -> Result<WatchedCity, ApiError> {
        let mut fresh = match current.coord {
            Some(at) => self.api.current_by_coords(at.lat, at.lon).await?,
            None => self.api.current_by_name(&current.name).await?,
        };

        // The watched name stays the handle for later refresh/remove calls.
        fresh.name.clone_from(&current.name);
        if fresh.coord.is_none() {
            fresh.coord = current.coord;
        }
        Ok(fresh)
    }

    /// Refresh each distinct city once. Failures are logged and skipped.
    ///
    /// Returns the names that could not be refreshed.
    pub async fn refresh_all(&mut self) -> Vec<String> {
        let mut seen = HashSet::new();
        let names: Vec<String> = self
            .cities
            .iter()
            .filter(|c| seen.insert(c.name.clone()))
            .map(|c| c.name.clone())
            .collect();

        let mut failed = Vec::new();
        for name in names {
            if let Err(e) = self.refresh_city(&name).await {
                tracing::error!("Error refreshing {name}: {e}");
                failed.push(name);
            }
        }
        failed
    }

    /// Drop every entry named `name`. Returns how many were removed.
    pub fn remove_city(&mut self, name: &str) -> Result<usize, DashboardError> {
        let next: Vec<_> = self
            .cities
            .iter()
            .filter(|c| c.name != name)
            .cloned()
            .collect();
        let removed = self.cities.len() - next.len();
        self.commit(next)?;

        tracing::info!("Removed {removed} entries named {name}");
        Ok(removed)
    }

    /// Flip between Celsius and Fahrenheit. Not persisted.
    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.unit = self.unit.toggled();
        self.unit
    }

    /// One card per watched city; `expanded` decides which show the hourly panel.
    pub fn cards(&self, expanded: impl Fn(&WatchedCity) -> bool) -> Vec<Card> {
        self.cities
            .iter()
            .map(|c| card::render(c, self.unit, expanded(c)))
            .collect()
    }

    fn commit(&mut self, next: Vec<WatchedCity>) -> Result<(), DashboardError> {
        storage::save_cities(&mut self.store, &next)?;
        self.cities = next;
        Ok(())
    }
}
