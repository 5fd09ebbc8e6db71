//! Core library for the `wxdash` weather watch-list.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherApi` trait
//! - Debounced city search
//! - The persisted watch-list and its card rendering
//!
//! It is used by `wxdash-cli`, but can also back other front ends.

pub mod card;
pub mod config;
pub mod dashboard;
pub mod model;
pub mod provider;
pub mod search;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use card::{Card, TempBand};
pub use config::{Config, SearchConfig};
pub use dashboard::{Dashboard, DashboardError};
pub use model::{CitySuggestion, Selection, TemperatureUnit, WatchedCity};
pub use provider::{ApiError, WeatherApi, openweather::OpenWeatherProvider};
pub use search::{CitySearch, SearchSnapshot};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
