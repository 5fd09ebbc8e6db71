//! In-process stand-in for the weather service used by unit tests.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    model::{CitySuggestion, Condition, Coordinates, MainReading, WatchedCity, WindReading},
    provider::{ApiError, WeatherApi},
};

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    suggestions: HashMap<String, Vec<CitySuggestion>>,
    delays: HashMap<String, Duration>,
    failing_geocode: HashSet<String>,
    failing_current: HashSet<String>,
    temps: Mutex<HashMap<String, f64>>,
    places: HashMap<String, String>,
    geocode_calls: Mutex<Vec<String>>,
    current_calls: Mutex<Vec<String>>,
}

pub(crate) fn snapshot(name: &str, kelvin: f64) -> WatchedCity {
    WatchedCity {
        name: name.to_string(),
        id: None,
        coord: None,
        main: MainReading { temp: kelvin, humidity: 60 },
        wind: WindReading { speed: 3.5 },
        weather: vec![Condition {
            description: "scattered clouds".into(),
            icon: "03d".into(),
        }],
        dt: Some(1_700_000_000),
    }
}

fn coord_key(lat: f64, lon: f64) -> String {
    format!("{lat:.2},{lon:.2}")
}

impl FakeApi {
    pub fn with_suggestions(mut self, query: &str, names: &[&str]) -> Self {
        let list = names
            .iter()
            .enumerate()
            .map(|(i, name)| CitySuggestion {
                name: name.to_string(),
                state: None,
                country: "XX".into(),
                lat: i as f64,
                lon: i as f64,
            })
            .collect();
        self.suggestions.insert(query.to_string(), list);
        self
    }

    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    pub fn failing_geocode(mut self, query: &str) -> Self {
        self.failing_geocode.insert(query.to_string());
        self
    }

    pub fn failing_current(mut self, name: &str) -> Self {
        self.failing_current.insert(name.to_string());
        self
    }

    /// Register what a coordinate lookup resolves to.
    pub fn with_place(mut self, lat: f64, lon: f64, name: &str) -> Self {
        self.places.insert(coord_key(lat, lon), name.to_string());
        self
    }

    pub fn set_temp(&self, name: &str, kelvin: f64) {
        self.temps.lock().insert(name.to_string(), kelvin);
    }

    pub fn geocode_calls(&self) -> Vec<String> {
        self.geocode_calls.lock().clone()
    }

    pub fn current_calls(&self) -> Vec<String> {
        self.current_calls.lock().clone()
    }

    async fn pause_for(&self, key: &str) {
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            body: r#"{"cod":"404","message":"city not found"}"#.into(),
        }
    }

    fn current(&self, name: &str) -> Result<WatchedCity, ApiError> {
        if self.failing_current.contains(name) {
            return Err(Self::not_found());
        }
        let kelvin = self.temps.lock().get(name).copied().unwrap_or(283.15);
        Ok(snapshot(name, kelvin))
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn geocode(&self, query: &str, _limit: u8) -> Result<Vec<CitySuggestion>, ApiError> {
        self.geocode_calls.lock().push(query.to_string());
        self.pause_for(query).await;

        if self.failing_geocode.contains(query) {
            return Err(Self::not_found());
        }
        Ok(self.suggestions.get(query).cloned().unwrap_or_default())
    }

    async fn current_by_name(&self, name: &str) -> Result<WatchedCity, ApiError> {
        self.current_calls.lock().push(name.to_string());
        self.pause_for(name).await;
        self.current(name)
    }

    async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WatchedCity, ApiError> {
        let key = coord_key(lat, lon);
        self.current_calls.lock().push(key.clone());
        self.pause_for(&key).await;

        let name = self.places.get(&key).ok_or_else(Self::not_found)?;
        let mut city = self.current(name)?;
        city.coord = Some(Coordinates { lat, lon });
        Ok(city)
    }
}
