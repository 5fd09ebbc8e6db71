use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display unit for temperatures. Held in memory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    /// Convert an absolute temperature in kelvin to this unit.
    pub fn from_kelvin(self, kelvin: f64) -> f64 {
        let celsius = kelvin - 273.15;
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("Celsius (°C)"),
            TemperatureUnit::Fahrenheit => f.write_str("Fahrenheit (°F)"),
        }
    }
}

/// One city on the watch-list together with its last fetched snapshot.
///
/// The layout mirrors the OpenWeather current-conditions payload so the
/// persisted list is just the API responses that were accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedCity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Coordinates>,
    pub main: MainReading,
    pub wind: WindReading,
    pub weather: Vec<Condition>,
    /// Observation time as a unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReading {
    /// Kelvin.
    pub temp: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindReading {
    /// Metres per second.
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

impl WatchedCity {
    /// First reported condition; OpenWeather lists the primary one first.
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// A geocoding candidate offered while the user types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl CitySuggestion {
    /// "Springfield, Illinois, US" style label; the region is omitted when absent.
    pub fn label(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// What the search component hands to the dashboard when a suggestion is picked.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<&CitySuggestion> for Selection {
    fn from(s: &CitySuggestion) -> Self {
        Self {
            name: s.name.clone(),
            lat: s.lat,
            lon: s.lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_conversion() {
        assert!((TemperatureUnit::Celsius.from_kelvin(283.15) - 10.0).abs() < 1e-9);
        assert!((TemperatureUnit::Fahrenheit.from_kelvin(283.15) - 50.0).abs() < 1e-9);
        assert!((TemperatureUnit::Fahrenheit.from_kelvin(233.15) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn toggling_twice_is_identity() {
        let unit = TemperatureUnit::default();
        assert_eq!(unit.toggled().toggled(), unit);
        assert_eq!(unit.toggled(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn parses_openweather_current_payload() {
        let json = r#"{
            "coord": {"lon": 2.35, "lat": 48.85},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "main": {"temp": 283.15, "feels_like": 282.0, "humidity": 71, "pressure": 1012},
            "wind": {"speed": 3.6, "deg": 220},
            "dt": 1700000000,
            "id": 2988507,
            "name": "Paris",
            "cod": 200
        }"#;

        let city: WatchedCity = serde_json::from_str(json).expect("payload should parse");
        assert_eq!(city.name, "Paris");
        assert_eq!(city.id, Some(2988507));
        assert_eq!(city.main.humidity, 71);
        assert_eq!(city.condition().map(|c| c.icon.as_str()), Some("01d"));
        assert!(city.observed_at().is_some());
    }

    #[test]
    fn parses_minimal_persisted_entry() {
        let json = r#"{"name":"Oslo","main":{"temp":270.0,"humidity":80},"wind":{"speed":1.0},"weather":[]}"#;
        let city: WatchedCity = serde_json::from_str(json).expect("entry should parse");
        assert_eq!(city.id, None);
        assert!(city.condition().is_none());
        assert!(city.observed_at().is_none());
    }

    #[test]
    fn suggestion_label_skips_missing_state() {
        let mut s = CitySuggestion {
            name: "Springfield".into(),
            state: Some("Illinois".into()),
            country: "US".into(),
            lat: 39.8,
            lon: -89.6,
        };
        assert_eq!(s.label(), "Springfield, Illinois, US");

        s.state = None;
        assert_eq!(s.label(), "Springfield, US");
    }
}
