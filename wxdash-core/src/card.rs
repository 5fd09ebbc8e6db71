//! Presentation of one watched city.

use std::fmt;

use chrono::Local;

use crate::model::{TemperatureUnit, WatchedCity};

/// Hour labels and offsets of the placeholder hourly forecast.
///
/// These are fixed nudges around the current reading, not fetched data.
const MOCK_FORECAST: [(&str, f64); 4] = [("12PM", -1.0), ("3PM", 0.5), ("6PM", -0.8), ("9PM", -2.0)];

/// Colour bucket for a displayed temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempBand {
    Freezing,
    Cold,
    Mild,
    Warm,
    Hot,
}

impl TempBand {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            TempBand::Freezing
        } else if value < 10.0 {
            TempBand::Cold
        } else if value < 20.0 {
            TempBand::Mild
        } else if value < 30.0 {
            TempBand::Warm
        } else {
            TempBand::Hot
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            TempBand::Freezing => "blue-600",
            TempBand::Cold => "blue-400",
            TempBand::Mild => "green-500",
            TempBand::Warm => "yellow-500",
            TempBand::Hot => "red-500",
        }
    }
}

/// Card background, always bucketed on the Celsius value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Icy,
    Cool,
    Fresh,
    Balmy,
    Scorching,
}

impl Backdrop {
    pub fn of_celsius(celsius: f64) -> Self {
        match TempBand::of(celsius) {
            TempBand::Freezing => Backdrop::Icy,
            TempBand::Cold => Backdrop::Cool,
            TempBand::Mild => Backdrop::Fresh,
            TempBand::Warm => Backdrop::Balmy,
            TempBand::Hot => Backdrop::Scorching,
        }
    }

    /// `(from, to)` gradient stops.
    pub fn gradient(self) -> (&'static str, &'static str) {
        match self {
            Backdrop::Icy => ("blue-100", "blue-50"),
            Backdrop::Cool => ("blue-50", "indigo-50"),
            Backdrop::Fresh => ("green-50", "blue-50"),
            Backdrop::Balmy => ("yellow-50", "orange-50"),
            Backdrop::Scorching => ("orange-50", "red-50"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub time: &'static str,
    pub temperature: f64,
    pub band: TempBand,
    pub icon_url: Option<String>,
}

impl ForecastPoint {
    /// Short form without the unit letter, e.g. `"9.0°"`.
    pub fn display(&self) -> String {
        format!("{:.1}°", self.temperature)
    }
}

/// Everything needed to draw one city.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub name: String,
    pub unit: TemperatureUnit,
    pub temperature: f64,
    pub band: TempBand,
    pub backdrop: Backdrop,
    pub description: String,
    pub icon_url: Option<String>,
    pub humidity: String,
    pub wind: String,
    pub updated_at: Option<String>,
    /// Present only when the forecast panel is expanded.
    pub forecast: Option<Vec<ForecastPoint>>,
}

impl Card {
    /// e.g. `"10.0°C"`.
    pub fn display_temperature(&self) -> String {
        format!("{:.1}°{}", self.temperature, self.unit.symbol())
    }
}

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Build the card for `city` in `unit`; `expanded` adds the hourly panel.
pub fn render(city: &WatchedCity, unit: TemperatureUnit, expanded: bool) -> Card {
    let temperature = unit.from_kelvin(city.main.temp);
    let celsius = TemperatureUnit::Celsius.from_kelvin(city.main.temp);

    let condition = city.condition();
    let icon_url = condition
        .filter(|c| !c.icon.is_empty())
        .map(|c| icon_url(&c.icon));

    let forecast: Option<Vec<ForecastPoint>> = expanded.then(|| {
        MOCK_FORECAST
            .iter()
            .map(|&(time, offset)| {
                let t = temperature + offset;
                ForecastPoint {
                    time,
                    temperature: t,
                    band: TempBand::of(t),
                    icon_url: icon_url.clone(),
                }
            })
            .collect()
    });

    Card {
        name: city.name.clone(),
        unit,
        temperature,
        band: TempBand::of(temperature),
        backdrop: Backdrop::of_celsius(celsius),
        description: condition.map(|c| c.description.clone()).unwrap_or_default(),
        icon_url,
        humidity: format!("{}%", city.main.humidity),
        wind: format!("{} m/s", city.wind.speed),
        updated_at: city
            .observed_at()
            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string()),
        forecast,
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        if let Some(at) = &self.updated_at {
            writeln!(f, "  Updated at {at}")?;
        }
        writeln!(
            f,
            "  {:>8}  {} [{:?}]",
            self.display_temperature(),
            self.description,
            self.band
        )?;
        writeln!(f, "  Humidity {}   Wind Speed {}", self.humidity, self.wind)?;

        if let Some(points) = &self.forecast {
            write!(f, "  Hourly forecast:")?;
            for p in points {
                write!(f, "  {} {}", p.time, p.display())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
