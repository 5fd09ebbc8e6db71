use crate::{
    Config,
    model::{CitySuggestion, WatchedCity},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Failure talking to the weather service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(
        "No API key configured.\n\
         Hint: run `wxdash configure` or set WXDASH_API_KEY."
    )]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The two lookups the dashboard needs from a weather service.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// City name → up to `limit` candidates, in the service's ranking order.
    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<CitySuggestion>, ApiError>;

    /// Current conditions for a free-text city name.
    async fn current_by_name(&self, name: &str) -> Result<WatchedCity, ApiError>;

    /// Current conditions for a coordinate pair.
    async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WatchedCity, ApiError>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherProvider, ApiError> {
    let api_key = config.api_key().ok_or(ApiError::MissingApiKey)?;

    Ok(OpenWeatherProvider::with_base_urls(
        api_key,
        config.api_base_url(),
        config.geo_base_url(),
    ))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
