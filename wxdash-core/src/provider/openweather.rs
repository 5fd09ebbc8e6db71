use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    model::{CitySuggestion, WatchedCity},
    provider::{ApiError, truncate_body},
};

use super::WeatherApi;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    api_base: String,
    geo_base: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// Point the client at other hosts (a proxy or a mock server).
    pub fn with_base_urls(api_key: String, api_base: &str, geo_base: &str) -> Self {
        Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            geo_base: geo_base.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, ApiError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::debug!("OpenWeather {what} request failed: {e}"))?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!("OpenWeather {what} returned status {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherProvider {
    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<CitySuggestion>, ApiError> {
        let url = format!("{}/geo/1.0/direct", self.geo_base);
        let found: Vec<CitySuggestion> = self
            .get_json(
                &url,
                &[("q", query.to_string()), ("limit", limit.to_string())],
                "geocoding",
            )
            .await?;

        tracing::debug!("Geocoding '{query}' returned {} candidates", found.len());
        Ok(found)
    }

    async fn current_by_name(&self, name: &str) -> Result<WatchedCity, ApiError> {
        let url = format!("{}/data/2.5/weather", self.api_base);
        self.get_json(&url, &[("q", name.to_string())], "current weather")
            .await
    }

    async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WatchedCity, ApiError> {
        let url = format!("{}/data/2.5/weather", self.api_base);
        self.get_json(
            &url,
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
            "current weather",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_payload(name: &str, temp: f64) -> serde_json::Value {
        serde_json::json!({
            "coord": {"lon": 2.35, "lat": 48.85},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": temp, "humidity": 82},
            "wind": {"speed": 4.1},
            "dt": 1700000000,
            "id": 42,
            "name": name
        })
    }

    async fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::with_base_urls("TEST_KEY".into(), &server.uri(), &server.uri())
    }

    #[tokio::test]
    async fn geocode_sends_query_limit_and_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Spring"))
            .and(query_param("limit", "5"))
            .and(query_param("appid", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.8, "lon": -89.6},
                {"name": "Springfield", "country": "US", "lat": 37.2, "lon": -93.3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let found = provider_for(&server).await.geocode("Spring", 5).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].state.as_deref(), Some("Illinois"));
        assert_eq!(found[1].state, None);
    }

    #[tokio::test]
    async fn current_by_name_parses_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Paris", 283.15)))
            .mount(&server)
            .await;

        let city = provider_for(&server).await.current_by_name("Paris").await.unwrap();

        assert_eq!(city.name, "Paris");
        assert_eq!(city.main.temp, 283.15);
        assert_eq!(city.wind.speed, 4.1);
        assert_eq!(city.condition().map(|c| c.description.as_str()), Some("light rain"));
    }

    #[tokio::test]
    async fn current_by_coords_uses_lat_lon() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Paris", 280.0)))
            .expect(1)
            .mount(&server)
            .await;

        let city = provider_for(&server)
            .await
            .current_by_coords(48.85, 2.35)
            .await
            .unwrap();
        assert_eq!(city.name, "Paris");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .await
            .current_by_name("Atlantis")
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, ref body } => {
                assert_eq!(status, 404);
                assert!(body.contains("city not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.geocode("Paris", 5).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
