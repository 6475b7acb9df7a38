//! Weather API client
//!
//! Forwards current-weather lookups to the third-party API. Every failure is
//! folded into an `{"error": ...}` value instead of being raised.

use reqwest::header::ACCEPT;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::weather::{API_HOST, COUNTRY_CODE, CURRENT_WEATHER_PATH};
use crate::config::Config;
use crate::error::{ExternalServiceError, Result};

/// Arguments of `get_weather`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WeatherQuery {
    /// City name, looked up within India
    pub city: String,
}

/// Weather API client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API base URL, without trailing slash
    base_url: String,

    /// RapidAPI key
    api_key: Option<String>,
}

impl WeatherClient {
    /// Create a new weather client
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if api_key.is_none() {
            tracing::warn!("API_KEY is not set; weather requests will likely be rejected");
        }

        Self {
            http_client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.weather_api_url, config.weather_api_key.clone())
    }

    /// URL of the current-weather endpoint
    fn current_url(&self) -> String {
        format!("{}{}", self.base_url, CURRENT_WEATHER_PATH)
    }

    /// Current weather for `city`, or an `{"error": ...}` object
    pub async fn get_weather(&self, city: &str) -> Value {
        match self.fetch_current(city).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "weather lookup failed");
                json!({ "error": format!("Failed to get weather: {}", e) })
            }
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<Value> {
        let place = format!("{},{}", city, COUNTRY_CODE);

        let mut request = self
            .http_client
            .get(self.current_url())
            .header("x-rapidapi-host", API_HOST)
            .header(ACCEPT, "application/json")
            .query(&[
                ("lat", "0"),
                ("place", place.as_str()),
                ("units", "standard"),
                ("lang", "en"),
                ("mode", "json"),
            ]);

        if let Some(key) = &self.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let response = request.send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ExternalServiceError::Status {
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }
}
