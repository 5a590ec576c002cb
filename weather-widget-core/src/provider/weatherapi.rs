use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    condition::{Condition, CurrentConditions},
    model::Coordinates,
    provider::{FetchError, ProviderId, get_json, trimmed_base},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// WeatherAPI.com current conditions; free-text labels, keyed access.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

// Keeps the key out of logs.
impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        Self { api_key, base_url: trimmed_base(base_url, DEFAULT_BASE_URL), http: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
    humidity: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: Option<WaCurrent>,
}

impl WaResponse {
    fn into_conditions(self) -> Result<CurrentConditions, FetchError> {
        let current = self
            .current
            .ok_or_else(|| FetchError::Malformed("WeatherAPI response has no `current` block".into()))?;
        let temperature = current
            .temp_c
            .filter(|t| t.is_finite())
            .ok_or_else(|| FetchError::Malformed("WeatherAPI response has no temp_c".into()))?;

        let text = current.condition.and_then(|c| c.text).unwrap_or_default();

        Ok(CurrentConditions {
            temperature,
            humidity: current.humidity,
            condition: Condition::Text(text),
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    #[instrument(skip(self), fields(provider = "weatherapi"))]
    async fn current(&self, coords: &Coordinates) -> Result<CurrentConditions, FetchError> {
        let url = format!("{}/v1/current.json", self.base_url);
        let query = [
            ("key", self.api_key.clone()),
            ("q", coords.to_string()),
            ("aqi", "no".to_string()),
        ];

        let parsed: WaResponse = get_json(&self.http, &url, &query).await?;
        debug!(?parsed, "WeatherAPI response");
        parsed.into_conditions()
    }
}
