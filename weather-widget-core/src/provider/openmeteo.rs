use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    condition::{Condition, CurrentConditions, GENERIC_LABEL},
    model::Coordinates,
    provider::{FetchError, ProviderId, get_json, trimmed_base},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Open-Meteo current conditions; reports WMO codes, needs no key.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: Option<&str>) -> Self {
        Self { base_url: trimmed_base(base_url, DEFAULT_BASE_URL), http: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    weather_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: Option<OmCurrent>,
}

impl OmResponse {
    fn into_conditions(self) -> Result<CurrentConditions, FetchError> {
        let current = self
            .current
            .ok_or_else(|| FetchError::Malformed("Open-Meteo response has no `current` block".into()))?;
        let temperature = current
            .temperature_2m
            .filter(|t| t.is_finite())
            .ok_or_else(|| FetchError::Malformed("Open-Meteo response has no temperature".into()))?;

        let condition = match current.weather_code {
            Some(code) => Condition::Code(code),
            None => Condition::Text(GENERIC_LABEL.to_string()),
        };

        Ok(CurrentConditions { temperature, humidity: None, condition })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    #[instrument(skip(self), fields(provider = "open-meteo"))]
    async fn current(&self, coords: &Coordinates) -> Result<CurrentConditions, FetchError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
        ];

        let parsed: OmResponse = get_json(&self.http, &url, &query).await?;
        debug!(?parsed, "Open-Meteo response");
        parsed.into_conditions()
    }
}
