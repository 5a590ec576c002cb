use crate::{
    Config,
    condition::CurrentConditions,
    model::Coordinates,
    provider::{openmeteo::OpenMeteoProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};
use thiserror::Error;

pub mod openmeteo;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::WeatherApi]
    }

    /// WeatherAPI.com embeds a secret key in the query string; Open-Meteo is keyless.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::WeatherApi)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: open-meteo, weatherapi."
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather provider answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Current conditions at `coords`, in Celsius.
    async fn current(&self, coords: &Coordinates) -> Result<CurrentConditions, FetchError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let base_url = config.provider_base_url(id);

    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => Arc::new(OpenMeteoProvider::new(base_url)),
        ProviderId::WeatherApi => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `weather-widget configure {id}` and enter your API key."
                )
            })?;
            Arc::new(WeatherApiProvider::new(api_key.to_owned(), base_url))
        }
    };

    Ok(provider)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// One JSON GET. Non-2xx and undecodable bodies are errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    let res = http.get(url).query(query).header(ACCEPT, "application/json").send().await?;

    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
}

pub(crate) fn trimmed_base(base_url: Option<&str>, default: &str) -> String {
    base_url.unwrap_or(default).trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ProviderConfig};

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_accepts_alias_and_case() {
        assert_eq!(ProviderId::try_from("OpenMeteo").unwrap(), ProviderId::OpenMeteo);
        assert_eq!(ProviderId::try_from("WeatherAPI").unwrap(), ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::WeatherApi, &cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider"));
        assert!(msg.contains("Hint: run `weather-widget configure weatherapi`"));
    }

    #[test]
    fn keyless_provider_builds_without_config() {
        let cfg = Config::default();
        let provider = provider_from_config(ProviderId::OpenMeteo, &cfg).expect("keyless");

        assert_eq!(provider.id(), ProviderId::OpenMeteo);
    }

    #[test]
    fn default_provider_from_config_uses_configured_id() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());

        let provider = default_provider_from_config(&cfg).expect("configured");
        assert_eq!(provider.id(), ProviderId::WeatherApi);
    }

    #[test]
    fn base_url_override_is_trimmed() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "open-meteo".into(),
            ProviderConfig { api_key: None, base_url: Some("http://127.0.0.1:8080/".into()) },
        );

        assert_eq!(
            trimmed_base(cfg.provider_base_url(ProviderId::OpenMeteo), "https://unused"),
            "http://127.0.0.1:8080"
        );
        assert_eq!(trimmed_base(None, "https://api.open-meteo.com"), "https://api.open-meteo.com");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "ñ".repeat(300);
        let cut = truncate_body(&long);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
