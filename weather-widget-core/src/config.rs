use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, Local, Offset};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    geolocation::{LocationError, PositionOptions},
    model::Coordinates,
    provider::ProviderId,
};

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's public endpoint, e.g. to point at a local mock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Where live fixes come from when the host has no positioning hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationSource {
    /// No geolocation capability at all.
    #[default]
    None,
    /// A fixed fix from `latitude` / `longitude`.
    Fixed,
    /// A capability that always refuses permission.
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub source: GeolocationSource,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub enable_high_accuracy: bool,
    pub timeout_secs: u64,
    pub maximum_age_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            source: GeolocationSource::None,
            latitude: None,
            longitude: None,
            enable_high_accuracy: false,
            timeout_secs: 20,
            maximum_age_secs: 10 * 60,
        }
    }
}

impl GeolocationConfig {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_secs(self.timeout_secs),
            maximum_age: Duration::from_secs(self.maximum_age_secs),
        }
    }

    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        let coords = Coordinates::new(self.latitude?, self.longitude?);
        coords.is_finite().then_some(coords)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Session file; defaults to a file under the OS temp directory.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn session_file(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("weather-widget").join("session.json"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Offset used for the "updated" clock; the host's local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl DisplayConfig {
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// Every user-visible string the widget writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub no_data: String,
    pub updating: String,
    pub updated: String,
    pub using_last_location: String,
    pub last_known_note: String,
    pub fetch_failed: String,
    pub geolocation_unavailable: String,
    pub permission_denied: String,
    pub location_timeout: String,
    pub location_failed: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            no_data: "Sin datos".into(),
            updating: "Actualizando...".into(),
            updated: "Actualizado".into(),
            using_last_location: "Usando ultima ubicacion".into(),
            last_known_note: "ultima ubicacion".into(),
            fetch_failed: "No se pudo obtener clima".into(),
            geolocation_unavailable: "Geolocalizacion no disponible".into(),
            permission_denied: "Permiso de ubicacion denegado".into(),
            location_timeout: "Tiempo de espera de ubicacion".into(),
            location_failed: "No se pudo obtener ubicacion".into(),
        }
    }
}

impl Labels {
    pub fn location_message(&self, error: &LocationError) -> &str {
        let message = match error {
            LocationError::Unavailable => &self.geolocation_unavailable,
            LocationError::PermissionDenied => &self.permission_denied,
            LocationError::Timeout => &self.location_timeout,
            LocationError::Other(_) => &self.location_failed,
        };
        message.as_str()
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "open-meteo" or "weatherapi".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub geolocation: GeolocationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub labels: Labels,
}

impl Config {
    /// The configured provider, or the keyless Open-Meteo when none is set.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key and make it the default if none is set yet.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key =
            Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present and non-blank.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).and_then(|cfg| cfg.base_url.as_deref())
    }
}
