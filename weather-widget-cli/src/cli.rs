use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::Password;
use std::sync::Arc;
use tracing::{debug, warn};
use weather_widget_core::{
    Config, Coordinates, DeniedGeolocator, FileStorage, FixedGeolocator, Geolocator,
    GeolocationSource, Presenter, ProviderId, RefreshOutcome, SessionStorage, SnapshotStore,
    Surfaces, TextCell, TriggerButton, WeatherWidget, WidgetDeps,
    provider::{default_provider_from_config, provider_from_config},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Session-cached weather status line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a provider and make it the default.
    Configure {
        /// Provider short name, e.g. "open-meteo" or "weatherapi".
        provider: String,
    },

    /// Print the widget as it renders from the stored snapshot.
    Show,

    /// Activate the refresh trigger and print the result.
    Refresh {
        /// Latitude of the current fix; overrides the configured geolocation.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the current fix.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// Behave as a host without any geolocation capability.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_geolocation: bool,
    },
}

/// In-memory stand-ins for the page elements the widget writes to.
#[derive(Debug, Default)]
struct Page {
    trigger: Arc<TriggerButton>,
    status: Arc<TextCell>,
    updated: Arc<TextCell>,
}

impl Page {
    fn surfaces(&self) -> Surfaces {
        Surfaces {
            trigger: Some(self.trigger.clone()),
            status: Some(self.status.clone()),
            updated: Some(self.updated.clone()),
        }
    }

    fn print(&self) {
        let trigger = self.trigger.state();
        println!("status:  {}", self.status.text());
        println!("updated: {}", self.updated.text());
        println!("trigger: {}", if trigger.enabled { "enabled" } else { "busy" });
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { provider } => configure(&mut config, &provider),
            Command::Show => {
                let page = Page::default();
                show(&config, &page);
                page.print();
                Ok(())
            }
            Command::Refresh { lat, lon, provider, no_geolocation } => {
                let geolocator = if no_geolocation {
                    None
                } else {
                    match (lat, lon) {
                        (Some(lat), Some(lon)) => {
                            let fix: Arc<dyn Geolocator> =
                                Arc::new(FixedGeolocator::new(Coordinates::new(lat, lon)));
                            Some(fix)
                        }
                        _ => configured_geolocator(&config),
                    }
                };

                let page = Page::default();
                let widget = mount(&config, &page, provider.as_deref(), geolocator)?;
                let outcome = widget.refresh().await;
                page.print();

                match outcome {
                    RefreshOutcome::Updated(_) => Ok(()),
                    RefreshOutcome::FetchFailed(e) => Err(anyhow!(e).context("Refresh failed")),
                    RefreshOutcome::LocationFailed(e) => Err(anyhow!(e).context("Refresh failed")),
                }
            }
        }
    }
}

fn configure(config: &mut Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    }
    config.set_default_provider(id);
    config.save()?;

    println!("Default provider set to {id} ({})", Config::config_file_path()?.display());
    Ok(())
}

fn configured_geolocator(config: &Config) -> Option<Arc<dyn Geolocator>> {
    let geolocator: Arc<dyn Geolocator> = match config.geolocation.source {
        GeolocationSource::None => return None,
        GeolocationSource::Denied => Arc::new(DeniedGeolocator),
        GeolocationSource::Fixed => {
            let Some(coords) = config.geolocation.fixed_coordinates() else {
                warn!("geolocation.source = \"fixed\" but latitude/longitude are missing");
                return None;
            };
            Arc::new(FixedGeolocator::new(coords))
        }
    };
    Some(geolocator)
}

fn session_storage(config: &Config) -> Arc<dyn SessionStorage> {
    let session_file = config.storage.session_file();
    debug!(path = %session_file.display(), "Opening session storage");
    Arc::new(FileStorage::new(session_file))
}

/// Renders the stored snapshot. Needs no provider, since nothing is fetched.
fn show(config: &Config, page: &Page) {
    let store = SnapshotStore::new(Some(session_storage(config)));
    let presenter = Presenter::new(
        page.trigger.clone(),
        page.status.clone(),
        Some(page.updated.clone()),
        config.labels.clone(),
        config.display.offset(),
    );
    presenter.render(store.read().as_ref());
}

fn mount(
    config: &Config,
    page: &Page,
    provider: Option<&str>,
    geolocator: Option<Arc<dyn Geolocator>>,
) -> anyhow::Result<WeatherWidget> {
    let provider = match provider {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config)?,
        None => default_provider_from_config(config)?,
    };
    debug!(provider = %provider.id(), "Mounting weather widget");
    let storage = session_storage(config);

    let deps = WidgetDeps::from_config(config, provider, Some(storage), geolocator);
    WeatherWidget::mount(page.surfaces(), deps).ok_or_else(|| anyhow!("Widget surfaces missing"))
}
