//! The assembled widget: store, presenter, resolver and fetcher wired together.

use chrono::FixedOffset;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, Labels},
    fetcher::WeatherFetcher,
    geolocation::{Geolocator, LocationError, PositionOptions},
    model::WeatherSnapshot,
    presenter::{Presenter, TextSurface, TriggerControl},
    provider::{FetchError, WeatherProvider},
    resolver::LocationResolver,
    storage::{SessionStorage, SnapshotStore},
};

/// Host surfaces. Trigger and status are required for the widget to mount.
#[derive(Debug, Default, Clone)]
pub struct Surfaces {
    pub trigger: Option<Arc<dyn TriggerControl>>,
    pub status: Option<Arc<dyn TextSurface>>,
    pub updated: Option<Arc<dyn TextSurface>>,
}

/// Platform capabilities and settings injected at mount time.
#[derive(Debug, Clone)]
pub struct WidgetDeps {
    pub provider: Arc<dyn WeatherProvider>,
    pub storage: Option<Arc<dyn SessionStorage>>,
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub clock: Arc<dyn Clock>,
    pub labels: Labels,
    pub position_options: PositionOptions,
    pub display_offset: FixedOffset,
}

impl WidgetDeps {
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn WeatherProvider>,
        storage: Option<Arc<dyn SessionStorage>>,
        geolocator: Option<Arc<dyn Geolocator>>,
    ) -> Self {
        Self {
            provider,
            storage,
            geolocator,
            clock: Arc::new(SystemClock),
            labels: config.labels.clone(),
            position_options: config.geolocation.position_options(),
            display_offset: config.display.offset(),
        }
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Updated(WeatherSnapshot),
    FetchFailed(FetchError),
    LocationFailed(LocationError),
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }
}

#[derive(Debug, Clone)]
pub struct WeatherWidget {
    store: SnapshotStore,
    presenter: Presenter,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
}

impl WeatherWidget {
    /// Builds the widget and renders whatever the session already holds.
    ///
    /// Returns `None` and does nothing if the trigger or status surface is missing.
    pub fn mount(surfaces: Surfaces, deps: WidgetDeps) -> Option<Self> {
        let (Some(trigger), Some(status)) = (surfaces.trigger, surfaces.status) else {
            warn!("Weather widget not mounted: trigger or status surface missing");
            return None;
        };

        let store = SnapshotStore::new(deps.storage);
        let presenter =
            Presenter::new(trigger, status, surfaces.updated, deps.labels, deps.display_offset);
        let resolver = LocationResolver::new(
            deps.geolocator,
            store.clone(),
            deps.position_options,
            presenter.labels().last_known_note.clone(),
        );
        let fetcher =
            WeatherFetcher::new(deps.provider, store.clone(), presenter.clone(), deps.clock);

        let widget = Self { store, presenter, resolver, fetcher };
        widget.presenter.render(widget.store.read().as_ref());
        debug!("Weather widget mounted");
        Some(widget)
    }

    /// Trigger activation: locate, fetch, store, render.
    ///
    /// Never fails; every error ends as status text with the trigger idle.
    /// Overlapping calls are not serialized, the last one to finish wins.
    pub async fn refresh(&self) -> RefreshOutcome {
        let labels = self.presenter.labels();

        self.presenter.set_busy(true);
        self.presenter.show_status(&labels.updating);
        self.presenter.clear_updated();

        let location = match self.resolver.resolve().await {
            Ok(location) => location,
            Err(error) => {
                self.presenter.show_status(labels.location_message(&error));
                self.presenter.clear_updated();
                self.presenter.set_busy(false);
                return RefreshOutcome::LocationFailed(error);
            }
        };

        if location.is_fallback() {
            self.presenter.show_status(&labels.using_last_location);
        }

        match self.fetcher.fetch_and_apply(location.coordinates, location.note.as_deref()).await {
            Ok(snapshot) => RefreshOutcome::Updated(snapshot),
            Err(error) => RefreshOutcome::FetchFailed(error),
        }
    }

    /// Snapshot currently held in session storage.
    pub fn stored(&self) -> Option<WeatherSnapshot> {
        self.store.read()
    }
}
