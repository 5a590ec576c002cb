//! Core library for the weather status widget.
//!
//! This crate defines:
//! - The widget itself: snapshot store, presenter, location resolver and fetcher
//! - Ports for every host capability (storage, geolocation, surfaces, clock)
//! - Weather providers behind a common trait
//! - Configuration handling
//!
//! It is used by `weather-widget-cli`, but any host that can implement the ports can mount it.

pub mod clock;
pub mod condition;
pub mod config;
pub mod fetcher;
pub mod geolocation;
pub mod model;
pub mod presenter;
pub mod provider;
pub mod resolver;
pub mod storage;
pub mod widget;

pub use clock::{Clock, FixedClock, SystemClock};
pub use condition::{Condition, CurrentConditions};
pub use config::{Config, GeolocationSource, Labels, ProviderConfig};
pub use geolocation::{DeniedGeolocator, FixedGeolocator, Geolocator, LocationError, PositionOptions};
pub use model::{Coordinates, ResolvedLocation, WeatherSnapshot};
pub use presenter::{Presenter, TextCell, TextSurface, TriggerButton, TriggerControl, TriggerState};
pub use provider::{FetchError, ProviderId, WeatherProvider};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, SnapshotStore, StorageError};
pub use widget::{RefreshOutcome, Surfaces, WeatherWidget, WidgetDeps};
