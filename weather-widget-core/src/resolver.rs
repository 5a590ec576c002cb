use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    geolocation::{Geolocator, LocationError, PositionOptions},
    model::ResolvedLocation,
    storage::SnapshotStore,
};

/// Picks the coordinates for a refresh.
///
/// A live fix wins. Every failure, including a host without geolocation,
/// goes through [`LocationResolver::fallback`] before it is reported.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    geolocator: Option<Arc<dyn Geolocator>>,
    store: SnapshotStore,
    options: PositionOptions,
    fallback_note: String,
}

impl LocationResolver {
    pub fn new(
        geolocator: Option<Arc<dyn Geolocator>>,
        store: SnapshotStore,
        options: PositionOptions,
        fallback_note: impl Into<String>,
    ) -> Self {
        Self { geolocator, store, options, fallback_note: fallback_note.into() }
    }

    pub async fn resolve(&self) -> Result<ResolvedLocation, LocationError> {
        match self.live_fix().await {
            Ok(location) => Ok(location),
            Err(error) => self.fallback(error),
        }
    }

    async fn live_fix(&self) -> Result<ResolvedLocation, LocationError> {
        let geolocator = self.geolocator.as_ref().ok_or(LocationError::Unavailable)?;

        let request = geolocator.current_position(&self.options);
        let coordinates = tokio::time::timeout(self.options.timeout, request)
            .await
            .map_err(|_| LocationError::Timeout)??;

        if !coordinates.is_finite() {
            return Err(LocationError::Other(format!("non-finite fix {coordinates}")));
        }

        debug!(%coordinates, "Live location fix");
        Ok(ResolvedLocation::live(coordinates))
    }

    /// Stored coordinates tagged with the fallback note, or `error` if there are none.
    pub fn fallback(&self, error: LocationError) -> Result<ResolvedLocation, LocationError> {
        match self.store.stored_coordinates() {
            Some(coordinates) => {
                warn!(%error, %coordinates, "Falling back to last known location");
                Ok(ResolvedLocation::fallback(coordinates, self.fallback_note.clone()))
            }
            None => {
                warn!(%error, "No live fix and no stored location");
                Err(error)
            }
        }
    }
}
