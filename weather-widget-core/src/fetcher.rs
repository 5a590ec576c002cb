use chrono::SecondsFormat;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    condition::{Condition, CurrentConditions},
    model::{Coordinates, WeatherSnapshot},
    presenter::Presenter,
    provider::{FetchError, WeatherProvider},
    storage::SnapshotStore,
};

/// Runs one provider call and applies the outcome to store and surfaces.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
    store: SnapshotStore,
    presenter: Presenter,
    clock: Arc<dyn Clock>,
}

impl WeatherFetcher {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: SnapshotStore,
        presenter: Presenter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { provider, store, presenter, clock }
    }

    /// Fetches conditions at `coords`, then stores and renders them.
    ///
    /// Both outcomes leave the surfaces final and the trigger idle; the
    /// returned value only tells the caller which one happened.
    pub async fn fetch_and_apply(
        &self,
        coords: Coordinates,
        note: Option<&str>,
    ) -> Result<WeatherSnapshot, FetchError> {
        match self.provider.current(&coords).await {
            Ok(current) => {
                let snapshot = self.snapshot(&current, coords, note);
                info!(provider = %self.provider.id(), summary = %snapshot.summary, "Weather updated");

                // Persistence is best-effort; the render below still happens.
                if let Err(error) = self.store.write(&snapshot) {
                    warn!(%error, "Snapshot not persisted");
                }
                self.presenter.render(Some(&snapshot));
                self.presenter.set_busy(false);
                Ok(snapshot)
            }
            Err(error) => {
                warn!(provider = %self.provider.id(), %error, "Weather fetch failed");

                self.presenter.show_status(&self.presenter.labels().fetch_failed);
                self.presenter.clear_updated();
                self.presenter.set_busy(false);
                Err(error)
            }
        }
    }

    fn snapshot(
        &self,
        current: &CurrentConditions,
        coords: Coordinates,
        note: Option<&str>,
    ) -> WeatherSnapshot {
        let (condition, code) = match &current.condition {
            Condition::Text(text) => (Some(text.clone()), None),
            Condition::Code(code) => (None, Some(*code)),
        };

        WeatherSnapshot {
            summary: current.summary(),
            temperature: Some(current.temperature),
            humidity: current.humidity,
            condition,
            code,
            updated_at: Some(self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            latitude: Some(coords.latitude),
            longitude: Some(coords.longitude),
            note: note.unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        config::Labels,
        presenter::{TextCell, TextSurface, TriggerButton, TriggerControl, TriggerState},
        provider::ProviderId,
        storage::MemoryStorage,
    };
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct ScriptedProvider {
        reply: Mutex<Option<Result<CurrentConditions, FetchError>>>,
        calls: Mutex<Vec<Coordinates>>,
    }

    impl ScriptedProvider {
        fn new(reply: Result<CurrentConditions, FetchError>) -> Arc<Self> {
            Arc::new(Self { reply: Mutex::new(Some(reply)), calls: Mutex::default() })
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenMeteo
        }

        async fn current(&self, coords: &Coordinates) -> Result<CurrentConditions, FetchError> {
            self.calls.lock().push(*coords);
            self.reply.lock().take().unwrap_or_else(|| Err(FetchError::Malformed("drained".into())))
        }
    }

    struct Harness {
        provider: Arc<ScriptedProvider>,
        store: SnapshotStore,
        trigger: Arc<TriggerButton>,
        status: Arc<TextCell>,
        updated: Arc<TextCell>,
        fetcher: WeatherFetcher,
    }

    fn harness(reply: Result<CurrentConditions, FetchError>) -> Harness {
        let provider = ScriptedProvider::new(reply);
        let store = SnapshotStore::new(Some(Arc::new(MemoryStorage::new())));
        let trigger = Arc::new(TriggerButton::new());
        let status = Arc::new(TextCell::new());
        let updated = Arc::new(TextCell::new());
        let presenter = Presenter::new(
            trigger.clone(),
            status.clone(),
            Some(updated.clone()),
            Labels::default(),
            FixedOffset::east_opt(0).unwrap(),
        );
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 6, 9, 7, 0).unwrap()));
        let fetcher = WeatherFetcher::new(provider.clone(), store.clone(), presenter, clock);
        Harness { provider, store, trigger, status, updated, fetcher }
    }

    fn cloudy() -> CurrentConditions {
        CurrentConditions { temperature: 21.4, humidity: None, condition: Condition::Code(3) }
    }

    #[tokio::test]
    async fn success_stores_and_renders_snapshot() {
        let h = harness(Ok(cloudy()));
        h.trigger.set_busy(true);
        let coords = Coordinates::new(40.4168, -3.7038);

        let snapshot = h.fetcher.fetch_and_apply(coords, None).await.expect("fetch");

        assert_eq!(snapshot.summary, "21C - Nublado");
        assert_eq!(snapshot.code, Some(3));
        assert_eq!(snapshot.condition, None);
        assert_eq!(snapshot.updated_at.as_deref(), Some("2026-01-06T09:07:00.000Z"));
        assert_eq!(snapshot.note, "");
        assert_eq!(h.store.read(), Some(snapshot));
        assert_eq!(h.status.text(), "21C - Nublado");
        assert_eq!(h.updated.text(), "Actualizado 09:07");
        assert_eq!(h.trigger.state(), TriggerState::default());
        assert_eq!(*h.provider.calls.lock(), vec![coords]);
    }

    #[tokio::test]
    async fn fallback_note_is_kept_and_rendered() {
        let h = harness(Ok(CurrentConditions {
            temperature: 18.6,
            humidity: Some(63.0),
            condition: Condition::Text("Soleado".into()),
        }));

        let snapshot = h
            .fetcher
            .fetch_and_apply(Coordinates::new(1.0, 2.0), Some("ultima ubicacion"))
            .await
            .expect("fetch");

        assert_eq!(snapshot.condition.as_deref(), Some("Soleado"));
        assert_eq!(snapshot.note, "ultima ubicacion");
        assert_eq!(h.status.text(), "19C - 63% HR - Soleado");
        assert_eq!(h.updated.text(), "Actualizado 09:07 (ultima ubicacion)");
    }

    #[tokio::test]
    async fn failure_shows_generic_message_and_clears_busy() {
        let h = harness(Err(FetchError::Status { status: 500, body: "boom".into() }));
        h.trigger.set_busy(true);
        h.updated.set_text("Actualizado 08:00");

        let err = h.fetcher.fetch_and_apply(Coordinates::new(1.0, 2.0), None).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(h.status.text(), "No se pudo obtener clima");
        assert_eq!(h.updated.text(), "");
        assert_eq!(h.trigger.state(), TriggerState::default());
        assert!(h.store.read().is_none());
    }

    #[tokio::test]
    async fn storage_failure_still_renders() {
        let provider = ScriptedProvider::new(Ok(cloudy()));
        let store = SnapshotStore::new(None);
        let status = Arc::new(TextCell::new());
        let presenter = Presenter::new(
            Arc::new(TriggerButton::new()),
            status.clone(),
            None,
            Labels::default(),
            FixedOffset::east_opt(0).unwrap(),
        );
        let fetcher = WeatherFetcher::new(
            provider,
            store.clone(),
            presenter,
            Arc::new(FixedClock(Utc::now())),
        );

        let result = fetcher.fetch_and_apply(Coordinates::new(1.0, 2.0), None).await;

        assert!(result.is_ok());
        assert_eq!(status.text(), "21C - Nublado");
        assert!(store.read().is_none());
    }
}
