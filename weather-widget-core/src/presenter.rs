//! Projection of a snapshot onto the widget's surfaces.

use chrono::{FixedOffset, Timelike};
use parking_lot::Mutex;
use std::{fmt::Debug, sync::Arc};

use crate::{config::Labels, model::WeatherSnapshot};

/// A region of text the widget writes into.
pub trait TextSurface: Send + Sync + Debug {
    fn set_text(&self, text: &str);
}

/// The control that starts a refresh.
pub trait TriggerControl: Send + Sync + Debug {
    /// Busy means disabled, shown as loading and flagged busy for assistive tech.
    fn set_busy(&self, busy: bool);
}

#[derive(Debug, Default)]
pub struct TextCell {
    text: Mutex<String>,
}

impl TextCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().clone()
    }
}

impl TextSurface for TextCell {
    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    pub enabled: bool,
    pub loading: bool,
    pub aria_busy: bool,
}

impl Default for TriggerState {
    fn default() -> Self {
        Self { enabled: true, loading: false, aria_busy: false }
    }
}

#[derive(Debug, Default)]
pub struct TriggerButton {
    state: Mutex<TriggerState>,
}

impl TriggerButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TriggerState {
        *self.state.lock()
    }
}

impl TriggerControl for TriggerButton {
    fn set_busy(&self, busy: bool) {
        *self.state.lock() = TriggerState { enabled: !busy, loading: busy, aria_busy: busy };
    }
}

/// Writes status, updated time and busy state. Never touches storage or network.
#[derive(Debug, Clone)]
pub struct Presenter {
    trigger: Arc<dyn TriggerControl>,
    status: Arc<dyn TextSurface>,
    updated: Option<Arc<dyn TextSurface>>,
    labels: Labels,
    offset: FixedOffset,
}

impl Presenter {
    pub fn new(
        trigger: Arc<dyn TriggerControl>,
        status: Arc<dyn TextSurface>,
        updated: Option<Arc<dyn TextSurface>>,
        labels: Labels,
        offset: FixedOffset,
    ) -> Self {
        Self { trigger, status, updated, labels, offset }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn render(&self, snapshot: Option<&WeatherSnapshot>) {
        let Some(snapshot) = snapshot.filter(|s| s.has_summary()) else {
            self.show_status(&self.labels.no_data);
            self.clear_updated();
            return;
        };

        self.show_status(&snapshot.summary);
        match self.updated_line(snapshot) {
            Some(line) => self.set_updated(&line),
            None => self.clear_updated(),
        }
    }

    pub fn set_busy(&self, busy: bool) {
        self.trigger.set_busy(busy);
    }

    pub fn show_status(&self, text: &str) {
        self.status.set_text(text);
    }

    pub fn clear_updated(&self) {
        self.set_updated("");
    }

    fn set_updated(&self, text: &str) {
        if let Some(updated) = &self.updated {
            updated.set_text(text);
        }
    }

    /// `"<updated> HH:MM"` plus `" (note)"`, or `None` if the time is unusable.
    fn updated_line(&self, snapshot: &WeatherSnapshot) -> Option<String> {
        let local = snapshot.updated_instant(&self.offset)?;
        let mut line =
            format!("{} {:02}:{:02}", self.labels.updated, local.hour(), local.minute());
        if !snapshot.note.is_empty() {
            line.push_str(&format!(" ({})", snapshot.note));
        }
        Some(line)
    }
}
