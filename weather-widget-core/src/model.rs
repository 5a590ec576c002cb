use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A geographic fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Coordinates picked by the location resolver.
///
/// `note` is only set when the coordinates came from the stored snapshot
/// instead of a live fix.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub note: Option<String>,
}

impl ResolvedLocation {
    pub fn live(coordinates: Coordinates) -> Self {
        Self { coordinates, note: None }
    }

    pub fn fallback(coordinates: Coordinates, note: impl Into<String>) -> Self {
        Self { coordinates, note: Some(note.into()) }
    }

    pub fn is_fallback(&self) -> bool {
        self.note.is_some()
    }
}

/// Last known weather observation, as kept in session storage.
///
/// Every field is lenient on the way in: whatever another writer left in the
/// slot is still readable, and the presenter decides what is usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub temperature: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// Free-text label, set by providers that describe conditions in words.
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Provider weather code, set by providers that report numeric codes.
    #[serde(default, deserialize_with = "lenient::code", skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,

    /// ISO-8601 capture time, kept as text so invalid values survive a round trip.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub updated_at: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub note: String,
}

impl WeatherSnapshot {
    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty()
    }

    /// Capture time seen from `offset`, if `updated_at` parses.
    ///
    /// Text without an offset is taken as wall-clock time in `offset`.
    pub fn updated_instant(&self, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        let raw = self.updated_at.as_deref()?.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Some(instant.with_timezone(offset));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| offset.from_local_datetime(&naive).single())
    }

    /// Coordinates usable for a fallback fetch: both present and finite.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coords = Coordinates::new(self.latitude?, self.longitude?);
        coords.is_finite().then_some(coords)
    }
}

/// Field decoders that turn type mismatches into defaults instead of errors.
mod lenient {
    use super::*;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Numbers, or strings holding a number.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn code<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(number(d)?
            .filter(|c| c.fract() == 0.0 && *c >= f64::from(i32::MIN) && *c <= f64::from(i32::MAX))
            .map(|c| c as i32))
    }
}
