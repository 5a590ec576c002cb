//! Condition labels and the one-line summary built from them.

/// Label used for weather codes outside the known table.
pub const GENERIC_LABEL: &str = "Variable";

/// How a provider describes the current conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Provider-supplied free text, used as-is.
    Text(String),
    /// WMO weather code, mapped through [`wmo_label`].
    Code(i32),
}

impl Condition {
    pub fn label(&self) -> &str {
        match self {
            Condition::Text(text) => text.trim(),
            Condition::Code(code) => wmo_label(*code),
        }
    }
}

/// Normalized current observation, independent of the provider shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub condition: Condition,
}

impl CurrentConditions {
    pub fn summary(&self) -> String {
        build_summary(self.temperature, self.humidity, self.condition.label())
    }
}

/// Spanish label for a WMO weather interpretation code.
/// See: https://open-meteo.com/en/docs#weathervariables
pub fn wmo_label(code: i32) -> &'static str {
    match code {
        0 => "Despejado",
        1 | 2 => "Mayormente despejado",
        3 => "Nublado",
        45 | 48 => "Niebla",
        51..=57 => "Llovizna",
        61..=67 => "Lluvia",
        71..=77 => "Nieve",
        80..=82 => "Chubascos",
        85 | 86 => "Nieve ligera",
        95 => "Tormenta",
        96 | 99 => "Tormenta con granizo",
        _ => GENERIC_LABEL,
    }
}

/// Nearest integer, halves rounded towards positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `"<temp>C"`, then `" - <hum>% HR"` and `" - <label>"` when available.
pub fn build_summary(temperature: f64, humidity: Option<f64>, label: &str) -> String {
    let mut parts = vec![format!("{}C", round_half_up(temperature))];

    if let Some(humidity) = humidity.filter(|h| h.is_finite()) {
        parts.push(format!("{}% HR", round_half_up(humidity)));
    }

    if !label.is_empty() {
        parts.push(label.to_string());
    }

    parts.join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_known_entries() {
        assert_eq!(wmo_label(0), "Despejado");
        assert_eq!(wmo_label(1), "Mayormente despejado");
        assert_eq!(wmo_label(2), "Mayormente despejado");
        assert_eq!(wmo_label(3), "Nublado");
        assert_eq!(wmo_label(48), "Niebla");
        assert_eq!(wmo_label(55), "Llovizna");
        assert_eq!(wmo_label(86), "Nieve ligera");
        assert_eq!(wmo_label(95), "Tormenta");
        assert_eq!(wmo_label(99), "Tormenta con granizo");
    }

    #[test]
    fn code_table_rain_range() {
        for code in 61..=67 {
            assert_eq!(wmo_label(code), "Lluvia", "code {code}");
        }
    }

    #[test]
    fn code_table_unknown_is_generic() {
        assert_eq!(wmo_label(120), GENERIC_LABEL);
        assert_eq!(wmo_label(-1), GENERIC_LABEL);
        assert_eq!(wmo_label(4), GENERIC_LABEL);
    }

    #[test]
    fn text_condition_passes_through() {
        assert_eq!(Condition::Text("Parcialmente nublado".into()).label(), "Parcialmente nublado");
        assert_eq!(Condition::Text("  ".into()).label(), "");
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_half_up(21.4), 21);
        assert_eq!(round_half_up(21.5), 22);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-0.4), 0);
    }

    #[test]
    fn summary_with_and_without_label() {
        assert_eq!(build_summary(21.4, None, "Nublado"), "21C - Nublado");
        assert_eq!(build_summary(21.4, None, ""), "21C");
        assert_eq!(build_summary(18.6, Some(63.2), "Soleado"), "19C - 63% HR - Soleado");
    }

    #[test]
    fn conditions_summary_uses_code_table() {
        let current =
            CurrentConditions { temperature: 21.4, humidity: None, condition: Condition::Code(3) };
        assert_eq!(current.summary(), "21C - Nublado");

        let unknown =
            CurrentConditions { temperature: 9.9, humidity: None, condition: Condition::Code(120) };
        assert_eq!(unknown.summary(), "10C - Variable");
    }
}
