use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::date_util::parse_instant;

/// A single named value on a log entry.
///
/// Log entries carry no fixed schema, so every field is normalized into this
/// union when the entry is ingested. Formulas never see raw JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

static MISSING: FieldValue = FieldValue::Missing;

impl FieldValue {
    /// Normalize a JSON value. `"Yes"`/`"No"` and booleans become flags.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::Bool(b) => FieldValue::Flag(*b),
            Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Missing),
            Value::String(s) => FieldValue::from_text(s),
            // Arrays and objects have no meaning for any formula.
            Value::Array(_) | Value::Object(_) => FieldValue::Missing,
        }
    }

    /// Normalize free text, recognizing the canonical flag spellings.
    pub fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            FieldValue::Flag(true)
        } else if trimmed.eq_ignore_ascii_case("no") {
            FieldValue::Flag(false)
        } else {
            FieldValue::Text(s.to_string())
        }
    }

    /// Strict flag check: only an explicit "Yes".
    pub fn is_yes(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    /// Legacy-tolerant flag check: "Yes", a positive number, or any
    /// non-empty text other than "No".
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => *n > 0.0,
            FieldValue::Text(s) => {
                let s = s.trim();
                !s.is_empty() && !s.eq_ignore_ascii_case("no")
            }
            FieldValue::Missing => false,
        }
    }

    /// Numeric coercion. Text is parsed; flags and missing values are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Flag(_) | FieldValue::Missing => None,
        };
        n.filter(|v| v.is_finite())
    }

    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::from_text(s)
    }
}

/// A date as it arrived from the store, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDate {
    Instant(DateTime<Utc>),
    /// Store timestamp wrapper (`{"seconds": .., "nanoseconds": ..}`).
    Timestamp { seconds: i64, nanoseconds: u32 },
    /// Epoch milliseconds.
    Millis(i64),
    Text(String),
}

impl RawDate {
    /// Coerce to an instant. Unparseable values yield `None`.
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RawDate::Instant(dt) => Some(*dt),
            RawDate::Timestamp {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            RawDate::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            RawDate::Text(s) => parse_instant(s),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RawDate::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(RawDate::Millis),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64)?;
                let nanoseconds = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
                    .min(999_999_999) as u32;
                Some(RawDate::Timestamp {
                    seconds,
                    nanoseconds,
                })
            }
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for RawDate {
    fn from(dt: DateTime<Utc>) -> Self {
        RawDate::Instant(dt)
    }
}

/// Anything carrying an optional raw date.
pub trait Dated {
    fn raw_date(&self) -> Option<&RawDate>;

    fn instant(&self) -> Option<DateTime<Utc>> {
        self.raw_date().and_then(RawDate::to_instant)
    }
}

/// One calendar day's record of flags, counts and free text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogEntry {
    pub date: Option<RawDate>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(RawDate::Instant(date)),
            fields: BTreeMap::new(),
        }
    }

    /// An entry whose date is kept in its raw form.
    pub fn with_raw_date(date: Option<RawDate>) -> Self {
        Self {
            date,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Field lookup; absent fields read as `Missing`.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    /// Build from an exported JSON object. The `date` key becomes the raw
    /// date; every other key becomes a field.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            log::debug!("Ignoring non-object log entry");
            return Self::default();
        };
        let date = map.get("date").and_then(RawDate::from_json);
        let fields = map
            .iter()
            .filter(|(k, _)| k.as_str() != "date")
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .filter(|(_, v)| !v.is_missing())
            .collect();
        Self { date, fields }
    }
}

impl Dated for LogEntry {
    fn raw_date(&self) -> Option<&RawDate> {
        self.date.as_ref()
    }
}

impl<'de> Deserialize<'de> for LogEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(LogEntry::from_json(&value))
    }
}

/// A longitudinal numeric measurement (e.g. an imported workout or a
/// fitness-capacity reading). Not necessarily daily.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HealthMetricEntry {
    pub date: Option<RawDate>,
    pub values: BTreeMap<String, f64>,
}

impl HealthMetricEntry {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(RawDate::Instant(date)),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().filter(|v| v.is_finite())
    }

    /// Build from an exported JSON object. Only numeric (or numeric-text)
    /// values are kept.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            log::debug!("Ignoring non-object health metric");
            return Self::default();
        };
        let date = map.get("date").and_then(RawDate::from_json);
        let values = map
            .iter()
            .filter(|(k, _)| k.as_str() != "date")
            .filter_map(|(k, v)| FieldValue::from_json(v).as_number().map(|n| (k.clone(), n)))
            .collect();
        Self { date, values }
    }
}

impl Dated for HealthMetricEntry {
    fn raw_date(&self) -> Option<&RawDate> {
        self.date.as_ref()
    }
}

impl<'de> Deserialize<'de> for HealthMetricEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(HealthMetricEntry::from_json(&value))
    }
}

/// Records from `items` that carry a coercible date, paired with it.
pub fn dated<T: Dated>(items: &[T]) -> Vec<(DateTime<Utc>, &T)> {
    items
        .iter()
        .filter_map(|item| item.instant().map(|dt| (dt, item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_value_ingestion() {
        assert_eq!(FieldValue::from_json(&json!("Yes")), FieldValue::Flag(true));
        assert_eq!(FieldValue::from_json(&json!(" no ")), FieldValue::Flag(false));
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::Flag(true));
        assert_eq!(FieldValue::from_json(&json!(12)), FieldValue::Number(12.0));
        assert_eq!(
            FieldValue::from_json(&json!("called mom")),
            FieldValue::Text("called mom".into())
        );
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Missing);
        assert_eq!(FieldValue::from_json(&json!([1, 2])), FieldValue::Missing);
    }

    #[test]
    fn test_truthiness() {
        assert!(FieldValue::Flag(true).is_yes());
        assert!(!FieldValue::Number(3.0).is_yes());

        assert!(FieldValue::Number(2.0).is_truthy());
        assert!(!FieldValue::Number(0.0).is_truthy());
        assert!(FieldValue::Text("met Sam".into()).is_truthy());
        assert!(!FieldValue::Text("  ".into()).is_truthy());
        assert!(!FieldValue::Text("NO".into()).is_truthy());
        assert!(!FieldValue::Missing.is_truthy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(FieldValue::Number(7.5).as_number(), Some(7.5));
        assert_eq!(FieldValue::Text(" 8 ".into()).as_number(), Some(8.0));
        assert_eq!(FieldValue::Text("eight".into()).as_number(), None);
        assert_eq!(FieldValue::Text("NaN".into()).as_number(), None);
        assert_eq!(FieldValue::Flag(true).as_number(), None);
        assert_eq!(FieldValue::Missing.number_or_zero(), 0.0);
    }

    #[test]
    fn test_raw_date_coercion() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let ts = expected.timestamp();

        assert_eq!(RawDate::Text("2024-03-01".into()).to_instant(), Some(expected));
        assert_eq!(
            RawDate::Timestamp {
                seconds: ts,
                nanoseconds: 0
            }
            .to_instant(),
            Some(expected)
        );
        assert_eq!(RawDate::Millis(ts * 1000).to_instant(), Some(expected));
        assert_eq!(RawDate::Text("not a date".into()).to_instant(), None);
    }

    #[test]
    fn test_log_entry_from_json() {
        let entry = LogEntry::from_json(&json!({
            "date": {"seconds": 1709251200, "nanoseconds": 0},
            "meditation": "Yes",
            "mood": 7,
            "journal": "slept badly",
            "notes": null
        }));
        assert!(entry.instant().is_some());
        assert!(entry.get("meditation").is_yes());
        assert_eq!(entry.get("mood").as_number(), Some(7.0));
        assert!(entry.get("journal").is_truthy());
        assert!(entry.get("notes").is_missing());
        assert!(entry.get("nonexistent").is_missing());
        assert!(!entry.fields.contains_key("date"));
    }

    #[test]
    fn test_log_entry_without_date() {
        let entry: LogEntry = serde_json::from_value(json!({"meditation": "Yes"})).unwrap();
        assert!(entry.date.is_none());
        assert!(entry.instant().is_none());

        let entry = LogEntry::from_json(&json!({"date": "garbage"}));
        assert!(entry.date.is_some());
        assert!(entry.instant().is_none());
    }

    #[test]
    fn test_health_metric_from_json() {
        let m: HealthMetricEntry = serde_json::from_value(json!({
            "date": "2024-03-01T07:00:00Z",
            "vo2_max": 41.5,
            "heart_rate": "142",
            "source": "watch"
        }))
        .unwrap();
        assert_eq!(m.value("vo2_max"), Some(41.5));
        assert_eq!(m.value("heart_rate"), Some(142.0));
        assert_eq!(m.value("source"), None);
    }

    #[test]
    fn test_dated_drops_undated() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let entries = vec![
            LogEntry::new(now),
            LogEntry::with_raw_date(None),
            LogEntry::with_raw_date(Some(RawDate::Text("??".into()))),
        ];
        assert_eq!(dated(&entries).len(), 1);
    }
}
