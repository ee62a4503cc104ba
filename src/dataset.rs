use std::path::Path;

use serde::Deserialize;

use crate::entry::{HealthMetricEntry, LogEntry};
use crate::error::{Error, Result};
use crate::goal::Goal;

/// A user's exported log, health measurements and goals.
///
/// ```json
/// {
///   "entries": [{"date": "2024-05-01", "meditation": "Yes", "mood": 7}],
///   "healthMetrics": [{"date": "2024-05-01", "vo2_max": 42.5}],
///   "goals": [{"key": "strength_total", "targetValue": 400,
///              "targetDate": "2024-09-01", "createdAt": "2024-03-01"}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dataset {
    pub entries: Vec<LogEntry>,
    pub health_metrics: Vec<HealthMetricEntry>,
    pub goals: Vec<Goal>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("dataset {}", path.display())));
        }
        let raw = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&raw)?;
        log::info!(
            "Loaded {} entries, {} health metrics, {} goals from {}",
            dataset.entries.len(),
            dataset.health_metrics.len(),
            dataset.goals.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Dated;
    use crate::goal::TargetDate;

    const SAMPLE: &str = r#"{
        "entries": [
            {"date": "2024-05-01", "meditation": "yes", "mood": 7, "journal": "long day"},
            {"date": {"seconds": 1714608000, "nanoseconds": 0}, "meditation": false},
            {"meditation": "Yes"}
        ],
        "healthMetrics": [
            {"date": "2024-05-01T07:00:00Z", "vo2_max": 42.5, "heart_rate": "58", "note": "watch"}
        ],
        "goals": [
            {"category": "health", "key": "strength_total", "targetValue": 400,
             "targetDate": "2024-09-01", "createdAt": "2024-03-01"},
            {"key": "meditation", "targetValue": 20, "targetDate": "rolling",
             "createdAt": "2024-03-01", "currentValue": 12}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let ds = Dataset::from_json_str(SAMPLE).unwrap();
        assert_eq!(ds.entries.len(), 3);
        assert!(ds.entries[0].get("meditation").is_yes());
        assert_eq!(ds.entries[0].get("mood").as_number(), Some(7.0));
        assert!(ds.entries[1].instant().is_some());
        assert!(ds.entries[2].instant().is_none());

        let hm = &ds.health_metrics[0];
        assert_eq!(hm.value("vo2_max"), Some(42.5));
        assert_eq!(hm.value("heart_rate"), Some(58.0));
        assert_eq!(hm.value("note"), None);

        assert_eq!(ds.goals.len(), 2);
        assert!(!ds.goals[0].is_rolling());
        assert_eq!(ds.goals[1].target_date, TargetDate::Rolling);
        assert_eq!(ds.goals[1].current_value, 12.0);
    }

    #[test]
    fn test_missing_sections_default() {
        let ds = Dataset::from_json_str(r#"{"entries": []}"#).unwrap();
        assert_eq!(ds, Dataset::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let ds = Dataset::load(&path).unwrap();
        assert_eq!(ds.goals[0].key, "strength_total");

        assert!(matches!(
            Dataset::load(dir.path().join("absent.json")),
            Err(Error::NotFound(_))
        ));
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Dataset::load(&path), Err(Error::Json(_))));
    }
}
