use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::entry::RawDate;

/// Goal keys whose progress accumulates toward a physical challenge total.
pub const CUMULATIVE_CHALLENGE_KEYS: &[&str] = &["strength_total", "pushup_challenge"];

/// Goal keys that count discrete events.
pub const COUNTING_KEYS: &[&str] = &["new_contacts"];

/// Fraction of the target assumed as the starting point when a goal has
/// neither an explicit initial value nor any history.
pub const INFERRED_INITIAL_FRACTION: f64 = 0.9;

/// A goal's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetDate {
    Fixed(DateTime<Utc>),
    /// No deadline; tracked as a continuously recomputed percentage.
    #[default]
    Rolling,
}

impl TargetDate {
    pub fn fixed(&self) -> Option<DateTime<Utc>> {
        match self {
            TargetDate::Fixed(dt) => Some(*dt),
            TargetDate::Rolling => None,
        }
    }
}

impl Serialize for TargetDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TargetDate::Fixed(dt) => dt.serialize(serializer),
            TargetDate::Rolling => serializer.serialize_str("rolling"),
        }
    }
}

impl<'de> Deserialize<'de> for TargetDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Null => Ok(TargetDate::Rolling),
            Value::String(s)
                if s.trim().is_empty()
                    || s.eq_ignore_ascii_case("rolling")
                    || s.eq_ignore_ascii_case("none") =>
            {
                Ok(TargetDate::Rolling)
            }
            other => instant_from_json(other)
                .map(TargetDate::Fixed)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid target date: {other}"))),
        }
    }
}

fn instant_from_json(value: &Value) -> Option<DateTime<Utc>> {
    RawDate::from_json(value).and_then(|raw| raw.to_instant())
}

fn deserialize_instant<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    instant_from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {value}")))
}

/// How a goal's rate of progress is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Running total of a physical challenge (e.g. strength reps).
    CumulativeChallenge,
    /// Count of discrete events (e.g. new contacts made).
    Counting,
    Other,
}

impl GoalKind {
    pub fn from_key(key: &str) -> Self {
        if CUMULATIVE_CHALLENGE_KEYS.contains(&key) {
            GoalKind::CumulativeChallenge
        } else if COUNTING_KEYS.contains(&key) {
            GoalKind::Counting
        } else {
            GoalKind::Other
        }
    }
}

/// A user target for one tracked metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub category: String,
    pub key: String,
    pub target_value: f64,
    #[serde(default)]
    pub target_date: TargetDate,
    #[serde(deserialize_with = "deserialize_instant")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<f64>,
    #[serde(default)]
    pub current_value: f64,
}

impl Goal {
    pub fn new(
        category: &str,
        key: &str,
        target_value: f64,
        target_date: TargetDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category: category.to_string(),
            key: key.to_string(),
            target_value,
            target_date,
            created_at,
            initial_value: None,
            current_value: 0.0,
        }
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn with_current_value(mut self, value: f64) -> Self {
        self.current_value = value;
        self
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self.target_date, TargetDate::Rolling)
    }

    pub fn kind(&self) -> GoalKind {
        GoalKind::from_key(&self.key)
    }

    /// A fixed deadline must fall strictly after the goal was created.
    /// Rolling goals have no window to violate.
    pub fn has_valid_window(&self) -> bool {
        match self.target_date {
            TargetDate::Fixed(end) => end > self.created_at,
            TargetDate::Rolling => true,
        }
    }

    /// Starting value of the tracked metric: the explicit initial value,
    /// else the earliest measurement in `history`, else 90% of the target.
    pub fn resolve_initial_value(&self, history: &[(DateTime<Utc>, f64)]) -> f64 {
        if let Some(v) = self.initial_value.filter(|v| v.is_finite()) {
            return v;
        }
        history
            .iter()
            .filter(|(_, v)| v.is_finite())
            .min_by_key(|(dt, _)| *dt)
            .map(|(_, v)| *v)
            .unwrap_or(self.target_value * INFERRED_INITIAL_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_goal_kind_from_key() {
        assert_eq!(GoalKind::from_key("strength_total"), GoalKind::CumulativeChallenge);
        assert_eq!(GoalKind::from_key("pushup_challenge"), GoalKind::CumulativeChallenge);
        assert_eq!(GoalKind::from_key("new_contacts"), GoalKind::Counting);
        assert_eq!(GoalKind::from_key("vo2_max"), GoalKind::Other);
    }

    #[test]
    fn test_deserialize_goal() {
        let goal: Goal = serde_json::from_value(json!({
            "category": "health",
            "key": "strength_total",
            "targetValue": 400,
            "targetDate": "2024-06-30",
            "createdAt": {"seconds": 1704067200, "nanoseconds": 0},
            "currentValue": 120
        }))
        .unwrap();
        assert_eq!(goal.created_at, created());
        assert_eq!(
            goal.target_date,
            TargetDate::Fixed(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(goal.current_value, 120.0);
        assert!(goal.initial_value.is_none());
        assert!(goal.has_valid_window());
    }

    #[test]
    fn test_deserialize_rolling_goal() {
        for target_date in [json!("rolling"), json!(null), json!("")] {
            let goal: Goal = serde_json::from_value(json!({
                "key": "meditation",
                "targetValue": 80,
                "targetDate": target_date,
                "createdAt": "2024-01-01"
            }))
            .unwrap();
            assert!(goal.is_rolling());
        }

        let goal: Goal = serde_json::from_value(json!({
            "key": "meditation",
            "targetValue": 80,
            "createdAt": "2024-01-01"
        }))
        .unwrap();
        assert!(goal.is_rolling());
    }

    #[test]
    fn test_deserialize_rejects_bad_target_date() {
        let result: std::result::Result<Goal, _> = serde_json::from_value(json!({
            "key": "meditation",
            "targetValue": 80,
            "targetDate": "someday",
            "createdAt": "2024-01-01"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_window() {
        let goal = Goal::new("health", "vo2_max", 45.0, TargetDate::Fixed(created()), created());
        assert!(!goal.has_valid_window());

        let goal = Goal::new(
            "health",
            "vo2_max",
            45.0,
            TargetDate::Fixed(created() - Duration::days(3)),
            created(),
        );
        assert!(!goal.has_valid_window());
    }

    #[test]
    fn test_resolve_initial_value() {
        let goal = Goal::new("health", "vo2_max", 50.0, TargetDate::Rolling, created());
        assert_eq!(goal.resolve_initial_value(&[]), 45.0);

        let history = vec![
            (created() + Duration::days(10), 42.0),
            (created() + Duration::days(2), 40.0),
        ];
        assert_eq!(goal.resolve_initial_value(&history), 40.0);

        let goal = goal.with_initial_value(38.0);
        assert_eq!(goal.resolve_initial_value(&history), 38.0);
    }

    #[test]
    fn test_serialize_target_date() {
        let goal = Goal::new("social", "new_contacts", 10.0, TargetDate::Rolling, created());
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["targetDate"], json!("rolling"));
        assert_eq!(value["targetValue"], json!(10.0));
    }
}
