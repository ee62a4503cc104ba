use serde::Serialize;

use crate::window::TimeWindow;

/// How often a flag was set, against a target scaled to the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateMetric {
    /// Percentage of logged days with the flag set.
    pub rate: f64,
    pub days_count: u64,
    /// Goal frequency scaled to the period length.
    pub target: f64,
    /// `days_count / target * 100`, never negative.
    pub progress: f64,
}

/// Mean of a numeric rating over the days it was recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageMetric {
    pub average: f64,
    /// Days the rating was present.
    pub samples: u64,
    pub target: f64,
    pub progress: f64,
}

/// Strength sessions plus the most recent session's rep total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrengthMetric {
    pub rate: f64,
    pub days_count: u64,
    pub latest_total: f64,
    pub target: f64,
    pub progress: f64,
}

/// Where cardio numbers came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioSource {
    HealthMetrics,
    LogEntries,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardioMetrics {
    pub source: CardioSource,
    pub sessions: u64,
    /// Distinct calendar days with at least one session.
    pub days_count: u64,
    pub rate: f64,
    pub target: f64,
    pub progress: f64,
    /// Training load summed over the trailing 7 days.
    pub weekly_load: f64,
    pub weekly_load_target: f64,
    pub weekly_load_progress: f64,
    pub average_heart_rate: Option<f64>,
    /// Most recent fitness-capacity reading in the period.
    pub latest_capacity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialMetrics {
    pub family: RateMetric,
    pub friends: RateMetric,
    pub events: RateMetric,
    pub new_contacts: RateMetric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WellbeingMetrics {
    pub meditation: RateMetric,
    pub gratitude: RateMetric,
    pub journal: RateMetric,
    pub mood: AverageMetric,
    pub energy: AverageMetric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub strength: StrengthMetric,
    pub cardio: CardioMetrics,
    pub sleep: AverageMetric,
    pub alcohol_free: RateMetric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductivityMetrics {
    pub deep_work: RateMetric,
    pub reading: RateMetric,
    pub learning: RateMetric,
}

/// Every dashboard metric for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalMetrics {
    pub window: TimeWindow,
    pub days_in_period: u32,
    /// Dated log entries inside the window.
    pub entries_count: u64,
    pub social: SocialMetrics,
    pub wellbeing: WellbeingMetrics,
    pub health: HealthMetrics,
    pub productivity: ProductivityMetrics,
}
