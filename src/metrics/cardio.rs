use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::config::GoalTargets;
use crate::entry::{dated, HealthMetricEntry, LogEntry};
use crate::metrics::formula::{self, mean};
use crate::metrics::types::{CardioMetrics, CardioSource};
use crate::metrics::{progress_percentage, scaled_target, WEEK_DAYS};

pub const DEFAULT_DURATION_MINUTES: f64 = 30.0;
pub const DEFAULT_HEART_RATE: f64 = 130.0;
pub const LOAD_WINDOW_DAYS: i64 = 7;

// Health measurement fields.
pub const DURATION_FIELD: &str = "duration_minutes";
pub const HEART_RATE_FIELD: &str = "heart_rate";
pub const CAPACITY_FIELD: &str = "vo2_max";

// Log entry fields.
pub const LOG_FLAG: &str = "cardio";
pub const LOG_DURATION_FIELD: &str = "cardio_minutes";
pub const LOG_HEART_RATE_FIELD: &str = "cardio_hr";

/// One cardio workout, from either source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardioSession {
    pub date: DateTime<Utc>,
    pub duration_minutes: Option<f64>,
    pub heart_rate: Option<f64>,
}

impl CardioSession {
    pub fn load(&self) -> f64 {
        training_load(self.duration_minutes, self.heart_rate)
    }
}

/// Synthetic effort score: `minutes * bpm / 100`, defaulting absent inputs
/// to 30 minutes and 130 bpm.
pub fn training_load(duration_minutes: Option<f64>, heart_rate: Option<f64>) -> f64 {
    duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES) * heart_rate.unwrap_or(DEFAULT_HEART_RATE)
        / 100.0
}

/// Measurements that describe a workout (have a duration or heart rate).
pub fn sessions_from_health(metrics: &[HealthMetricEntry]) -> Vec<CardioSession> {
    dated(metrics)
        .into_iter()
        .filter_map(|(date, m)| {
            let duration_minutes = m.value(DURATION_FIELD);
            let heart_rate = m.value(HEART_RATE_FIELD);
            if duration_minutes.is_none() && heart_rate.is_none() {
                return None;
            }
            Some(CardioSession {
                date,
                duration_minutes,
                heart_rate,
            })
        })
        .collect()
}

/// Log entries with the cardio flag set.
pub fn sessions_from_log(entries: &[LogEntry]) -> Vec<CardioSession> {
    dated(entries)
        .into_iter()
        .filter(|(_, e)| e.get(LOG_FLAG).is_yes())
        .map(|(date, e)| CardioSession {
            date,
            duration_minutes: e.get(LOG_DURATION_FIELD).as_number(),
            heart_rate: e.get(LOG_HEART_RATE_FIELD).as_number(),
        })
        .collect()
}

/// Most recent fitness-capacity reading.
pub fn latest_capacity(metrics: &[HealthMetricEntry]) -> Option<f64> {
    dated(metrics)
        .into_iter()
        .filter_map(|(date, m)| m.value(CAPACITY_FIELD).map(|v| (date, v)))
        .max_by_key(|(date, _)| *date)
        .map(|(_, v)| v)
}

/// Cardio metrics for an already windowed period.
///
/// With `prefer_health_metrics`, workouts found in `health_metrics` are used
/// and the log is ignored; the log is the fallback when there are none.
pub fn compute_cardio_metrics(
    entries: &[LogEntry],
    health_metrics: &[HealthMetricEntry],
    prefer_health_metrics: bool,
    days_in_period: u32,
    targets: &GoalTargets,
    now: DateTime<Utc>,
) -> CardioMetrics {
    let health_sessions = if prefer_health_metrics {
        sessions_from_health(health_metrics)
    } else {
        Vec::new()
    };

    let (source, sessions) = if !health_sessions.is_empty() {
        (CardioSource::HealthMetrics, health_sessions)
    } else {
        if prefer_health_metrics && !health_metrics.is_empty() {
            log::debug!("No workouts among health metrics, falling back to log entries");
        }
        let log_sessions = sessions_from_log(entries);
        if log_sessions.is_empty() {
            (CardioSource::None, log_sessions)
        } else {
            (CardioSource::LogEntries, log_sessions)
        }
    };

    let days_count = sessions
        .iter()
        .map(|s| s.date.date_naive())
        .collect::<BTreeSet<_>>()
        .len() as u64;

    let rate = match source {
        CardioSource::LogEntries => formula::compute(LOG_FLAG, entries),
        CardioSource::HealthMetrics => {
            (days_count as f64 / days_in_period.max(1) as f64 * 100.0).min(100.0)
        }
        CardioSource::None => 0.0,
    };

    let load_start = now - Duration::days(LOAD_WINDOW_DAYS);
    let weekly_load: f64 = sessions
        .iter()
        .filter(|s| s.date >= load_start)
        .map(CardioSession::load)
        .sum();

    let heart_rates: Vec<f64> = sessions.iter().filter_map(|s| s.heart_rate).collect();
    let target = scaled_target(targets.cardio_days_per_week, days_in_period, WEEK_DAYS);

    CardioMetrics {
        source,
        sessions: sessions.len() as u64,
        days_count,
        rate,
        target,
        progress: progress_percentage(days_count as f64, target),
        weekly_load,
        weekly_load_target: targets.weekly_cardio_load_target,
        weekly_load_progress: progress_percentage(weekly_load, targets.weekly_cardio_load_target),
        average_heart_rate: mean(&heart_rates),
        latest_capacity: latest_capacity(health_metrics),
    }
}
