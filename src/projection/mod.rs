pub mod trajectory;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::date_util::days_between;
use crate::entry::{dated, HealthMetricEntry, LogEntry};
use crate::goal::{Goal, GoalKind, TargetDate};
use crate::metrics::formula::{self, STRENGTH_PARTS};
use crate::metrics::progress_percentage;

/// Largest remaining daily rate still considered on track.
pub const ON_TRACK_RATE_TOLERANCE: f64 = 0.1;

/// Where a goal is heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub is_rolling: bool,
    pub current_value: f64,
    pub target_value: f64,
    /// Whole days between now and the deadline. `None` for rolling goals.
    pub days_until_target: Option<i64>,
    /// Units per day.
    pub rate_of_progress: f64,
    pub projected_completion_date: Option<DateTime<Utc>>,
    pub is_on_track: bool,
    /// Uncapped; may exceed 100.
    pub progress_percentage: f64,
}

/// A goal alongside its observed state and projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProjection {
    pub goal: Goal,
    pub kind: GoalKind,
    pub initial_value: f64,
    pub projection: Projection,
}

/// Project `goal` forward from `current_value`.
///
/// `history` is the user's log; only the entries relevant to the goal's
/// kind are used to estimate a rate of progress.
pub fn project(
    goal: &Goal,
    current_value: f64,
    history: &[LogEntry],
    now: DateTime<Utc>,
) -> Projection {
    let target_value = goal.target_value;
    let progress = progress_percentage(current_value, target_value);

    let target_date = match goal.target_date {
        TargetDate::Fixed(dt) => dt,
        TargetDate::Rolling => {
            return Projection {
                is_rolling: true,
                current_value,
                target_value,
                days_until_target: None,
                rate_of_progress: 0.0,
                projected_completion_date: None,
                is_on_track: current_value >= target_value,
                progress_percentage: progress,
            };
        }
    };

    let days_until_target = days_between(now, target_date);
    let rate = rate_of_progress(goal, current_value, history, now);
    let remaining = target_value - current_value;

    let (projected_completion_date, is_on_track) = if rate > 0.0 {
        let days_to_complete = (remaining / rate).ceil().max(0.0);
        let projected = Duration::try_days(days_to_complete as i64)
            .and_then(|d| now.checked_add_signed(d));
        match projected {
            Some(date) => (Some(date), date <= target_date),
            None => (None, false),
        }
    } else {
        let needed_rate = if days_until_target > 0 {
            remaining / days_until_target as f64
        } else if remaining > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        (
            None,
            needed_rate <= ON_TRACK_RATE_TOLERANCE || current_value >= target_value,
        )
    };

    Projection {
        is_rolling: false,
        current_value,
        target_value,
        days_until_target: Some(days_until_target),
        rate_of_progress: rate,
        projected_completion_date,
        is_on_track,
        progress_percentage: progress,
    }
}

/// Units per day the goal is moving at, estimated from `history`.
///
/// Only cumulative challenges and counting goals have a rate; every other
/// kind reports 0 and relies on the needed-rate check.
pub fn rate_of_progress(
    goal: &Goal,
    current_value: f64,
    history: &[LogEntry],
    now: DateTime<Utc>,
) -> f64 {
    match goal.kind() {
        GoalKind::CumulativeChallenge => {
            let points = qualifying_history(goal, history);
            let (Some(first), Some(last)) = (points.first(), points.last()) else {
                return 0.0;
            };
            let span = days_between(first.0, last.0);
            if points.len() < 2 || span == 0 {
                return 0.0;
            }
            let rate = (last.1 - first.1) / span as f64;
            if rate.is_finite() {
                rate
            } else {
                0.0
            }
        }
        GoalKind::Counting => match days_of_data_observed(history, now) {
            0 => 0.0,
            days => current_value / days as f64,
        },
        GoalKind::Other => 0.0,
    }
}

/// Whole days from the earliest dated entry through `now`, inclusive.
/// 0 when nothing is dated.
pub fn days_of_data_observed(history: &[LogEntry], now: DateTime<Utc>) -> i64 {
    dated(history)
        .into_iter()
        .map(|(dt, _)| dt)
        .min()
        .map(|earliest| days_between(earliest, now) + 1)
        .unwrap_or(0)
}

/// The goal metric's value on each qualifying day, oldest first.
///
/// Cumulative challenges use strength days: `strength_total` sums every rep
/// field, `pushup_challenge` reads push-ups alone. Counting goals produce a
/// running count of new-contact days.
pub fn qualifying_history(goal: &Goal, entries: &[LogEntry]) -> Vec<(DateTime<Utc>, f64)> {
    let mut days = dated(entries);
    days.sort_by_key(|(dt, _)| *dt);

    match goal.key.as_str() {
        "strength_total" => days
            .into_iter()
            .filter(|(_, e)| e.get("strength").is_yes())
            .map(|(dt, e)| (dt, formula::cumulative_total(e, STRENGTH_PARTS)))
            .collect(),
        "pushup_challenge" => days
            .into_iter()
            .filter(|(_, e)| e.get("strength").is_yes())
            .map(|(dt, e)| (dt, e.get("pushups").number_or_zero()))
            .collect(),
        "new_contacts" => {
            let Some(contact) = formula::formula_for("new_contacts") else {
                return Vec::new();
            };
            days.into_iter()
                .filter(|(_, e)| contact.is_satisfied(e))
                .enumerate()
                .map(|(i, (dt, _))| (dt, (i + 1) as f64))
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Readings of the health measurement `field`, oldest first.
pub fn measurement_series(
    measurements: &[HealthMetricEntry],
    field: &str,
) -> Vec<(DateTime<Utc>, f64)> {
    let mut series: Vec<(DateTime<Utc>, f64)> = dated(measurements)
        .into_iter()
        .filter_map(|(dt, m)| m.value(field).map(|v| (dt, v)))
        .collect();
    series.sort_by_key(|(dt, _)| *dt);
    series
}

/// The goal metric over time, oldest first: the log's qualifying days, or
/// for goals the log does not track, health measurements of the goal key.
pub fn goal_series(
    goal: &Goal,
    entries: &[LogEntry],
    health_metrics: &[HealthMetricEntry],
) -> Vec<(DateTime<Utc>, f64)> {
    let history = qualifying_history(goal, entries);
    if !history.is_empty() {
        return history;
    }
    measurement_series(health_metrics, &goal.key)
}

/// Latest value of the goal metric. Falls back to the goal's stored
/// `current_value` when neither the log nor the measurements say anything.
pub fn observe_current_value(
    goal: &Goal,
    entries: &[LogEntry],
    health_metrics: &[HealthMetricEntry],
) -> f64 {
    goal_series(goal, entries, health_metrics)
        .last()
        .map(|(_, v)| *v)
        .unwrap_or(goal.current_value)
}
