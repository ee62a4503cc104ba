use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::date_util::fractional_days;
use crate::entry::HealthMetricEntry;
use crate::goal::{Goal, INFERRED_INITIAL_FRACTION};
use crate::projection::measurement_series;

/// Slack below the expected line still counted as on track.
pub const ON_TRACK_BAND: f64 = 0.5;

/// Straight-line path from a starting value to a target over a fixed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryTracker {
    pub initial_value: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// One chart anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub date: DateTime<Utc>,
    pub expected: Option<f64>,
    pub actual: Option<f64>,
    pub projected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub initial_value: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub total_days: f64,
    pub elapsed_days: f64,
    pub time_fraction: f64,
    pub expected_today: f64,
    pub is_on_track: bool,
    /// Units per day since the start. `None` before any time has elapsed.
    pub improvement_rate: Option<f64>,
    pub projected_final: f64,
    /// Start, today and target.
    pub points: [TrajectoryPoint; 3],
}

impl TrajectoryTracker {
    pub fn new(
        initial_value: f64,
        current_value: f64,
        target_value: f64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            initial_value,
            current_value,
            target_value,
            start_date,
            end_date,
        }
    }

    /// Build a tracker for `goal` from measurements of `field`.
    ///
    /// The latest measurement is the current value (else the goal's stored
    /// one). Returns `None` for rolling goals, which have no end date.
    pub fn from_goal(goal: &Goal, measurements: &[HealthMetricEntry], field: &str) -> Option<Self> {
        let Some(end_date) = goal.target_date.fixed() else {
            log::debug!("Goal {} is rolling, no trajectory", goal.key);
            return None;
        };

        let series = measurement_series(measurements, field);
        let current_value = series.last().map(|(_, v)| *v).unwrap_or(goal.current_value);
        let initial_value = goal
            .initial_value
            .filter(|v| v.is_finite())
            .or_else(|| series.first().map(|(_, v)| *v))
            .unwrap_or(current_value * INFERRED_INITIAL_FRACTION);

        Some(Self::new(
            initial_value,
            current_value,
            goal.target_value,
            goal.created_at,
            end_date,
        ))
    }

    /// Recompute the trajectory as of `now`.
    pub fn compute(&self, now: DateTime<Utc>) -> Trajectory {
        let initial = self.initial_value;
        let target = self.target_value;
        let current = self.current_value;

        let total_days = fractional_days(self.start_date, self.end_date).max(0.0);
        let elapsed_days = fractional_days(self.start_date, now).max(0.0);
        let midpoint = initial + (target - initial) * 0.5;

        let raw_fraction = elapsed_days / total_days;
        let (time_fraction, expected_today) = if raw_fraction.is_finite() {
            let f = raw_fraction.clamp(0.0, 1.0);
            (f, finite_or(initial + (target - initial) * f, midpoint))
        } else {
            (0.5, midpoint)
        };

        let (improvement_rate, projected_final) = if elapsed_days > 0.0 {
            let rate = (current - initial) / elapsed_days;
            let projected = finite_or(initial + rate * total_days, target);
            (Some(rate).filter(|r| r.is_finite()), projected)
        } else {
            (None, initial)
        };

        Trajectory {
            initial_value: initial,
            current_value: current,
            target_value: target,
            total_days,
            elapsed_days,
            time_fraction,
            expected_today,
            is_on_track: current >= expected_today - ON_TRACK_BAND,
            improvement_rate,
            projected_final,
            points: [
                TrajectoryPoint {
                    date: self.start_date,
                    expected: Some(initial),
                    actual: Some(initial),
                    projected: None,
                },
                TrajectoryPoint {
                    date: now,
                    expected: Some(expected_today),
                    actual: Some(current),
                    projected: None,
                },
                TrajectoryPoint {
                    date: self.end_date,
                    expected: Some(target),
                    actual: None,
                    projected: Some(projected_final),
                },
            ],
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
