pub mod config;
pub mod dataset;
pub mod date_util;
pub mod entry;
pub mod error;
pub mod goal;
pub mod history;
pub mod metrics;
pub mod projection;
pub mod window;

use chrono::{DateTime, Utc};

pub use config::{Config, GoalTargets};
pub use dataset::Dataset;
pub use entry::{Dated, FieldValue, HealthMetricEntry, LogEntry, RawDate};
pub use error::{Error, Result};
pub use goal::{Goal, GoalKind, TargetDate};
pub use history::MonthlyValue;
pub use metrics::GoalMetrics;
pub use projection::trajectory::{Trajectory, TrajectoryTracker};
pub use projection::{GoalProjection, Projection};
pub use window::TimeWindow;

/// Everything the engine needs to answer a query, passed explicitly.
///
/// Holds one user's data and the instant to evaluate at. Every method is a
/// pure function of these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalEngineContext {
    pub entries: Vec<LogEntry>,
    pub health_metrics: Vec<HealthMetricEntry>,
    pub goals: Vec<Goal>,
    pub targets: GoalTargets,
    pub now: DateTime<Utc>,
    /// Compute cardio from health measurements when any are in the window.
    pub prefer_health_metrics: bool,
}

impl GoalEngineContext {
    pub fn new(
        entries: Vec<LogEntry>,
        health_metrics: Vec<HealthMetricEntry>,
        goals: Vec<Goal>,
        targets: GoalTargets,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            entries,
            health_metrics,
            goals,
            targets,
            now,
            prefer_health_metrics: true,
        }
    }

    pub fn from_dataset(dataset: Dataset, targets: GoalTargets, now: DateTime<Utc>) -> Self {
        Self::new(
            dataset.entries,
            dataset.health_metrics,
            dataset.goals,
            targets,
            now,
        )
    }

    pub fn with_prefer_health_metrics(mut self, prefer: bool) -> Self {
        self.prefer_health_metrics = prefer;
        self
    }

    /// Dashboard metrics for `window`.
    pub fn goal_metrics(&self, window: TimeWindow) -> GoalMetrics {
        metrics::compute_goal_metrics(self, window)
    }

    /// Monthly series of `metric` over the whole log, ignoring any window.
    pub fn monthly_trend(&self, metric: &str) -> Vec<MonthlyValue> {
        history::group_monthly(&self.entries, metric)
    }

    pub fn find_goal(&self, key: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.key == key)
    }

    /// Project every configured goal.
    pub fn project_goals(&self) -> Vec<GoalProjection> {
        self.goals.iter().map(|g| self.project_goal(g)).collect()
    }

    pub fn project_goal(&self, goal: &Goal) -> GoalProjection {
        if !goal.has_valid_window() {
            log::warn!(
                "Goal {} has a target date on or before its creation date",
                goal.key
            );
        }

        let series = projection::goal_series(goal, &self.entries, &self.health_metrics);
        let current_value =
            projection::observe_current_value(goal, &self.entries, &self.health_metrics);

        GoalProjection {
            goal: goal.clone(),
            kind: goal.kind(),
            initial_value: goal.resolve_initial_value(&series),
            projection: projection::project(goal, current_value, &self.entries, self.now),
        }
    }

    /// Trajectory of the goal keyed `goal_key`, tracked through the health
    /// measurement `field` (the goal key when `None`).
    pub fn trajectory(&self, goal_key: &str, field: Option<&str>) -> Result<Trajectory> {
        let goal = self
            .find_goal(goal_key)
            .ok_or_else(|| Error::NotFound(format!("goal {goal_key}")))?;
        if !goal.has_valid_window() {
            log::warn!(
                "Goal {} has a target date on or before its creation date",
                goal.key
            );
        }

        let field = field.unwrap_or(goal_key);
        let tracker = TrajectoryTracker::from_goal(goal, &self.health_metrics, field)
            .ok_or_else(|| Error::Other(format!("goal {goal_key} is rolling and has no trajectory")))?;
        Ok(tracker.compute(self.now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    fn context() -> GoalEngineContext {
        let entries = vec![
            LogEntry::new(now() - Duration::days(40))
                .with("strength", "Yes")
                .with("pushups", 50.0)
                .with("squats", 50.0),
            LogEntry::new(now() - Duration::days(20))
                .with("strength", "Yes")
                .with("pushups", 100.0)
                .with("squats", 100.0)
                .with("meditation", "Yes"),
            LogEntry::new(now() - Duration::days(1)).with("meditation", "No"),
        ];
        let health = vec![
            HealthMetricEntry::new(now() - Duration::days(30)).with("vo2_max", 40.0),
            HealthMetricEntry::new(now() - Duration::days(2)).with("vo2_max", 43.0),
        ];
        let goals = vec![
            Goal::new(
                "health",
                "strength_total",
                400.0,
                TargetDate::Fixed(now() + Duration::days(60)),
                now() - Duration::days(45),
            ),
            Goal::new(
                "health",
                "vo2_max",
                46.0,
                TargetDate::Fixed(now() + Duration::days(30)),
                now() - Duration::days(30),
            ),
            Goal::new("wellbeing", "meditation", 20.0, TargetDate::Rolling, now()),
        ];
        GoalEngineContext::new(entries, health, goals, GoalTargets::default(), now())
    }

    #[test]
    fn test_goal_metrics_respects_window() {
        let ctx = context();
        assert_eq!(ctx.goal_metrics(TimeWindow::Last(30)).entries_count, 2);
        assert_eq!(ctx.goal_metrics(TimeWindow::All).entries_count, 3);
        assert_eq!(ctx.goal_metrics(TimeWindow::All).days_in_period, 41);
    }

    #[test]
    fn test_monthly_trend_ignores_window() {
        let trend = context().monthly_trend("meditation");
        let periods: Vec<&str> = trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-02", "2024-03"]);
    }

    #[test]
    fn test_project_goals() {
        let projections = context().project_goals();
        assert_eq!(projections.len(), 3);

        let strength = &projections[0];
        assert_eq!(strength.kind, GoalKind::CumulativeChallenge);
        assert_eq!(strength.initial_value, 100.0);
        assert_eq!(strength.projection.current_value, 200.0);
        // 100 reps over 20 days, 200 to go.
        assert_eq!(strength.projection.rate_of_progress, 5.0);
        assert_eq!(
            strength.projection.projected_completion_date,
            Some(now() + Duration::days(40))
        );
        assert!(strength.projection.is_on_track);

        let vo2 = &projections[1];
        assert_eq!(vo2.kind, GoalKind::Other);
        assert_eq!(vo2.initial_value, 40.0);
        assert_eq!(vo2.projection.current_value, 43.0);
        // 3 units over 30 days is within the needed-rate tolerance.
        assert!(vo2.projection.is_on_track);

        assert!(projections[2].projection.is_rolling);
    }

    #[test]
    fn test_projection_agrees_with_trajectory() {
        let ctx = context();
        let projections = ctx.project_goals();
        let vo2 = &projections[1];
        let t = ctx.trajectory("vo2_max", None).unwrap();

        assert_eq!(vo2.initial_value, t.initial_value);
        assert_eq!(vo2.projection.current_value, t.current_value);
        assert_eq!(vo2.projection.progress_percentage, 43.0 / 46.0 * 100.0);
    }

    #[test]
    fn test_trajectory() {
        let ctx = context();
        let t = ctx.trajectory("vo2_max", None).unwrap();
        assert_eq!(t.initial_value, 40.0);
        assert_eq!(t.current_value, 43.0);
        assert_eq!(t.time_fraction, 0.5);
        assert_eq!(t.expected_today, 43.0);
        assert!(t.is_on_track);

        assert!(matches!(ctx.trajectory("nope", None), Err(Error::NotFound(_))));
        assert!(ctx.trajectory("meditation", None).is_err());
    }
}
