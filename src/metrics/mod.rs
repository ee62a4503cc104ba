pub mod cardio;
pub mod formula;
pub mod types;

pub use types::*;

use crate::entry::{dated, LogEntry};
use crate::window::TimeWindow;
use crate::GoalEngineContext;

/// Period unit for `*_per_week` targets.
pub const WEEK_DAYS: f64 = 7.0;
/// Period unit for `*_per_month` targets.
pub const MONTH_DAYS: f64 = 30.0;

/// Compute every dashboard metric for `window`.
///
/// When neither log entries nor health measurements fall in the window the
/// zero-valued default tree is returned.
pub fn compute_goal_metrics(ctx: &GoalEngineContext, window: TimeWindow) -> GoalMetrics {
    let now = ctx.now;
    let entries = window.filter(&ctx.entries, now);
    let health_metrics = window.filter(&ctx.health_metrics, now);
    // For `All` the period starts at the earliest record of either kind.
    let days = window
        .days_in_period(&ctx.entries, now)
        .max(window.days_in_period(&ctx.health_metrics, now));
    let entries_count = dated(&entries).len() as u64;

    if entries_count == 0 && dated(&health_metrics).is_empty() {
        log::debug!("No data in window {window}, returning empty metrics");
        return GoalMetrics {
            window,
            days_in_period: days,
            ..Default::default()
        };
    }

    let t = &ctx.targets;
    let rate = |metric: &str, goal: f64, unit: f64| rate_metric(metric, &entries, days, goal, unit);
    let average = |metric: &str, target: f64| average_metric(metric, &entries, target);

    let social = SocialMetrics {
        family: rate("talk_fam", t.family_contact_days_per_week, WEEK_DAYS),
        friends: rate("talk_friends", t.friend_contact_days_per_week, WEEK_DAYS),
        events: rate("social_event", t.social_events_per_month, MONTH_DAYS),
        new_contacts: rate("new_contacts", t.new_contacts_per_month, MONTH_DAYS),
    };

    let wellbeing = WellbeingMetrics {
        meditation: rate("meditation", t.meditation_days_per_week, WEEK_DAYS),
        gratitude: rate("gratitude", t.gratitude_days_per_week, WEEK_DAYS),
        journal: rate("journal", t.journal_days_per_week, WEEK_DAYS),
        mood: average("mood", t.mood_target),
        energy: average("energy", t.energy_target),
    };

    let strength = rate("strength", t.strength_days_per_week, WEEK_DAYS);
    let health = HealthMetrics {
        strength: StrengthMetric {
            rate: strength.rate,
            days_count: strength.days_count,
            latest_total: formula::compute("strength_total", &entries),
            target: strength.target,
            progress: strength.progress,
        },
        cardio: cardio::compute_cardio_metrics(
            &entries,
            &health_metrics,
            ctx.prefer_health_metrics,
            days,
            t,
            now,
        ),
        sleep: average("sleep_hours", t.sleep_hours_target),
        alcohol_free: rate("alcohol_free", t.alcohol_free_days_per_week, WEEK_DAYS),
    };

    let productivity = ProductivityMetrics {
        deep_work: rate("deep_work", t.deep_work_days_per_week, WEEK_DAYS),
        reading: rate("reading", t.reading_days_per_week, WEEK_DAYS),
        learning: rate("learning", t.learning_days_per_week, WEEK_DAYS),
    };

    GoalMetrics {
        window,
        days_in_period: days,
        entries_count,
        social,
        wellbeing,
        health,
        productivity,
    }
}

/// Scale a per-`unit` goal to a period of `days`.
pub fn scaled_target(goal: f64, days: u32, unit: f64) -> f64 {
    if unit <= 0.0 || !goal.is_finite() {
        return 0.0;
    }
    goal * days as f64 / unit
}

/// `observed / target * 100`, floored at 0.
///
/// A zero target counts as met when `observed` is non-negative.
pub fn progress_percentage(observed: f64, target: f64) -> f64 {
    if !observed.is_finite() {
        return 0.0;
    }
    if target == 0.0 || !target.is_finite() {
        return if observed >= 0.0 { 100.0 } else { 0.0 };
    }
    (observed / target * 100.0).max(0.0)
}

fn rate_metric(metric: &str, entries: &[LogEntry], days: u32, goal: f64, unit: f64) -> RateMetric {
    let days_count = formula::formula_for(metric)
        .map(|f| f.count_satisfied(entries))
        .unwrap_or(0) as u64;
    let target = scaled_target(goal, days, unit);

    RateMetric {
        rate: formula::compute(metric, entries),
        days_count,
        target,
        progress: progress_percentage(days_count as f64, target),
    }
}

fn average_metric(metric: &str, entries: &[LogEntry], target: f64) -> AverageMetric {
    let samples = formula::formula_for(metric)
        .map(|f| f.count_satisfied(entries))
        .unwrap_or(0) as u64;
    let average = formula::compute(metric, entries);

    AverageMetric {
        average,
        samples,
        target,
        progress: if samples == 0 {
            0.0
        } else {
            progress_percentage(average, target)
        },
    }
}
