use std::collections::BTreeMap;

use serde::Serialize;

use crate::date_util::month_key;
use crate::entry::{Dated, LogEntry};
use crate::metrics::formula;

/// Fewest periods a trend needs before it is worth charting.
pub const MIN_TREND_PERIODS: usize = 2;

/// One calendar month of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyValue {
    /// `YYYY-MM`
    pub period: String,
    pub value: f64,
    /// Entries that fell in this month.
    pub count: usize,
}

/// Bucket `entries` by calendar month and evaluate `metric` per bucket.
///
/// Always pass the full, unfiltered collection: trends are independent of the
/// selected window. Entries without a usable date are skipped. Output is
/// sorted by period ascending.
pub fn group_monthly(entries: &[LogEntry], metric: &str) -> Vec<MonthlyValue> {
    let mut buckets: BTreeMap<String, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(dt) = entry.instant() {
            buckets.entry(month_key(dt)).or_default().push(entry.clone());
        }
    }

    buckets
        .into_iter()
        .map(|(period, group)| MonthlyValue {
            value: formula::compute(metric, &group),
            count: group.len(),
            period,
        })
        .collect()
}

/// Whether a series has enough periods to show a trend.
pub fn has_sufficient_history(series: &[MonthlyValue]) -> bool {
    series.len() >= MIN_TREND_PERIODS
}
