use crate::entry::{dated, LogEntry};

/// Sub-count fields summed into a strength session total.
pub const STRENGTH_PARTS: &[&str] = &["pushups", "pullups", "squats", "situps"];

/// Every metric name the library knows.
pub const METRIC_NAMES: &[&str] = &[
    "talk_fam",
    "talk_friends",
    "social_event",
    "new_contacts",
    "meditation",
    "gratitude",
    "journal",
    "mood",
    "energy",
    "sleep_hours",
    "alcohol_free",
    "strength",
    "strength_total",
    "cardio",
    "deep_work",
    "reading",
    "learning",
];

/// The computation behind a metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// Percentage of entries where the field is "Yes".
    BinaryRate(&'static str),
    /// Like `BinaryRate`, but positive numbers and non-"No" text also count.
    TolerantRate(&'static str),
    /// Mean over the entries where the field is numeric.
    AverageOfPresent(&'static str),
    /// Sum of `parts` on the most recent entry where `flag` is "Yes".
    LatestCumulative {
        flag: &'static str,
        parts: &'static [&'static str],
    },
}

/// Look up the formula for a metric name.
pub fn formula_for(name: &str) -> Option<Formula> {
    let formula = match name {
        "talk_fam" => Formula::BinaryRate("talk_fam"),
        "talk_friends" => Formula::BinaryRate("talk_friends"),
        "social_event" => Formula::BinaryRate("social_event"),
        "new_contacts" => Formula::TolerantRate("new_contact"),
        "meditation" => Formula::BinaryRate("meditation"),
        "gratitude" => Formula::BinaryRate("gratitude"),
        "journal" => Formula::TolerantRate("journal"),
        "mood" => Formula::AverageOfPresent("mood"),
        "energy" => Formula::AverageOfPresent("energy"),
        "sleep_hours" => Formula::AverageOfPresent("sleep_hours"),
        "alcohol_free" => Formula::BinaryRate("alcohol_free"),
        "strength" => Formula::BinaryRate("strength"),
        "strength_total" => Formula::LatestCumulative {
            flag: "strength",
            parts: STRENGTH_PARTS,
        },
        "cardio" => Formula::BinaryRate("cardio"),
        "deep_work" => Formula::BinaryRate("deep_work"),
        "reading" => Formula::BinaryRate("reading"),
        "learning" => Formula::TolerantRate("learning"),
        _ => return None,
    };
    Some(formula)
}

/// Compute a named metric over `entries`. Unknown names and empty input
/// yield 0. Entries without a usable date are ignored.
pub fn compute(name: &str, entries: &[LogEntry]) -> f64 {
    match formula_for(name) {
        Some(formula) => formula.evaluate(entries),
        None => {
            log::debug!("Unknown metric '{name}', reporting 0");
            0.0
        }
    }
}

impl Formula {
    /// Whether a single entry counts toward this metric.
    pub fn is_satisfied(&self, entry: &LogEntry) -> bool {
        match self {
            Formula::BinaryRate(f) => entry.get(f).is_yes(),
            Formula::TolerantRate(f) => entry.get(f).is_truthy(),
            Formula::AverageOfPresent(f) => entry.get(f).as_number().is_some(),
            Formula::LatestCumulative { flag, .. } => entry.get(flag).is_yes(),
        }
    }

    /// Number of dated entries satisfying the formula.
    pub fn count_satisfied(&self, entries: &[LogEntry]) -> usize {
        dated(entries)
            .into_iter()
            .filter(|(_, e)| self.is_satisfied(e))
            .count()
    }

    pub fn evaluate(&self, entries: &[LogEntry]) -> f64 {
        let entries = dated(entries);
        if entries.is_empty() {
            return 0.0;
        }

        match self {
            Formula::BinaryRate(_) | Formula::TolerantRate(_) => {
                let hits = entries.iter().filter(|(_, e)| self.is_satisfied(e)).count();
                hits as f64 / entries.len() as f64 * 100.0
            }
            Formula::AverageOfPresent(f) => {
                let values: Vec<f64> = entries
                    .iter()
                    .filter_map(|(_, e)| e.get(f).as_number())
                    .collect();
                mean(&values).unwrap_or(0.0)
            }
            Formula::LatestCumulative { flag, parts } => entries
                .iter()
                .filter(|(_, e)| e.get(flag).is_yes())
                .max_by_key(|(dt, _)| *dt)
                .map(|(_, e)| cumulative_total(e, parts))
                .unwrap_or(0.0),
        }
    }
}

/// Sum of the given sub-count fields; missing or non-numeric parts count as 0.
pub fn cumulative_total(entry: &LogEntry, parts: &[&str]) -> f64 {
    parts.iter().map(|p| entry.get(p).number_or_zero()).sum()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
