use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::date_util::days_between;
use crate::entry::Dated;
use crate::error::{Error, Result};

static RE_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*(?:d|day|days)$").unwrap());

/// Window lengths the dashboard offers.
pub const SUPPORTED_WINDOW_DAYS: [u32; 4] = [7, 30, 90, 365];

/// A relative date range ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Every entry, unfiltered.
    #[default]
    All,
    /// The trailing N days.
    Last(u32),
}

impl TimeWindow {
    /// Parse a window string.
    ///
    /// Supported formats:
    /// - `all`, `none`: no filtering
    /// - `7d`, `30days`, `90 days`: trailing N days, N in 7/30/90/365
    /// - `1y`, `year`: trailing 365 days
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "" | "all" | "none" => return Ok(TimeWindow::All),
            "1y" | "year" => return Ok(TimeWindow::Last(365)),
            _ => {}
        }

        if let Some(caps) = RE_DAYS.captures(&s) {
            let n: u32 = caps[1]
                .parse()
                .map_err(|_| Error::WindowParse(format!("invalid day count: {s}")))?;
            if SUPPORTED_WINDOW_DAYS.contains(&n) {
                return Ok(TimeWindow::Last(n));
            }
            return Err(Error::WindowParse(format!(
                "unsupported window length {n}d (use 7d, 30d, 90d, 365d or all)"
            )));
        }

        Err(Error::WindowParse(format!("unrecognized window: {s}")))
    }

    /// Canonical key string.
    pub fn to_key(&self) -> String {
        match self {
            TimeWindow::All => "all".to_string(),
            TimeWindow::Last(n) => format!("{n}d"),
        }
    }

    pub fn days(&self) -> Option<u32> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Last(n) => Some(*n),
        }
    }

    /// Inclusive lower bound of the window, if bounded. Lengths reaching
    /// past the earliest representable instant start there.
    pub fn start_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|n| {
            Duration::try_days(n as i64)
                .and_then(|d| now.checked_sub_signed(d))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        })
    }

    /// Restrict `items` to the window. `All` returns the input unchanged;
    /// a bounded window drops records whose date is missing or unparseable.
    pub fn filter<T: Dated + Clone>(&self, items: &[T], now: DateTime<Utc>) -> Vec<T> {
        let Some(start) = self.start_date(now) else {
            return items.to_vec();
        };

        let kept: Vec<T> = items
            .iter()
            .filter(|item| item.instant().is_some_and(|dt| dt >= start))
            .cloned()
            .collect();

        let dropped = items.len() - kept.len();
        if dropped > 0 {
            log::debug!("Window {}: dropped {dropped} of {} records", self, items.len());
        }
        kept
    }

    /// Number of days the window covers. For `All` this is the span from the
    /// earliest dated record through `now`, inclusive.
    pub fn days_in_period<T: Dated>(&self, items: &[T], now: DateTime<Utc>) -> u32 {
        match self {
            TimeWindow::Last(n) => *n,
            TimeWindow::All => items
                .iter()
                .filter_map(|item| item.instant())
                .min()
                .map(|earliest| days_between(earliest, now) + 1)
                .unwrap_or(1)
                .clamp(1, u32::MAX as i64) as u32,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TimeWindow::parse(s)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl Serialize for TimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_key())
    }
}
