use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Whole days between two instants, regardless of order.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (b - a).num_days().abs()
}

/// Signed fractional days from `from` to `to`.
pub fn fractional_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Month bucket key (`YYYY-MM`) for an instant.
pub fn month_key(dt: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", dt.year(), dt.month())
}

/// Midnight UTC of a calendar date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a date string in any of the accepted layouts.
///
/// Supported formats:
/// - RFC 3339 (`2024-01-15T08:30:00Z`, `2024-01-15T08:30:00+02:00`)
/// - `2024-01-15T08:30:00` / `2024-01-15 08:30:00` (UTC assumed)
/// - `2024-01-15` (midnight UTC)
/// - `01/15/2024` (midnight UTC)
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }

    for layout in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
            return Some(start_of_day(date));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_days_between_is_absolute() {
        let a = at(2024, 1, 1, 0);
        let b = at(2024, 1, 11, 12);
        assert_eq!(days_between(a, b), 10);
        assert_eq!(days_between(b, a), 10);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn test_fractional_days() {
        let a = at(2024, 1, 1, 0);
        assert_eq!(fractional_days(a, a + Duration::hours(36)), 1.5);
        assert_eq!(fractional_days(a + Duration::days(2), a), -2.0);
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(at(2023, 12, 31, 23)), "2023-12");
        assert_eq!(month_key(at(2024, 2, 1, 0)), "2024-02");
    }

    #[test]
    fn test_parse_instant_formats() {
        assert_eq!(parse_instant("2024-01-15"), Some(at(2024, 1, 15, 0)));
        assert_eq!(parse_instant("01/15/2024"), Some(at(2024, 1, 15, 0)));
        assert_eq!(parse_instant("2024-01-15T08:00:00Z"), Some(at(2024, 1, 15, 8)));
        assert_eq!(parse_instant("2024-01-15T10:00:00+02:00"), Some(at(2024, 1, 15, 8)));
        assert_eq!(parse_instant("2024-01-15T08:00:00"), Some(at(2024, 1, 15, 8)));
        assert_eq!(parse_instant("2024-01-15 08:00:00.250").map(|d| d.timestamp()), Some(at(2024, 1, 15, 8).timestamp()));
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        assert_eq!(parse_instant(""), None);
        assert_eq!(parse_instant("   "), None);
        assert_eq!(parse_instant("yesterday"), None);
        assert_eq!(parse_instant("2024-13-45"), None);
    }
}
