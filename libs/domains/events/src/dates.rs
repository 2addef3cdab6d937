//! Date display and parsing helpers

use chrono::{DateTime, NaiveDate, Utc};

const DATE_FORMAT: &str = "%b %d, %Y";
const TIME_FORMAT: &str = "%H:%M";
const DATE_TIME_FORMAT: &str = "%b %d, %Y at %H:%M";
const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// `Mar 05, 2026`
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `19:30`
pub fn format_time(date: DateTime<Utc>) -> String {
    date.format(TIME_FORMAT).to_string()
}

/// `Mar 05, 2026 at 19:30`
pub fn format_date_time(date: DateTime<Utc>) -> String {
    date.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a `yyyy-MM-dd` form value as midnight UTC
pub fn parse_form_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), FORM_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a display date (`Mar 05, 2026`) as midnight UTC
pub fn parse_display_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Upcoming includes an event starting exactly now
pub fn is_upcoming(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date >= now
}

pub fn is_today(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date.date_naive() == now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formatting() {
        let date = Utc.with_ymd_and_hms(2026, 3, 5, 19, 30, 0).unwrap();
        assert_eq!(format_date(date), "Mar 05, 2026");
        assert_eq!(format_time(date), "19:30");
        assert_eq!(format_date_time(date), "Mar 05, 2026 at 19:30");
    }

    #[test]
    fn test_parsing() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_form_date("2026-03-05"), Some(expected));
        assert_eq!(parse_display_date("Mar 05, 2026"), Some(expected));
        assert_eq!(parse_form_date("05/03/2026"), None);
        assert_eq!(parse_form_date(""), None);
    }

    #[test]
    fn test_relative_checks() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 5, 18, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2026, 3, 4, 18, 0, 0).unwrap();

        assert!(is_upcoming(later, now));
        assert!(!is_upcoming(earlier, now));
        assert!(is_upcoming(now, now));
        assert!(is_today(later, now));
        assert!(!is_today(earlier, now));
    }
}
