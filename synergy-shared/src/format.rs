//! Display formatting for dates, file sizes and names
//!
//! Timestamps arrive from the store as ISO-8601 strings, either full
//! RFC 3339 date-times or bare `YYYY-MM-DD` dates. Formatters return an empty
//! string for empty or unparseable input.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMAT: &str = "%b %-d, %Y";
const TIME_FORMAT: &str = "%-I:%M %p";

/// Parses a store timestamp, treating naive values as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Jan 5, 2024`
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// `Jan 5, 2024 3:04 PM`
pub fn format_date_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| format!("{} {}", dt.format(DATE_FORMAT), dt.format(TIME_FORMAT)))
        .unwrap_or_default()
}

/// Relative description of `raw` as seen at `now`
///
/// Same-day and previous-day timestamps render as `Today at 3:04 PM` and
/// `Yesterday at 3:04 PM`. Anything else is a distance such as
/// `3 days ago` or `in 2 months`.
pub fn format_relative_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_timestamp(raw) else {
        return String::new();
    };

    let day = dt.date_naive();
    let today = now.date_naive();
    if day == today {
        return format!("Today at {}", dt.format(TIME_FORMAT));
    }
    if today.pred_opt() == Some(day) {
        return format!("Yesterday at {}", dt.format(TIME_FORMAT));
    }

    let delta = now.signed_duration_since(dt);
    let distance = describe_distance(if delta < Duration::zero() { -delta } else { delta });
    if delta < Duration::zero() {
        format!("in {}", distance)
    } else {
        format!("{} ago", distance)
    }
}

fn describe_distance(delta: Duration) -> String {
    let minutes = delta.num_minutes();
    let hours = delta.num_hours();
    let days = delta.num_days();

    if minutes < 1 {
        "less than a minute".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        format!("about {}", plural(hours, "hour"))
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        format!("about {}", plural(days / 365, "year"))
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in base-1024 units, at most two decimals
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Up to two upper-cased initials of a display name
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-05"), "Jan 5, 2024");
        assert_eq!(format_date("2024-11-20T09:30:00Z"), "Nov 20, 2024");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("not a date"), "");
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(format_date_time("2024-01-05T15:04:00Z"), "Jan 5, 2024 3:04 PM");
        assert_eq!(format_date_time("2024-01-05T00:15:00"), "Jan 5, 2024 12:15 AM");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();

        assert_eq!(format_relative_time("2024-03-10T15:04:00Z", now), "Today at 3:04 PM");
        assert_eq!(
            format_relative_time("2024-03-09T08:30:00Z", now),
            "Yesterday at 8:30 AM"
        );
        assert_eq!(format_relative_time("2024-03-07T18:00:00Z", now), "3 days ago");
        assert_eq!(format_relative_time("2024-01-05T18:00:00Z", now), "2 months ago");
        assert_eq!(format_relative_time("2024-03-20T18:00:00Z", now), "in 10 days");
        assert_eq!(format_relative_time("", now), "");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2_621_440), "2.5 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("sarah connor"), "SC");
        assert_eq!(initials("Mary Ann Lee"), "MA");
        assert_eq!(initials("Cher"), "C");
        assert_eq!(initials("   "), "");
    }
}
