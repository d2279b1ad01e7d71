use chrono::{DateTime, NaiveDate, NaiveDateTime, Weekday};

/// Output format of [`format_date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of an HTTP `Last-Modified` value without its weekday and zone.
const HTTP_DATE_LAYOUT: &str = "%d %b %Y %H:%M:%S";

/// Zone names that denote UTC; any other zone is rejected.
const UTC_ZONES: &[&str] = &["GMT", "UTC"];

/// Replace newlines and non-breaking spaces with plain spaces.
pub fn remove_newline(text: &str) -> String {
    text.replace('\n', " ").replace('\u{a0}', " ")
}

/// Parse `"<weekday>, <day> <month> <year> <time> GMT"`, e.g. an HTTP
/// `Last-Modified` header. The weekday must be a weekday name but is not
/// checked against the date.
pub fn parse_http_date(value: &str) -> Option<NaiveDateTime> {
    let (stamp, zone) = value.trim().rsplit_once(' ')?;
    if !UTC_ZONES.contains(&zone) {
        return None;
    }
    let (weekday, rest) = stamp.split_once(", ")?;
    weekday.parse::<Weekday>().ok()?;
    NaiveDateTime::parse_from_str(rest.trim(), HTTP_DATE_LAYOUT).ok()
}

/// Reformat an HTTP date as `YYYY-MM-DD HH:MM:SS`, or `""` if it does not parse.
pub fn format_date(value: &str) -> String {
    parse_http_date(value)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Best-effort parse of a publish date found in page metadata.
pub fn parse_published_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.naive_utc());
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.naive_utc());
    }
    for layout in [DATE_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(date);
        }
    }
    // Date only, possibly followed by a time we could not read.
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_newline() {
        assert_eq!(remove_newline("Hello\nWorld\u{a0}!"), "Hello World !");
        assert_eq!(remove_newline("a\n\nb"), "a  b");
        assert_eq!(remove_newline("plain"), "plain");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00 GMT"), "2024-01-01 12:00:00");
        assert_eq!(format_date("Wed, 21 Oct 2015 07:28:00 GMT"), "2015-10-21 07:28:00");
    }

    #[test]
    fn test_format_date_invalid() {
        assert_eq!(format_date("garbage"), "");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00"), "");
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00 +0000"), "");
        assert_eq!(format_date("01 Jan 2024 12:00:00 GMT"), "");
        assert_eq!(format_date("Xyz, 01 Jan 2024 12:00:00 GMT"), "");
    }

    #[test]
    fn test_format_date_only_accepts_utc_zones() {
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00 UTC"), "2024-01-01 12:00:00");
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00 PST"), "");
        assert_eq!(format_date("Mon, 01 Jan 2024 12:00:00 CET"), "");
    }

    #[test]
    fn test_format_date_ignores_weekday_mismatch() {
        assert_eq!(format_date("Tue, 01 Jan 2024 12:00:00 GMT"), "2024-01-01 12:00:00");
    }

    #[test]
    fn test_parse_published_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_published_date("2024-03-05T10:30:00Z"), Some(expected));
        assert_eq!(parse_published_date("2024-03-05T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_published_date("2024-03-05 10:30:00"), Some(expected));
        assert_eq!(parse_published_date("Tue, 05 Mar 2024 10:30:00 +0000"), Some(expected));
        assert_eq!(
            parse_published_date("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_published_date("yesterday"), None);
        assert_eq!(parse_published_date("  "), None);
    }
}
