use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const US_DATE_TIME_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";
const UNKNOWN_MOMENT_LABEL: &str = "earlier";

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Returns the current UTC instant as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders an RFC 3339 instant as `June 1, 2025 at 3:04 PM` (UTC).
///
/// Missing or unparseable values render as `earlier`, which keeps comment
/// templates readable when a task has no recorded timestamp yet.
pub fn format_us_date_time(value: Option<&str>) -> String {
    value
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|parsed| {
            parsed
                .with_timezone(&Utc)
                .format(US_DATE_TIME_FORMAT)
                .to_string()
        })
        .unwrap_or_else(|| UNKNOWN_MOMENT_LABEL.to_string())
}

/// Parses the date spellings editors put into the publication-date field.
pub fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|value| value.and_utc());
        }
    }
    None
}

/// Converts a publication date into the ISO form the CMS expects.
pub fn to_iso_date(raw: &str) -> Option<String> {
    parse_publication_date(raw).map(|parsed| parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Converts a date into `dd/MM/yyyy` for task custom fields.
///
/// Values already in that shape and values that cannot be parsed are
/// returned unchanged.
pub fn format_dd_mm_yyyy(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_dd_mm_yyyy(trimmed) {
        return trimmed.to_string();
    }
    parse_publication_date(trimmed)
        .map(|parsed| parsed.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn is_dd_mm_yyyy(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 2 || index == 5 || byte.is_ascii_digit())
}
