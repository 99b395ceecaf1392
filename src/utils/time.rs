use crate::error::{invalid_event_error, CalendarResult};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Offset-less ISO 8601 forms read as wall-clock time
const NAIVE_ISO_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Resolve a wall-clock time in `tz`; the earlier instant wins when ambiguous
fn resolve_local(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Resolve a local wall-clock time on `date` to an absolute instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// do not exist locally (DST spring-forward gap) are rejected.
pub fn local_datetime(date: NaiveDate, hour: u32, minute: u32, tz: &Tz) -> CalendarResult<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| invalid_event_error("Failed to create datetime"))?;
    resolve_local(&naive, tz).ok_or_else(|| {
        invalid_event_error(&format!(
            "{} {:02}:{:02} does not exist in {}",
            date, hour, minute, tz
        ))
    })
}

/// Calendar date of an instant in the given timezone
pub fn local_date(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Today's date on the wall clock of the given timezone
pub fn today(tz: &Tz) -> NaiveDate {
    local_date(&Utc::now(), tz)
}

/// Long date such as "Monday, March 4, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Local HH:MM for an instant
pub fn format_time(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format("%H:%M").to_string()
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2024-03-05T13:00:00.000Z`
pub fn to_iso_string(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO 8601 timestamp into UTC.
/// Text without an offset is wall-clock time in `tz`.
pub fn parse_iso_in(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_ISO_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    resolve_local(&naive, tz)
}

/// Parse an ISO 8601 timestamp, reading offset-less text as UTC
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    parse_iso_in(value, &Tz::UTC)
}

/// Serde adapter that stores instants as `to_iso_string` text
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_iso_string(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO 8601 timestamp: {}", raw)))
    }
}
