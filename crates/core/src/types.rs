use chrono::{SecondsFormat, Utc};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<Utc>;

/// Render a timestamp as fixed-width ISO-8601 with millisecond precision
/// (`2024-05-01T09:30:00.125Z`).
///
/// The fixed width makes the lexicographic order of the rendered strings
/// match chronological order, which sort keys rely on.
pub fn to_millis_string(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Truncate a timestamp to whole milliseconds.
pub fn truncate_to_millis(ts: Timestamp) -> Timestamp {
    chrono::DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
