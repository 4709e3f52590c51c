/// Utility functions for timestamps and artifact naming
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

/// Format a record timestamp for the logs
///
/// RFC 3339 in UTC sorts lexically in time order and carries its offset,
/// so rows stay unambiguous once they land in the remote archive.
/// Falls back to the default string representation if formatting fails.
pub fn format_timestamp(dt: &OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

/// Image file name derived from its capture time, `YYYYmmdd_HHMMSS.jpg`
pub fn image_file_name(dt: &OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let stem = dt
        .format(format)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string());
    format!("{}.jpg", stem)
}

/// Parse a non-negative number of seconds, allowing fractions
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
