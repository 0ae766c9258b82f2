//! Timestamp parsing and clock formatting.
//!
//! Supports parsing `HH:MM:SS`, `MM:SS` and `SS` (each with optional
//! fractional seconds) and formatting offsets the way chapter lines
//! in a video description expect them.

use thiserror::Error;

/// Errors from timestamp parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("timestamp must not be negative")]
    Negative,

    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use hlt_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90.5").unwrap(), 90.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    const UNITS: [&str; 3] = ["seconds", "minutes", "hours"];
    let mut total = 0.0;
    for (i, part) in parts.iter().rev().enumerate() {
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(UNITS[i], part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total += value * 60f64.powi(i as i32);
    }

    Ok(total)
}

/// Format an offset as a chapter clock: `MM:SS`, or `H:MM:SS` past one hour.
///
/// Fractions of a second are truncated.
pub fn format_clock(total_secs: f64) -> String {
    let whole = total_secs.max(0.0).floor() as u64;
    let hours = whole / 3600;
    let mins = (whole % 3600) / 60;
    let secs = whole % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_timestamp("00:00:10").unwrap(), 10.0);
        assert_eq!(parse_timestamp("1:00").unwrap(), 60.0);
        assert_eq!(parse_timestamp(" 42 ").unwrap(), 42.0);
        assert!((parse_timestamp("00:01:02.250").unwrap() - 62.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        assert_eq!(parse_timestamp("-5"), Err(TimestampError::Negative));
        assert!(matches!(
            parse_timestamp("1:2:3:4"),
            Err(TimestampError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_timestamp("ab:10"),
            Err(TimestampError::InvalidValue("minutes", _))
        ));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.4), "00:00");
        assert_eq!(format_clock(61.9), "01:01");
        assert_eq!(format_clock(3599.0), "59:59");
        assert_eq!(format_clock(3723.0), "1:02:03");
    }
}
