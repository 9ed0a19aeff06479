//! Conversion between a deadline as typed into a form (a local date and a
//! local time in a given zone) and the UTC instant stored on a `Task`.
//!
//! The machine's own timezone is never consulted: the same inputs give the
//! same instant everywhere.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use thiserror::Error;

/// Japan Standard Time, the zone deadlines are entered and shown in.
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("invalid date {0:?}, expected yyyy-mm-dd")]
    InvalidDate(String),
    #[error("invalid time {0:?}, expected hh:mm")]
    InvalidTime(String),
}

/// Build the deadline instant from form input. Returns `Ok(None)` unless both
/// a date and a time were entered.
pub fn limit_from_local(
    date: &str,
    time: &str,
    offset: FixedOffset,
) -> Result<Option<DateTime<Utc>>, DeadlineError> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() || time.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DeadlineError::InvalidDate(date.to_string()))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| DeadlineError::InvalidTime(time.to_string()))?;

    // A fixed offset has exactly one mapping for every local time.
    let local = offset.from_local_datetime(&date.and_time(time));
    Ok(local.single().map(|dt| dt.with_timezone(&Utc)))
}

/// Split a deadline into the `yyyy-mm-dd` and `hh:mm` strings a form shows.
pub fn limit_to_local(limit: &DateTime<Utc>, offset: FixedOffset) -> (String, String) {
    let local = limit.with_timezone(&offset);
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::iso_millis;

    #[test]
    fn jst_morning_is_utc_midnight() {
        let limit = limit_from_local("2024-01-01", "09:00", jst()).unwrap().unwrap();
        assert_eq!(iso_millis::format(&limit), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn missing_part_means_no_deadline() {
        assert_eq!(limit_from_local("2024-01-01", "", jst()), Ok(None));
        assert_eq!(limit_from_local("", "10:00", jst()), Ok(None));
    }

    #[test]
    fn invalid_input_is_reported() {
        assert!(matches!(
            limit_from_local("2024-13-01", "10:00", jst()),
            Err(DeadlineError::InvalidDate(_))
        ));
        assert!(matches!(
            limit_from_local("2024-01-01", "25:00", jst()),
            Err(DeadlineError::InvalidTime(_))
        ));
    }

    #[test]
    fn local_round_trip() {
        let limit = iso_millis::parse("2024-01-01T00:00:00.000Z").unwrap();
        let (date, time) = limit_to_local(&limit, jst());
        assert_eq!((date.as_str(), time.as_str()), ("2024-01-01", "09:00"));
        assert_eq!(limit_from_local(&date, &time, jst()), Ok(Some(limit)));
    }

    #[test]
    fn utc_offset_is_identity() {
        let utc = Utc.fix();
        let limit = limit_from_local("2024-06-30", "23:59", utc).unwrap().unwrap();
        assert_eq!(limit_to_local(&limit, utc), ("2024-06-30".to_string(), "23:59".to_string()));
    }
}
