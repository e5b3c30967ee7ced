use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::errors::{AppError, AppResult};

/// Bookings last exactly one hour.
pub const SLOT_HOURS: u32 = 1;

/// Parses a zero-padded `YYYY-MM-DD` date. The string must be exactly the
/// canonical form: chrono alone accepts space-padded fields.
pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    let date =
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::validation("date", s))?;
    if date.format("%Y-%m-%d").to_string() != s {
        return Err(AppError::validation("date", s));
    }
    Ok(date)
}

/// Parses a slot start time: zero-padded `HH:MM` on the hour.
pub fn parse_start_time(s: &str) -> AppResult<NaiveTime> {
    let time =
        NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| AppError::validation("start_time", s))?;
    if time.minute() != 0 || time.format("%H:%M").to_string() != s {
        return Err(AppError::validation("start_time", s));
    }
    Ok(time)
}

/// `HH:MM` one slot after `start_time`. Slots may not cross midnight.
pub fn end_time(start_time: &str) -> AppResult<String> {
    let start = parse_start_time(start_time)?;
    let end_hour = start.hour() + SLOT_HOURS;
    if end_hour > 23 {
        return Err(AppError::validation("start_time", start_time));
    }
    Ok(format!("{end_hour:02}:00"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-08-15").is_ok());
        assert!(parse_date("2024-8-15").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("15/08/2024").is_err());
        assert!(parse_date("2024-08- 5").is_err());
        assert!(parse_date("2024- 8-15").is_err());
        assert!(parse_date(" 2024-08-15").is_err());
    }

    #[test]
    fn test_parse_start_time() {
        assert!(parse_start_time("09:00").is_ok());
        assert!(parse_start_time("9:00").is_err());
        assert!(parse_start_time("09:30").is_err());
        assert!(parse_start_time("24:00").is_err());
        assert!(parse_start_time(" 9:00").is_err());
        assert!(parse_start_time("09: 0").is_err());
    }

    #[test]
    fn test_end_time_is_one_hour_later() {
        assert_eq!(end_time("09:00").unwrap(), "10:00");
        assert_eq!(end_time("22:00").unwrap(), "23:00");
    }

    #[test]
    fn test_end_time_rejects_last_hour() {
        let err = end_time("23:00").unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "start_time", .. }));
    }
}
