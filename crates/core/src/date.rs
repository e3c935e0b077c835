//! Calendar-day parsing and formatting.
//!
//! Snapshots and deadlines are keyed by calendar day, written as `YYYY-MM-DD`.

use chrono::NaiveDate;

use crate::{CoreError, Result};

/// Format used for every persisted or user-supplied date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string into a calendar day.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(s.to_string()))
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2024-03-09").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(format_date(date), "2024-03-09");
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(
            parse_date("2024-13-01"),
            Err(CoreError::InvalidDate("2024-13-01".to_string()))
        );
        assert!(parse_date("03/09/2024").is_err());
        assert!(parse_date("").is_err());
    }
}
