//! Date and timestamp utilities

use chrono::{Local, NaiveDate};

use crate::{Error, Result};

/// Today's calendar date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date as entered on the forms
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_is_recent() {
        assert!(today() > NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 1992-05-15 ").unwrap(),
            NaiveDate::from_ymd_opt(1992, 5, 15).unwrap()
        );
        assert!(matches!(parse_date("15/05/1992"), Err(Error::InvalidInput(_))));
        assert!(parse_date("1992-02-30").is_err());
    }
}
