use chrono::NaiveDate;

use crate::ingest_error::IngestError;

/// the date layout used throughout the feed, e.g. `20241122`.
pub const FEED_DATE_FORMAT: &str = "%Y%m%d";

pub fn parse_feed_date(value: &str) -> Result<NaiveDate, IngestError> {
    NaiveDate::parse_from_str(value.trim(), FEED_DATE_FORMAT)
        .map_err(|_| IngestError::InvalidDateError(value.to_string()))
}

pub fn format_feed_date(date: &NaiveDate) -> String {
    date.format(FEED_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod test {
    use super::{format_feed_date, parse_feed_date};
    use chrono::NaiveDate;

    #[test]
    fn test_round_trips_feed_dates() {
        let date = parse_feed_date("20241122").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 11, 22).unwrap());
        assert_eq!(format_feed_date(&date), "20241122");
    }

    #[test]
    fn test_rejects_malformed_dates() {
        assert!(parse_feed_date("2024-11-22").is_err());
        assert!(parse_feed_date("20241332").is_err());
    }
}
