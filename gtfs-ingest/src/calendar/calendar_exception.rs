use chrono::NaiveDate;

use crate::calendar::date_codec::parse_feed_date;
use crate::ingest_error::IngestError;
use crate::reader::RawRecord;

/// the feed's exception_type values: `1` adds a date to a service, `2`
/// removes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Added,
    Removed,
}

impl ExceptionKind {
    pub fn from_feed_value(value: &str) -> Result<ExceptionKind, IngestError> {
        match value.trim() {
            "1" => Ok(ExceptionKind::Added),
            "2" => Ok(ExceptionKind::Removed),
            other => Err(IngestError::InvalidDataError(format!(
                "unknown calendar exception type '{other}'"
            ))),
        }
    }
}

/// one calendar_dates row: a dated add/remove adjustment to a service
/// calendar's weekly expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarException {
    pub calendar_id: String,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

impl CalendarException {
    pub fn from_record(record: &RawRecord) -> Result<CalendarException, IngestError> {
        Ok(CalendarException {
            calendar_id: record.get("service_id")?.to_string(),
            date: parse_feed_date(record.get("date")?)?,
            kind: ExceptionKind::from_feed_value(record.get("exception_type")?)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{CalendarException, ExceptionKind};
    use crate::reader::RawRecord;
    use chrono::NaiveDate;

    #[test]
    fn test_parses_a_calendar_dates_row() {
        let record = RawRecord::from_pairs([
            ("service_id", "T3_2"),
            ("date", "20250126"),
            ("exception_type", "2"),
        ]);
        let exception = CalendarException::from_record(&record).unwrap();
        assert_eq!(exception.calendar_id, "T3_2");
        assert_eq!(
            exception.date,
            NaiveDate::from_ymd_opt(2025, 1, 26).unwrap()
        );
        assert_eq!(exception.kind, ExceptionKind::Removed);
    }
}
