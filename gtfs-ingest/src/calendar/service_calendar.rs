use chrono::{Datelike, NaiveDate};

use crate::calendar::calendar_exception::{CalendarException, ExceptionKind};
use crate::calendar::date_codec::{format_feed_date, parse_feed_date};
use crate::ingest_error::IngestError;
use crate::reader::RawRecord;

/// a weekly service pattern expanded over an inclusive date range into the
/// concrete set of operating dates, adjusted by add/remove exceptions.
///
/// built once per feed calendar id during trip loading and immutable after
/// exception application. `operation_days` is always sorted ascending and
/// free of duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCalendar {
    pub id: String,
    /// Monday-first weekly pattern
    pub days_of_week: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    operation_days: Vec<NaiveDate>,
}

impl ServiceCalendar {
    pub fn new(
        id: &str,
        days_of_week: [bool; 7],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ServiceCalendar {
        let mut operation_days = Vec::new();
        let mut current = start_date;
        while current <= end_date {
            // Monday = 0, matching the feed's column order
            if days_of_week[current.weekday().num_days_from_monday() as usize] {
                operation_days.push(current);
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        ServiceCalendar {
            id: id.to_string(),
            days_of_week,
            start_date,
            end_date,
            operation_days,
        }
    }

    /// builds a calendar from a calendar.txt row.
    pub fn from_record(record: &RawRecord) -> Result<ServiceCalendar, IngestError> {
        const DAY_FIELDS: [&str; 7] = [
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
        ];
        let mut days_of_week = [false; 7];
        for (day, field) in days_of_week.iter_mut().zip(DAY_FIELDS) {
            *day = record.get_opt(field) == Some("1");
        }
        Ok(ServiceCalendar::new(
            record.get("service_id")?,
            days_of_week,
            parse_feed_date(record.get("start_date")?)?,
            parse_feed_date(record.get("end_date")?)?,
        ))
    }

    /// applies one dated exception, in feed order. adding a date already
    /// present and removing a date not present are both no-ops; an exception
    /// carrying a different calendar id is a caller bug, not bad feed data.
    pub fn apply_exception(&mut self, exception: &CalendarException) -> Result<(), IngestError> {
        if exception.calendar_id != self.id {
            return Err(IngestError::CalendarExceptionMismatchError {
                calendar_id: self.id.clone(),
                exception_id: exception.calendar_id.clone(),
            });
        }
        match exception.kind {
            ExceptionKind::Added => {
                if let Err(position) = self.operation_days.binary_search(&exception.date) {
                    self.operation_days.insert(position, exception.date);
                }
            }
            ExceptionKind::Removed => {
                if let Ok(position) = self.operation_days.binary_search(&exception.date) {
                    self.operation_days.remove(position);
                }
            }
        }
        Ok(())
    }

    pub fn apply_exceptions(
        &mut self,
        exceptions: &[CalendarException],
    ) -> Result<(), IngestError> {
        for exception in exceptions {
            self.apply_exception(exception)?;
        }
        Ok(())
    }

    /// the operating dates as sorted feed-format strings.
    pub fn operation_days(&self) -> Vec<String> {
        self.operation_days.iter().map(format_feed_date).collect()
    }
}
