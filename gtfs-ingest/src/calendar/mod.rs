mod calendar_exception;
mod date_codec;
mod service_calendar;

pub use calendar_exception::{CalendarException, ExceptionKind};
pub use date_codec::{format_feed_date, parse_feed_date, FEED_DATE_FORMAT};
pub use service_calendar::ServiceCalendar;
