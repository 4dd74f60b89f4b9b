#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("Failed to read feed file: {0}")]
    RowSourceError(#[from] csv::Error),
    #[error("Feed row is missing required field '{0}'")]
    MissingFieldError(&'static str),
    #[error("Identifier '{identifier}' rejected by recognizer '{recognizer}'")]
    MalformedIdentifierError {
        identifier: String,
        recognizer: &'static str,
    },
    #[error("Cannot parse feed date '{0}', expected YYYYMMDD")]
    InvalidDateError(String),
    #[error("Cannot parse feed time '{0}', expected HH:MM or HH:MM:SS")]
    InvalidTimeError(String),
    #[error("Calendar exception for '{exception_id}' applied to calendar '{calendar_id}'")]
    CalendarExceptionMismatchError {
        calendar_id: String,
        exception_id: String,
    },
    #[error("Trip '{trip_id}' references unresolvable stop '{stop_gtfs_id}'")]
    UnmatchedStopError {
        trip_id: String,
        stop_gtfs_id: String,
    },
    #[error("{0}")]
    InvalidDataError(String),
}
