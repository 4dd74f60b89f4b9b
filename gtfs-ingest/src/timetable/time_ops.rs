use crate::ingest_error::IngestError;

/// parses a feed time (`HH:MM` or `HH:MM:SS`) into minutes past midnight.
/// hours past 24 are legal, they mark trips running past midnight on their
/// operating day.
pub fn feed_time_to_minutes(time: &str) -> Result<u32, IngestError> {
    let mut parts = time.trim().split(':');
    let hours: u32 = parts
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| IngestError::InvalidTimeError(time.to_string()))?;
    let minutes: u32 = parts
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| IngestError::InvalidTimeError(time.to_string()))?;
    if minutes >= 60 {
        return Err(IngestError::InvalidTimeError(time.to_string()));
    }
    Ok(hours * 60 + minutes)
}

/// formats minutes past midnight as `HH:MM`, without wrapping: `24:13`
/// stays `24:13`.
pub fn minutes_to_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// formats minutes past midnight wrapped to the 24-hour clock.
pub fn minutes_to_hhmm_wrapped(minutes: u32) -> String {
    minutes_to_hhmm(minutes % 1440)
}
