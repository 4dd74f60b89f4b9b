use std::collections::HashMap;

use crate::calendar::ServiceCalendar;
use crate::identity::{resolve_trip_identity, TripIdentity};
use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::reader::RawRecord;

/// one trips.txt row joined against its calendar and the route-id map, held
/// in memory while the stop-times stream by.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedTrip {
    pub trip_id: String,
    /// the final normalized route identity, None when the route was vetoed
    /// or renamed away upstream
    pub route_gtfs_id: Option<String>,
    pub calendar_id: String,
    pub operation_days: Vec<String>,
    pub shape_id: String,
    pub headsign: Option<String>,
    pub gtfs_direction: u8,
    pub block: Option<String>,
    pub identity: TripIdentity,
}

impl FeedTrip {
    pub fn from_record(
        record: &RawRecord,
        mode: TransitMode,
        calendars: &HashMap<String, ServiceCalendar>,
        route_id_map: &HashMap<String, String>,
    ) -> Result<FeedTrip, IngestError> {
        let trip_id = record.get("trip_id")?.to_string();
        let raw_route_id = record.get("route_id")?;
        let calendar_id = record.get("service_id")?.to_string();

        let calendar = calendars.get(&calendar_id).ok_or_else(|| {
            IngestError::InvalidDataError(format!(
                "trip '{trip_id}' references unknown calendar '{calendar_id}'"
            ))
        })?;
        let identity = resolve_trip_identity(&trip_id, mode)?;

        Ok(FeedTrip {
            trip_id,
            route_gtfs_id: route_id_map.get(raw_route_id).cloned(),
            calendar_id,
            operation_days: calendar.operation_days(),
            shape_id: record.get_opt("shape_id").unwrap_or_default().to_string(),
            headsign: record.get_opt("trip_headsign").map(str::to_string),
            gtfs_direction: record
                .get_opt("direction_id")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
            block: record.get_opt("block_id").map(str::to_string),
            identity,
        })
    }
}
