use serde::{Deserialize, Serialize};

use crate::mode::TransitMode;

/// pickup/dropoff conditions as the feed encodes them: 0 allowed, 1
/// disallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopConditions {
    pub pickup: u8,
    pub dropoff: u8,
}

/// one stop call within a timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTiming {
    #[serde(rename = "stopGTFSID")]
    pub stop_gtfs_id: String,
    pub stop_name: String,
    pub stop_number: Option<String>,
    pub suburb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub arrival_time: Option<String>,
    pub arrival_time_minutes: Option<u32>,
    pub departure_time: Option<String>,
    pub departure_time_minutes: Option<u32>,
    pub stop_conditions: StopConditions,
    /// cumulative distance travelled along the shape, meters
    pub stop_distance: f64,
}

/// one trip's timetable document: the join of trip, stop-times, calendar
/// and the merged route/stop stores.
///
/// the first timing never has a meaningful arrival and the last never has a
/// meaningful departure; the builder enforces this, the raw feed is not
/// trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub mode: TransitMode,
    #[serde(rename = "routeGTFSID")]
    pub route_gtfs_id: String,
    pub route_name: String,
    pub route_number: Option<String>,
    #[serde(rename = "calendarID")]
    pub calendar_id: String,
    #[serde(rename = "tripID")]
    pub trip_id: String,
    #[serde(rename = "shapeID")]
    pub shape_id: String,
    pub operation_days: Vec<String>,
    pub block: Option<String>,
    pub gtfs_direction: u8,
    pub headsign: Option<String>,
    #[serde(rename = "runID")]
    pub run_id: Option<String>,
    /// rail only: "Up" for citybound workings
    pub direction: Option<String>,
    pub is_rail_replacement_bus: bool,
    pub origin: String,
    pub departure_time: String,
    pub destination: String,
    pub destination_arrival_time: String,
    pub stop_timings: Vec<StopTiming>,
}
