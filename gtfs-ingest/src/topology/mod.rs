//! reconstruction of one canonical, branch-aware stop ordering per
//! route+direction from the many overlapping and partial per-trip
//! sequences observed in the timetables.

mod consensus;
mod route_stops;

use serde::{Deserialize, Serialize};

pub use consensus::{merge_sequences, TopologyStop};
pub use route_stops::{set_route_stops, RouteStopsOptions, ROUTE_MILESTONE_INTERVAL};

/// the canonical ordered stop list for one route direction, with the
/// display name the direction is labelled under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionTopology {
    pub direction_name: String,
    pub gtfs_direction: u8,
    pub stops: Vec<TopologyStop>,
    /// rail only: "Up" for citybound workings, "Down" otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_direction: Option<String>,
}
