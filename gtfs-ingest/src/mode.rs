use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ingest_error::IngestError;

/// the closed set of feed modes this pipeline ingests. each feed bundle is
/// published per-mode, and merged stop/route records are keyed by mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitMode {
    #[serde(rename = "bus")]
    Bus,
    #[serde(rename = "metro train")]
    MetroTrain,
    #[serde(rename = "regional train")]
    RegionalTrain,
    #[serde(rename = "regional coach")]
    RegionalCoach,
    #[serde(rename = "tram")]
    Tram,
    #[serde(rename = "ferry")]
    Ferry,
}

impl TransitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitMode::Bus => "bus",
            TransitMode::MetroTrain => "metro train",
            TransitMode::RegionalTrain => "regional train",
            TransitMode::RegionalCoach => "regional coach",
            TransitMode::Tram => "tram",
            TransitMode::Ferry => "ferry",
        }
    }

    /// maps the feed's numeric route_type onto a mode. several numbers fold
    /// into the same mode (school and night services are still buses).
    pub fn from_route_type(route_type: &str) -> Option<TransitMode> {
        match route_type.trim() {
            "1" | "10" => Some(TransitMode::RegionalTrain),
            "2" => Some(TransitMode::MetroTrain),
            "3" => Some(TransitMode::Tram),
            "4" | "6" | "11" => Some(TransitMode::Bus),
            "5" => Some(TransitMode::RegionalCoach),
            _ => None,
        }
    }

    /// the canonical mode number used as the prefix of normalized route
    /// identities, e.g. the `2` in `2-ALM`.
    pub fn gtfs_number(&self) -> u8 {
        match self {
            TransitMode::RegionalTrain => 1,
            TransitMode::MetroTrain => 2,
            TransitMode::Tram => 3,
            TransitMode::Bus => 4,
            TransitMode::RegionalCoach => 5,
            TransitMode::Ferry => 9,
        }
    }

    pub fn is_rail(&self) -> bool {
        matches!(self, TransitMode::MetroTrain | TransitMode::RegionalTrain)
    }
}

impl Display for TransitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransitMode {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bus" => Ok(TransitMode::Bus),
            "metro train" => Ok(TransitMode::MetroTrain),
            "regional train" => Ok(TransitMode::RegionalTrain),
            "regional coach" => Ok(TransitMode::RegionalCoach),
            "tram" => Ok(TransitMode::Tram),
            "ferry" => Ok(TransitMode::Ferry),
            _ => Err(IngestError::InvalidDataError(format!(
                "unknown transit mode '{s}'"
            ))),
        }
    }
}
