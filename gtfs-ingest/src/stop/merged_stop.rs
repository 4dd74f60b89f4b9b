use geo::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::mode::TransitMode;
use crate::stop::bay::Bay;

/// the deduplicated aggregate grouping every bay considered the same place.
/// created on the first sighting of an unmatched bay and mutated on every
/// later sighting; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedStop {
    pub stop_name: String,
    pub merge_name: String,
    pub canonical_names: Vec<String>,
    pub suburb: Vec<String>,
    pub bays: Vec<Bay>,
    /// one point per bay, the stop's multi-point location
    pub location: Vec<Point<f64>>,
}

impl MergedStop {
    pub fn new(bay: Bay, merge_name: String) -> MergedStop {
        let mut stop = MergedStop {
            stop_name: bay.full_stop_name.clone(),
            merge_name,
            canonical_names: Vec::new(),
            suburb: Vec::new(),
            bays: vec![bay],
            location: Vec::new(),
        };
        stop.recompute_derived();
        stop
    }

    pub fn has_bay(&self, mode: TransitMode, stop_gtfs_id: &str) -> bool {
        self.bays
            .iter()
            .any(|bay| bay.mode == mode && bay.stop_gtfs_id == stop_gtfs_id)
    }

    /// appends a bay unless an identical `(mode, stopGTFSID)` bay already
    /// exists, keeping re-ingestion idempotent. derived fields are
    /// recomputed either way.
    pub fn add_bay(&mut self, bay: Bay) {
        if !self.has_bay(bay.mode, &bay.stop_gtfs_id) {
            self.bays.push(bay);
        }
        self.recompute_derived();
    }

    /// recomputes the display name, canonical name list, suburb list and
    /// multi-point location from the current bay set. entrances and generic
    /// sub-points carry no naming weight.
    fn recompute_derived(&mut self) {
        let station_like: Vec<&Bay> = self
            .bays
            .iter()
            .filter(|bay| bay.stop_type.is_station_like())
            .collect();
        // an all-entrance stop still needs a name
        let naming_bays: Vec<&Bay> = if station_like.is_empty() {
            self.bays.iter().collect()
        } else {
            station_like
        };

        let canonical_names: Vec<String> = naming_bays
            .iter()
            .map(|bay| bay.full_stop_name.clone())
            .unique()
            .collect();
        let suburbs: Vec<String> = naming_bays
            .iter()
            .map(|bay| bay.suburb.clone())
            .unique()
            .sorted()
            .collect();
        self.canonical_names = canonical_names;
        self.suburb = suburbs;
        // one shared name keeps itself; divergent names fall back to the
        // merge name the bays were grouped under
        self.stop_name = match self.canonical_names.as_slice() {
            [single] => single.clone(),
            _ => self.merge_name.clone(),
        };
        self.location = self.bays.iter().map(|bay| bay.location).collect();
    }
}
