use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mode::TransitMode;
use crate::shape::ShapeVariant;
use crate::topology::DirectionTopology;

/// the merged route aggregate: one document per normalized route identity,
/// accumulating operators across feed variants, shape variants during the
/// shape pass and canonical directions during the topology pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRoute {
    #[serde(rename = "routeGTFSID")]
    pub route_gtfs_id: String,
    pub mode: TransitMode,
    pub route_name: String,
    pub route_number: Option<String>,
    pub operators: Vec<String>,
    pub route_path: Vec<ShapeVariant>,
    pub directions: Vec<DirectionTopology>,
    /// the upstream system's direction-name to direction-number map,
    /// recorded for cross-referencing
    pub ptv_directions: BTreeMap<String, u8>,
}

impl MergedRoute {
    /// unions an operator into the route, keeping the list sorted and
    /// duplicate-free.
    pub fn add_operator(&mut self, operator: &str) {
        if let Err(position) = self
            .operators
            .binary_search_by(|existing| existing.as_str().cmp(operator))
        {
            self.operators.insert(position, operator.to_string());
        }
    }
}
