//! the document-store collaborator boundary. the pipeline only ever needs
//! typed find-one / create / replace / bulk-update / distinct and
//! group-count operations plus one geospatial proximity query, so the store
//! is expressed as one trait per collection. [`MemoryDatabase`] implements
//! all three for tests and local runs; production callers adapt their own
//! store.

mod memory;

use std::collections::BTreeMap;

use geo::Point;

use crate::mode::TransitMode;
use crate::route::MergedRoute;
use crate::services::ServiceRef;
use crate::shape::ShapeVariant;
use crate::stop::MergedStop;
use crate::timetable::Timetable;
use crate::topology::DirectionTopology;

pub use memory::MemoryDatabase;

/// a store-assigned document handle, stable for the lifetime of one
/// ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

pub trait StopCollection {
    /// the merged stop owning the bay `(mode, stopGTFSID)`, if any.
    fn find_stop_by_bay(
        &self,
        mode: TransitMode,
        stop_gtfs_id: &str,
    ) -> Option<(DocumentId, MergedStop)>;

    /// the merged stop with this merge name within `max_distance_meters` of
    /// the location, if any.
    fn find_stop_near(
        &self,
        merge_name: &str,
        location: &Point<f64>,
        max_distance_meters: f64,
    ) -> Option<(DocumentId, MergedStop)>;

    fn get_stop(&self, id: DocumentId) -> Option<MergedStop>;
    fn insert_stop(&mut self, stop: MergedStop) -> DocumentId;
    fn replace_stop(&mut self, id: DocumentId, stop: MergedStop);
    fn stop_ids(&self) -> Vec<DocumentId>;
}

/// one route's deduplicated shape variants, written back in a batch.
#[derive(Debug, Clone)]
pub struct RoutePathUpdate {
    pub route_gtfs_id: String,
    pub route_path: Vec<ShapeVariant>,
}

/// one route's canonical directions, written back in a batch after the
/// topology pass.
#[derive(Debug, Clone)]
pub struct RouteDirectionsUpdate {
    pub route_gtfs_id: String,
    pub directions: Vec<DirectionTopology>,
    pub ptv_directions: BTreeMap<String, u8>,
}

pub trait RouteCollection {
    fn find_route(&self, route_gtfs_id: &str) -> Option<(DocumentId, MergedRoute)>;
    fn insert_route(&mut self, route: MergedRoute) -> DocumentId;
    fn replace_route(&mut self, id: DocumentId, route: MergedRoute);
    fn distinct_route_ids(&self) -> Vec<String>;
    fn bulk_set_route_paths(&mut self, updates: Vec<RoutePathUpdate>);
    fn bulk_set_route_directions(&mut self, updates: Vec<RouteDirectionsUpdate>);
}

pub trait TimetableCollection {
    fn insert_timetables(&mut self, timetables: Vec<Timetable>);

    /// the first timetable observed for one of a route's shape variants.
    fn find_timetable_by_shape(
        &self,
        route_gtfs_id: &str,
        shape_id: &str,
    ) -> Option<Timetable>;

    /// trip destinations for a route direction, most frequent first, ties
    /// broken alphabetically for stable output.
    fn destinations_by_frequency(&self, route_gtfs_id: &str, gtfs_direction: u8) -> Vec<String>;

    /// the distinct route+direction+number triples serving a bay. with
    /// `pickup_only`, restricted to timetables permitting boarding at that
    /// bay.
    fn services_at_bay(
        &self,
        mode: TransitMode,
        stop_gtfs_id: &str,
        pickup_only: bool,
    ) -> Vec<ServiceRef>;
}
