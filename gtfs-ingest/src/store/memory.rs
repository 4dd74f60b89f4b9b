use std::collections::{BTreeMap, BTreeSet, HashMap};

use geo::{Distance, Haversine, Point};

use crate::mode::TransitMode;
use crate::route::MergedRoute;
use crate::services::ServiceRef;
use crate::stop::MergedStop;
use crate::store::{
    DocumentId, RouteCollection, RouteDirectionsUpdate, RoutePathUpdate, StopCollection,
    TimetableCollection,
};
use crate::timetable::Timetable;

/// an in-memory document store. passes are single-writer, so interior
/// mutability is unnecessary; reads take `&self` and the topology pass can
/// share the store across its worker pool.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    stops: BTreeMap<DocumentId, MergedStop>,
    routes: BTreeMap<DocumentId, MergedRoute>,
    timetables: Vec<Timetable>,
    next_id: u64,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }

    fn allocate_id(&mut self) -> DocumentId {
        self.next_id += 1;
        DocumentId(self.next_id)
    }

    pub fn timetables(&self) -> &[Timetable] {
        &self.timetables
    }

    pub fn find_timetable<P>(&self, predicate: P) -> Option<&Timetable>
    where
        P: Fn(&Timetable) -> bool,
    {
        self.timetables.iter().find(|timetable| predicate(timetable))
    }
}

impl StopCollection for MemoryDatabase {
    fn find_stop_by_bay(
        &self,
        mode: TransitMode,
        stop_gtfs_id: &str,
    ) -> Option<(DocumentId, MergedStop)> {
        self.stops
            .iter()
            .find(|(_, stop)| stop.has_bay(mode, stop_gtfs_id))
            .map(|(id, stop)| (*id, stop.clone()))
    }

    fn find_stop_near(
        &self,
        merge_name: &str,
        location: &Point<f64>,
        max_distance_meters: f64,
    ) -> Option<(DocumentId, MergedStop)> {
        self.stops
            .iter()
            .find(|(_, stop)| {
                stop.merge_name == merge_name
                    && stop
                        .location
                        .iter()
                        .any(|point| Haversine.distance(*point, *location) <= max_distance_meters)
            })
            .map(|(id, stop)| (*id, stop.clone()))
    }

    fn get_stop(&self, id: DocumentId) -> Option<MergedStop> {
        self.stops.get(&id).cloned()
    }

    fn insert_stop(&mut self, stop: MergedStop) -> DocumentId {
        let id = self.allocate_id();
        self.stops.insert(id, stop);
        id
    }

    fn replace_stop(&mut self, id: DocumentId, stop: MergedStop) {
        self.stops.insert(id, stop);
    }

    fn stop_ids(&self) -> Vec<DocumentId> {
        self.stops.keys().copied().collect()
    }
}

impl RouteCollection for MemoryDatabase {
    fn find_route(&self, route_gtfs_id: &str) -> Option<(DocumentId, MergedRoute)> {
        self.routes
            .iter()
            .find(|(_, route)| route.route_gtfs_id == route_gtfs_id)
            .map(|(id, route)| (*id, route.clone()))
    }

    fn insert_route(&mut self, route: MergedRoute) -> DocumentId {
        let id = self.allocate_id();
        self.routes.insert(id, route);
        id
    }

    fn replace_route(&mut self, id: DocumentId, route: MergedRoute) {
        self.routes.insert(id, route);
    }

    fn distinct_route_ids(&self) -> Vec<String> {
        self.routes
            .values()
            .map(|route| route.route_gtfs_id.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    fn bulk_set_route_paths(&mut self, updates: Vec<RoutePathUpdate>) {
        for update in updates {
            if let Some((id, mut route)) = self.find_route(&update.route_gtfs_id) {
                route.route_path = update.route_path;
                self.routes.insert(id, route);
            }
        }
    }

    fn bulk_set_route_directions(&mut self, updates: Vec<RouteDirectionsUpdate>) {
        for update in updates {
            if let Some((id, mut route)) = self.find_route(&update.route_gtfs_id) {
                route.directions = update.directions;
                route.ptv_directions = update.ptv_directions;
                self.routes.insert(id, route);
            }
        }
    }
}

impl TimetableCollection for MemoryDatabase {
    fn insert_timetables(&mut self, timetables: Vec<Timetable>) {
        self.timetables.extend(timetables);
    }

    fn find_timetable_by_shape(
        &self,
        route_gtfs_id: &str,
        shape_id: &str,
    ) -> Option<Timetable> {
        self.timetables
            .iter()
            .find(|timetable| {
                timetable.route_gtfs_id == route_gtfs_id && timetable.shape_id == shape_id
            })
            .cloned()
    }

    fn destinations_by_frequency(&self, route_gtfs_id: &str, gtfs_direction: u8) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for timetable in &self.timetables {
            if timetable.route_gtfs_id == route_gtfs_id
                && timetable.gtfs_direction == gtfs_direction
            {
                *counts.entry(&timetable.destination).or_default() += 1;
            }
        }
        let mut destinations: Vec<(&str, usize)> = counts.into_iter().collect();
        destinations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        destinations
            .into_iter()
            .map(|(destination, _)| destination.to_string())
            .collect()
    }

    fn services_at_bay(
        &self,
        mode: TransitMode,
        stop_gtfs_id: &str,
        pickup_only: bool,
    ) -> Vec<ServiceRef> {
        let mut services: BTreeSet<ServiceRef> = BTreeSet::new();
        for timetable in &self.timetables {
            if timetable.mode != mode {
                continue;
            }
            let serves_bay = timetable.stop_timings.iter().any(|timing| {
                timing.stop_gtfs_id == stop_gtfs_id
                    && (!pickup_only || timing.stop_conditions.pickup == 0)
            });
            if serves_bay {
                services.insert(ServiceRef {
                    route_gtfs_id: timetable.route_gtfs_id.clone(),
                    gtfs_direction: timetable.gtfs_direction,
                    route_number: timetable.route_number.clone(),
                });
            }
        }
        services.into_iter().collect()
    }
}
