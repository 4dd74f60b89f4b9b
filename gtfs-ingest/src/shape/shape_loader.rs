use std::collections::HashMap;

use crate::ingest_error::IngestError;
use crate::reader::{read_trip_group, RowReader};
use crate::route::MergedRoute;
use crate::shape::shape_variant::FeedShape;
use crate::store::{RouteCollection, RoutePathUpdate};

/// shape writes are buffered per-route and flushed in batches of this many
/// raw shapes to bound memory.
pub const SHAPE_FLUSH_SIZE: usize = 1000;

/// deduplicates raw shapes into per-route path variants. the raw feed never
/// associates shapes with routes directly, so the caller supplies the
/// shape-id to route map accumulated during trip loading.
pub struct ShapeLoader<'a, S: RouteCollection> {
    store: &'a mut S,
    route_cache: HashMap<String, MergedRoute>,
}

impl<'a, S: RouteCollection> ShapeLoader<'a, S> {
    pub fn new(store: &'a mut S) -> ShapeLoader<'a, S> {
        ShapeLoader {
            store,
            route_cache: HashMap::new(),
        }
    }

    pub fn load_shapes(
        &mut self,
        reader: &mut dyn RowReader,
        shape_id_map: &HashMap<String, String>,
    ) -> Result<(), IngestError> {
        let mut shapes_loaded = 0;
        while let Some(group) = read_trip_group(reader, "shape_id")? {
            match FeedShape::from_group(&group) {
                Ok(shape) => self.load_shape(shape, shape_id_map),
                // a bad shape never aborts the pass
                Err(e) => log::warn!("Skipping unreadable shape: {e}"),
            }

            shapes_loaded += 1;
            if shapes_loaded == SHAPE_FLUSH_SIZE {
                self.flush();
                shapes_loaded = 0;
            }
        }
        self.flush();
        Ok(())
    }

    /// folds one raw shape into its route's variant list, unioning the id
    /// into an existing variant when the fingerprint collides.
    pub fn load_shape(&mut self, shape: FeedShape, shape_id_map: &HashMap<String, String>) {
        let Some(route_gtfs_id) = shape_id_map.get(&shape.shape_id) else {
            // every trip using this shape was dropped upstream
            return;
        };

        if !self.route_cache.contains_key(route_gtfs_id) {
            let Some((_, route)) = self.store.find_route(route_gtfs_id) else {
                log::warn!("Shape '{}' references unknown route '{route_gtfs_id}'", shape.shape_id);
                return;
            };
            self.route_cache.insert(route_gtfs_id.clone(), route);
        }
        let route = self
            .route_cache
            .get_mut(route_gtfs_id)
            .expect("route was just cached");

        let fingerprint = shape.fingerprint();
        match route
            .route_path
            .iter_mut()
            .find(|variant| variant.hash == fingerprint)
        {
            Some(variant) => variant.full_gtfs_ids.push(shape.shape_id),
            None => route.route_path.push(shape.into_variant()),
        }
    }

    /// writes every buffered route's path back to the store and drops the
    /// cache.
    pub fn flush(&mut self) {
        if self.route_cache.is_empty() {
            return;
        }
        let updates = self
            .route_cache
            .drain()
            .map(|(route_gtfs_id, route)| RoutePathUpdate {
                route_gtfs_id,
                route_path: route.route_path,
            })
            .collect();
        self.store.bulk_set_route_paths(updates);
    }
}

#[cfg(test)]
mod test {
    use super::ShapeLoader;
    use crate::mode::TransitMode;
    use crate::reader::CsvRowReader;
    use crate::route::MergedRoute;
    use crate::store::{MemoryDatabase, RouteCollection};
    use std::collections::{BTreeMap, HashMap};
    use std::io::Cursor;

    fn test_route(route_gtfs_id: &str) -> MergedRoute {
        MergedRoute {
            route_gtfs_id: route_gtfs_id.to_string(),
            mode: TransitMode::MetroTrain,
            route_name: "Alamein".to_string(),
            route_number: None,
            operators: vec!["Metro".to_string()],
            route_path: Vec::new(),
            directions: Vec::new(),
            ptv_directions: BTreeMap::new(),
        }
    }

    const SHAPES: &str = "\
shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled
2-ALM-vpt-1.1.R,-37.8,145.0,1,0
2-ALM-vpt-1.1.R,-37.81,145.02,2,2400
2-ALM-vpt-2.1.R,-37.8,145.0,1,0
2-ALM-vpt-2.1.R,-37.805,145.01,2,1200
2-ALM-vpt-2.1.R,-37.81,145.02,3,2400
2-ALM-vpt-3.1.R,-37.8,145.0,1,0
2-ALM-vpt-3.1.R,-37.82,145.04,2,4100
";

    #[test]
    fn test_duplicate_fingerprints_are_unioned() {
        let mut database = MemoryDatabase::new();
        database.insert_route(test_route("2-ALM"));

        let shape_id_map: HashMap<String, String> = [
            ("2-ALM-vpt-1.1.R", "2-ALM"),
            ("2-ALM-vpt-2.1.R", "2-ALM"),
            ("2-ALM-vpt-3.1.R", "2-ALM"),
        ]
        .into_iter()
        .map(|(shape, route)| (shape.to_string(), route.to_string()))
        .collect();

        let mut reader = CsvRowReader::from_reader(Cursor::new(SHAPES)).unwrap();
        let mut loader = ShapeLoader::new(&mut database);
        loader.load_shapes(&mut reader, &shape_id_map).unwrap();

        let (_, route) = database.find_route("2-ALM").unwrap();
        assert_eq!(route.route_path.len(), 2);

        let duplicated = route
            .route_path
            .iter()
            .find(|variant| variant.full_gtfs_ids.len() == 2)
            .expect("two shapes shared a fingerprint");
        assert!(duplicated
            .full_gtfs_ids
            .contains(&"2-ALM-vpt-1.1.R".to_string()));
        assert!(duplicated
            .full_gtfs_ids
            .contains(&"2-ALM-vpt-2.1.R".to_string()));
        // only the first-seen geometry is kept
        assert_eq!(duplicated.path.len(), 2);
    }

    #[test]
    fn test_shapes_for_dropped_trips_are_ignored() {
        let mut database = MemoryDatabase::new();
        database.insert_route(test_route("2-ALM"));

        let mut reader = CsvRowReader::from_reader(Cursor::new(SHAPES)).unwrap();
        let mut loader = ShapeLoader::new(&mut database);
        loader.load_shapes(&mut reader, &HashMap::new()).unwrap();

        let (_, route) = database.find_route("2-ALM").unwrap();
        assert!(route.route_path.is_empty());
    }
}
