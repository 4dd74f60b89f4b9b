use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::store::{RouteCollection, RouteDirectionsUpdate, TimetableCollection};
use crate::timetable::Timetable;
use crate::topology::consensus::{merge_sequences, TopologyStop};
use crate::topology::DirectionTopology;

/// the progress callback fires every this many routes.
pub const ROUTE_MILESTONE_INTERVAL: usize = 25;

/// stop names suggesting an ad-hoc school terminus rather than a real
/// destination; such directions are renamed by majority vote instead.
const SCHOOL_TERMINUS_MARKERS: [&str; 2] = ["School", "College"];

/// direction names containing either marker are citybound on the metro
/// network.
const CITY_TERMINUS_MARKERS: [&str; 2] = ["Flinders Street", "Town Hall"];

/// caller configuration for the topology pass.
#[derive(Default)]
pub struct RouteStopsOptions {
    /// invoked with (processed, total) every [`ROUTE_MILESTONE_INTERVAL`]
    /// routes
    pub on_milestone: Option<Box<dyn FnMut(usize, usize) + Send>>,
}

/// reduces every route's observed trip stop-sequences to one canonical
/// branch-aware ordering per direction, names each direction, and writes
/// the results back in one bulk update.
///
/// routes are processed concurrently; the store is only read during the
/// fan-out and written once at the end.
pub fn set_route_stops<S>(
    store: &mut S,
    direction_map: &HashMap<String, BTreeMap<String, u8>>,
    mut options: RouteStopsOptions,
) -> Result<(), IngestError>
where
    S: RouteCollection + TimetableCollection + Sync,
{
    let route_ids = store.distinct_route_ids();
    let total = route_ids.len();
    let processed = AtomicUsize::new(0);
    let on_milestone = Mutex::new(options.on_milestone.take());

    let reader: &S = store;
    let updates: Vec<RouteDirectionsUpdate> = route_ids
        .par_iter()
        .filter_map(|route_gtfs_id| {
            let update = build_route_directions(reader, route_gtfs_id, direction_map);
            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            if done % ROUTE_MILESTONE_INTERVAL == 0 {
                if let Ok(mut guard) = on_milestone.lock() {
                    if let Some(callback) = guard.as_mut() {
                        callback(done, total);
                    }
                }
            }
            update
        })
        .collect();

    store.bulk_set_route_directions(updates);
    Ok(())
}

/// merges and names both directions of one route.
fn build_route_directions<S>(
    store: &S,
    route_gtfs_id: &str,
    direction_map: &HashMap<String, BTreeMap<String, u8>>,
) -> Option<RouteDirectionsUpdate>
where
    S: RouteCollection + TimetableCollection + Sync,
{
    let (_, route) = store.find_route(route_gtfs_id)?;

    // one representative timetable per shape variant, bucketed by direction
    let mut sequences_by_direction: [Vec<Vec<TopologyStop>>; 2] = [Vec::new(), Vec::new()];
    for variant in &route.route_path {
        let Some(shape_id) = variant.full_gtfs_ids.first() else {
            continue;
        };
        let Some(timetable) = store.find_timetable_by_shape(route_gtfs_id, shape_id) else {
            log::info!("No timetable match for shape '{shape_id}' on route '{route_gtfs_id}'");
            continue;
        };
        let direction = timetable.gtfs_direction as usize;
        if direction < sequences_by_direction.len() {
            sequences_by_direction[direction].push(sequence_of(&timetable));
        }
    }

    let mut directions: Vec<DirectionTopology> = Vec::new();
    for (gtfs_direction, sequences) in sequences_by_direction.iter().enumerate() {
        if sequences.is_empty() {
            continue;
        }
        let stops = merge_sequences(sequences);
        let gtfs_direction = gtfs_direction as u8;

        let last_stop_name = match stops.last() {
            Some(stop) => stop.stop_name.clone(),
            None => continue,
        };
        let mut direction_name = last_stop_name;
        if SCHOOL_TERMINUS_MARKERS
            .iter()
            .any(|marker| direction_name.contains(marker))
        {
            // a school terminus is an artifact of one or two trips a day;
            // label the direction by where most trips actually run
            let destinations = store.destinations_by_frequency(route_gtfs_id, gtfs_direction);
            if let Some(most_common) = destinations.first() {
                direction_name = most_common.clone();
            }
        }

        let mut train_direction = None;
        if route.mode == TransitMode::MetroTrain {
            let (named, is_up) = name_metro_direction(&route.route_name, &direction_name, &stops);
            direction_name = named;
            train_direction = Some(if is_up { "Up" } else { "Down" }.to_string());
        }

        directions.push(DirectionTopology {
            direction_name,
            gtfs_direction,
            stops,
            train_direction,
        });
    }

    if directions.is_empty() {
        return None;
    }
    Some(RouteDirectionsUpdate {
        route_gtfs_id: route_gtfs_id.to_string(),
        directions,
        ptv_directions: direction_map
            .get(route_gtfs_id)
            .cloned()
            .unwrap_or_default(),
    })
}

fn sequence_of(timetable: &Timetable) -> Vec<TopologyStop> {
    timetable
        .stop_timings
        .iter()
        .map(|timing| TopologyStop {
            stop_name: timing.stop_name.clone(),
            stop_gtfs_id: timing.stop_gtfs_id.clone(),
            stop_number: timing.stop_number.clone(),
            suburb: Some(timing.suburb.clone()),
        })
        .collect()
}

/// the metro naming heuristics: citybound directions read "City", loop and
/// stub lines are special-cased.
fn name_metro_direction(
    route_name: &str,
    direction_name: &str,
    stops: &[TopologyStop],
) -> (String, bool) {
    let mut is_up = CITY_TERMINUS_MARKERS
        .iter()
        .any(|marker| direction_name.contains(marker));

    match route_name {
        // the Stony Point stub never reaches the city; Frankston-bound
        // trips are its Up workings and keep the bare terminus name
        "Stony Point" => {
            is_up = direction_name.contains("Frankston");
            let stripped = direction_name
                .strip_suffix(" Railway Station")
                .unwrap_or(direction_name);
            (stripped.to_string(), is_up)
        }
        // both loop directions are Down; the second stop tells the
        // running direction apart
        "City Circle" => {
            let clockwise = stops
                .get(1)
                .is_some_and(|stop| stop.stop_name == "Southern Cross Railway Station");
            let qualifier = if clockwise { "Clockwise" } else { "Anti-Clockwise" };
            (format!("City Circle ({qualifier})"), false)
        }
        _ => {
            let name = if is_up { "City".to_string() } else { route_name.to_string() };
            (name, is_up)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{set_route_stops, RouteStopsOptions};
    use crate::mode::TransitMode;
    use crate::route::MergedRoute;
    use crate::shape::ShapeVariant;
    use crate::store::{MemoryDatabase, RouteCollection, TimetableCollection};
    use crate::timetable::{StopConditions, StopTiming, Timetable};
    use std::collections::{BTreeMap, HashMap};

    fn timing(name: &str, id: &str) -> StopTiming {
        StopTiming {
            stop_gtfs_id: id.to_string(),
            stop_name: name.to_string(),
            stop_number: None,
            suburb: "Melbourne".to_string(),
            platform: None,
            arrival_time: None,
            arrival_time_minutes: None,
            departure_time: None,
            departure_time_minutes: None,
            stop_conditions: StopConditions { pickup: 0, dropoff: 0 },
            stop_distance: 0.0,
        }
    }

    fn timetable(
        route_gtfs_id: &str,
        shape_id: &str,
        gtfs_direction: u8,
        stops: &[(&str, &str)],
    ) -> Timetable {
        let stop_timings: Vec<StopTiming> =
            stops.iter().map(|(name, id)| timing(name, id)).collect();
        let destination = stop_timings.last().map(|t| t.stop_name.clone()).unwrap();
        let origin = stop_timings.first().map(|t| t.stop_name.clone()).unwrap();
        Timetable {
            mode: TransitMode::MetroTrain,
            route_gtfs_id: route_gtfs_id.to_string(),
            route_name: String::new(),
            route_number: None,
            calendar_id: "T1".to_string(),
            trip_id: format!("{shape_id}-trip"),
            shape_id: shape_id.to_string(),
            operation_days: vec!["20241122".to_string()],
            block: None,
            gtfs_direction,
            headsign: Some(destination.clone()),
            run_id: None,
            direction: None,
            is_rail_replacement_bus: false,
            origin,
            departure_time: "05:00".to_string(),
            destination,
            destination_arrival_time: "06:00".to_string(),
            stop_timings,
        }
    }

    fn route(route_gtfs_id: &str, route_name: &str, shape_ids: &[&str]) -> MergedRoute {
        MergedRoute {
            route_gtfs_id: route_gtfs_id.to_string(),
            mode: TransitMode::MetroTrain,
            route_name: route_name.to_string(),
            route_number: None,
            operators: vec!["Metro".to_string()],
            route_path: shape_ids
                .iter()
                .map(|shape_id| ShapeVariant {
                    full_gtfs_ids: vec![shape_id.to_string()],
                    hash: shape_id.to_string(),
                    length: 0.0,
                    path: Vec::new(),
                })
                .collect(),
            directions: Vec::new(),
            ptv_directions: BTreeMap::new(),
        }
    }

    const UP_STOPS: [(&str, &str); 4] = [
        ("Pakenham Railway Station", "P1"),
        ("Officer Railway Station", "P2"),
        ("Southern Cross Railway Station", "P3"),
        ("Flinders Street Railway Station", "P4"),
    ];
    const DOWN_STOPS: [(&str, &str); 4] = [
        ("Flinders Street Railway Station", "P4"),
        ("Southern Cross Railway Station", "P3"),
        ("Officer Railway Station", "P2"),
        ("Pakenham Railway Station", "P1"),
    ];

    #[test]
    fn test_metro_up_trips_are_citybound() {
        let mut database = MemoryDatabase::new();
        database.insert_route(route("2-PKM", "Pakenham", &["up.1", "down.1"]));
        database.insert_timetables(vec![
            timetable("2-PKM", "up.1", 1, &UP_STOPS),
            timetable("2-PKM", "down.1", 0, &DOWN_STOPS),
        ]);

        set_route_stops(&mut database, &HashMap::new(), RouteStopsOptions::default()).unwrap();

        let (_, route) = database.find_route("2-PKM").unwrap();
        assert_eq!(route.directions.len(), 2);

        let city = route
            .directions
            .iter()
            .find(|direction| direction.direction_name == "City")
            .expect("an up direction named City");
        assert_eq!(city.train_direction.as_deref(), Some("Up"));
        assert_eq!(city.stops[0].stop_name, "Pakenham Railway Station");
        assert_eq!(
            city.stops.last().unwrap().stop_name,
            "Flinders Street Railway Station"
        );

        let down = route
            .directions
            .iter()
            .find(|direction| direction.direction_name == "Pakenham")
            .expect("a down direction named after the route");
        assert_eq!(down.train_direction.as_deref(), Some("Down"));
        assert_eq!(
            down.stops.last().unwrap().stop_name,
            "Pakenham Railway Station"
        );
    }

    #[test]
    fn test_stony_point_keeps_bare_terminus_names() {
        let mut database = MemoryDatabase::new();
        database.insert_route(route("2-STY", "Stony Point", &["up.1", "down.1"]));
        let to_frankston = [
            ("Stony Point Railway Station", "S1"),
            ("Hastings Railway Station", "S2"),
            ("Frankston Railway Station", "S3"),
        ];
        let to_stony_point = [
            ("Frankston Railway Station", "S3"),
            ("Hastings Railway Station", "S2"),
            ("Stony Point Railway Station", "S1"),
        ];
        database.insert_timetables(vec![
            timetable("2-STY", "up.1", 1, &to_frankston),
            timetable("2-STY", "down.1", 0, &to_stony_point),
        ]);

        let direction_map = HashMap::from([(
            "2-STY".to_string(),
            BTreeMap::from([
                ("Stony Point".to_string(), 0u8),
                ("Frankston".to_string(), 1u8),
            ]),
        )]);
        set_route_stops(&mut database, &direction_map, RouteStopsOptions::default()).unwrap();

        let (_, route) = database.find_route("2-STY").unwrap();
        let frankston = route
            .directions
            .iter()
            .find(|direction| direction.direction_name == "Frankston")
            .expect("the up direction");
        assert_eq!(frankston.train_direction.as_deref(), Some("Up"));

        let stony_point = route
            .directions
            .iter()
            .find(|direction| direction.direction_name == "Stony Point")
            .expect("the down direction");
        assert_eq!(stony_point.train_direction.as_deref(), Some("Down"));

        assert_eq!(route.ptv_directions.get("Stony Point"), Some(&0));
        assert_eq!(route.ptv_directions.get("Frankston"), Some(&1));
    }

    #[test]
    fn test_city_circle_is_labelled_by_running_direction() {
        let mut database = MemoryDatabase::new();
        database.insert_route(route("2-CCL", "City Circle", &["loop.1"]));
        let loop_stops = [
            ("Flinders Street Railway Station", "C1"),
            ("Southern Cross Railway Station", "C2"),
            ("Flagstaff Railway Station", "C3"),
            ("Melbourne Central Railway Station", "C4"),
            ("Parliament Railway Station", "C5"),
            ("Flinders Street Railway Station", "C1"),
        ];
        database.insert_timetables(vec![timetable("2-CCL", "loop.1", 0, &loop_stops)]);

        set_route_stops(&mut database, &HashMap::new(), RouteStopsOptions::default()).unwrap();

        let (_, route) = database.find_route("2-CCL").unwrap();
        assert_eq!(route.directions.len(), 1);
        assert_eq!(
            route.directions[0].direction_name,
            "City Circle (Clockwise)"
        );
        assert_eq!(route.directions[0].train_direction.as_deref(), Some("Down"));
    }

    #[test]
    fn test_school_terminus_directions_use_the_majority_destination() {
        let mut database = MemoryDatabase::new();
        database.insert_route(route("2-BEL", "Belgrave", &["a.1", "b.1", "c.1"]));
        let to_college = [
            ("Flinders Street Railway Station", "B1"),
            ("Ringwood Railway Station", "B2"),
            ("Mountain District College", "B9"),
        ];
        let to_belgrave = [
            ("Flinders Street Railway Station", "B1"),
            ("Ringwood Railway Station", "B2"),
            ("Belgrave Railway Station", "B3"),
        ];
        database.insert_timetables(vec![
            timetable("2-BEL", "a.1", 0, &to_college),
            timetable("2-BEL", "b.1", 0, &to_belgrave),
            timetable("2-BEL", "c.1", 0, &to_belgrave),
        ]);

        set_route_stops(&mut database, &HashMap::new(), RouteStopsOptions::default()).unwrap();

        let (_, route) = database.find_route("2-BEL").unwrap();
        assert_eq!(route.directions.len(), 1);
        // whichever variant ends the merged ordering, most trips terminate
        // at Belgrave
        assert_eq!(route.directions[0].direction_name, "Belgrave");
    }

    #[test]
    fn test_milestone_callback_fires() {
        let mut database = MemoryDatabase::new();
        for index in 0..30 {
            let route_gtfs_id = format!("2-R{index:02}");
            database.insert_route(route(&route_gtfs_id, "Test", &["s.1"]));
            database.insert_timetables(vec![timetable(&route_gtfs_id, "s.1", 0, &DOWN_STOPS)]);
        }

        let milestones = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = milestones.clone();
        let options = RouteStopsOptions {
            on_milestone: Some(Box::new(move |done, total| {
                sink.lock().unwrap().push((done, total));
            })),
        };
        set_route_stops(&mut database, &HashMap::new(), options).unwrap();

        assert_eq!(*milestones.lock().unwrap(), vec![(25, 30)]);
    }
}
