use std::collections::{BTreeMap, HashMap};

use crate::calendar::{CalendarException, ServiceCalendar};
use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::reader::{read_trip_group, RowReader, TripGroup};
use crate::route::MergedRoute;
use crate::stop::MergedStop;
use crate::store::{RouteCollection, StopCollection, TimetableCollection};
use crate::timetable::feed_trip::FeedTrip;
use crate::timetable::time_ops;
use crate::timetable::timetable::{StopConditions, StopTiming, Timetable};

/// timetable documents are flushed to the store, and the read caches
/// dropped, every this many trips to bound memory.
pub const TRIP_FLUSH_SIZE: usize = 5000;

/// suffix of the folded rail replacement route identity, e.g. `2-RRB`.
const RAIL_REPLACEMENT_ROUTE_SUFFIX: &str = "-RRB";

/// the feed readers one trip-loading pass consumes.
pub struct TripFeedReaders<'a> {
    pub calendar: &'a mut dyn RowReader,
    pub calendar_dates: Option<&'a mut dyn RowReader>,
    pub trips: &'a mut dyn RowReader,
    pub stop_times: &'a mut dyn RowReader,
}

/// caller configuration for one trip-loading pass.
#[derive(Default)]
pub struct TripLoaderOptions<'a> {
    /// may rewrite a built timetable or veto it (None drops the trip)
    pub process_trip: Option<&'a mut dyn FnMut(Timetable) -> Option<Timetable>>,
    /// invoked with the running trip count at every flush
    pub on_flush: Option<&'a mut dyn FnMut(usize)>,
}

/// route and stop read caches, dropped at every flush point. explicit so a
/// pass can never leak lookups across ingestion runs.
#[derive(Default)]
struct ReadCaches {
    routes: HashMap<String, Option<MergedRoute>>,
    stops: HashMap<String, Option<MergedStop>>,
}

impl ReadCaches {
    fn clear(&mut self) {
        self.routes.clear();
        self.stops.clear();
    }
}

/// builds one timetable document per trip by joining trips, stop-times and
/// calendars against the pass-1 stop/route stores, streaming stop-times
/// grouped by trip under bounded memory.
pub struct TripLoader<'a, S>
where
    S: StopCollection + RouteCollection + TimetableCollection,
{
    store: &'a mut S,
    mode: TransitMode,
    calendars: HashMap<String, ServiceCalendar>,
    trips: HashMap<String, FeedTrip>,
    shape_id_map: HashMap<String, String>,
    direction_map: HashMap<String, BTreeMap<String, u8>>,
    caches: ReadCaches,
}

impl<'a, S> TripLoader<'a, S>
where
    S: StopCollection + RouteCollection + TimetableCollection,
{
    pub fn new(store: &'a mut S, mode: TransitMode) -> TripLoader<'a, S> {
        TripLoader {
            store,
            mode,
            calendars: HashMap::new(),
            trips: HashMap::new(),
            shape_id_map: HashMap::new(),
            direction_map: HashMap::new(),
            caches: ReadCaches::default(),
        }
    }

    /// runs the full pass: calendars and trips into memory, then one
    /// streaming pass over the grouped stop-times.
    pub fn load_trips(
        &mut self,
        readers: TripFeedReaders,
        route_id_map: &HashMap<String, String>,
        mut options: TripLoaderOptions,
    ) -> Result<(), IngestError> {
        self.load_calendars(readers.calendar, readers.calendar_dates)?;
        self.load_trip_details(readers.trips, route_id_map)?;
        self.load_stop_times(readers.stop_times, &mut options)
    }

    /// reads calendar.txt and applies calendar_dates.txt exceptions.
    pub fn load_calendars(
        &mut self,
        calendar_reader: &mut dyn RowReader,
        calendar_dates_reader: Option<&mut dyn RowReader>,
    ) -> Result<(), IngestError> {
        let mut exceptions: HashMap<String, Vec<CalendarException>> = HashMap::new();
        if let Some(reader) = calendar_dates_reader {
            while reader.available() {
                let record = reader.next_row()?;
                match CalendarException::from_record(&record) {
                    Ok(exception) => exceptions
                        .entry(exception.calendar_id.clone())
                        .or_default()
                        .push(exception),
                    Err(e) => log::warn!("Skipping unreadable calendar exception: {e}"),
                }
            }
        }

        while calendar_reader.available() {
            let record = calendar_reader.next_row()?;
            match ServiceCalendar::from_record(&record) {
                Ok(mut calendar) => {
                    if let Some(list) = exceptions.remove(&calendar.id) {
                        // an id mismatch here is a caller bug and propagates
                        calendar.apply_exceptions(&list)?;
                    }
                    self.calendars.insert(calendar.id.clone(), calendar);
                }
                Err(e) => log::warn!("Skipping unreadable calendar: {e}"),
            }
        }

        for calendar_id in exceptions.keys() {
            log::warn!("Calendar exceptions reference unknown calendar '{calendar_id}'");
        }
        Ok(())
    }

    /// reads trips.txt into memory, resolving each trip's route through the
    /// route loader's identity map and its calendar through the calendar
    /// map.
    pub fn load_trip_details(
        &mut self,
        trips_reader: &mut dyn RowReader,
        route_id_map: &HashMap<String, String>,
    ) -> Result<(), IngestError> {
        while trips_reader.available() {
            let record = trips_reader.next_row()?;
            match FeedTrip::from_record(&record, self.mode, &self.calendars, route_id_map) {
                Ok(trip) => {
                    self.trips.insert(trip.trip_id.clone(), trip);
                }
                Err(e) => log::warn!("Skipping unresolvable trip: {e}"),
            }
        }
        Ok(())
    }

    /// streams stop_times.txt grouped by trip, emitting one timetable per
    /// trip and flushing every [`TRIP_FLUSH_SIZE`] trips.
    pub fn load_stop_times(
        &mut self,
        stop_times_reader: &mut dyn RowReader,
        options: &mut TripLoaderOptions,
    ) -> Result<(), IngestError> {
        let mut batch: Vec<Timetable> = Vec::new();
        let mut trips_loaded = 0usize;
        let mut total_loaded = 0usize;

        while let Some(group) = read_trip_group(stop_times_reader, "trip_id")? {
            let timetable = match self.build_timetable(&group) {
                Ok(Some(timetable)) => timetable,
                // the trip or its route was dropped upstream
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping trip '{}': {e}", group.group_id);
                    continue;
                }
            };

            let processed = match options.process_trip.as_deref_mut() {
                Some(hook) => match hook(timetable) {
                    Some(processed) => processed,
                    None => continue,
                },
                None => timetable,
            };

            self.shape_id_map.insert(
                processed.shape_id.clone(),
                processed.route_gtfs_id.clone(),
            );
            if let Some(headsign) = &processed.headsign {
                self.direction_map
                    .entry(processed.route_gtfs_id.clone())
                    .or_default()
                    .entry(headsign.clone())
                    .or_insert(processed.gtfs_direction);
            }

            batch.push(processed);
            trips_loaded += 1;
            total_loaded += 1;

            if trips_loaded == TRIP_FLUSH_SIZE {
                self.store.insert_timetables(std::mem::take(&mut batch));
                self.caches.clear();
                trips_loaded = 0;
                if let Some(on_flush) = options.on_flush.as_deref_mut() {
                    on_flush(total_loaded);
                }
            }
        }

        if !batch.is_empty() {
            self.store.insert_timetables(batch);
        }
        Ok(())
    }

    /// joins one trip's grouped stop-time rows into a timetable document.
    /// returns None for trips dropped upstream; an unresolvable stop is an
    /// error for just this trip.
    fn build_timetable(&mut self, group: &TripGroup) -> Result<Option<Timetable>, IngestError> {
        // a trip present in stop-times but absent from trips was dropped
        // upstream of us
        let Some(trip) = self.trips.get(&group.group_id).cloned() else {
            return Ok(None);
        };
        // None: the route was vetoed during route loading
        let Some(route_gtfs_id) = trip.route_gtfs_id.clone() else {
            return Ok(None);
        };
        let route = match self.cached_route(&route_gtfs_id) {
            Some(route) => route,
            None => return Ok(None),
        };

        let mut timings: Vec<StopTiming> = Vec::with_capacity(group.rows.len());
        for row in &group.rows {
            let stop_gtfs_id = row.get("stop_id")?.to_string();
            // collapse consecutive duplicate stop ids
            if timings
                .last()
                .is_some_and(|timing| timing.stop_gtfs_id == stop_gtfs_id)
            {
                continue;
            }

            let stop = self.cached_stop(&stop_gtfs_id).ok_or_else(|| {
                IngestError::UnmatchedStopError {
                    trip_id: trip.trip_id.clone(),
                    stop_gtfs_id: stop_gtfs_id.clone(),
                }
            })?;
            let bay = stop
                .bays
                .iter()
                .find(|bay| bay.mode == self.mode && bay.stop_gtfs_id == stop_gtfs_id)
                .ok_or_else(|| IngestError::UnmatchedStopError {
                    trip_id: trip.trip_id.clone(),
                    stop_gtfs_id: stop_gtfs_id.clone(),
                })?;

            let arrival_minutes = row
                .get_opt("arrival_time")
                .map(time_ops::feed_time_to_minutes)
                .transpose()?;
            let departure_minutes = row
                .get_opt("departure_time")
                .map(time_ops::feed_time_to_minutes)
                .transpose()?;

            timings.push(StopTiming {
                stop_gtfs_id,
                stop_name: bay.full_stop_name.clone(),
                stop_number: bay.stop_number.clone(),
                suburb: bay.suburb.clone(),
                platform: bay.platform.clone(),
                arrival_time: arrival_minutes.map(time_ops::minutes_to_hhmm),
                arrival_time_minutes: arrival_minutes,
                departure_time: departure_minutes.map(time_ops::minutes_to_hhmm),
                departure_time_minutes: departure_minutes,
                stop_conditions: StopConditions {
                    pickup: row
                        .get_opt("pickup_type")
                        .and_then(|value| value.parse().ok())
                        .unwrap_or(0),
                    dropoff: row
                        .get_opt("drop_off_type")
                        .and_then(|value| value.parse().ok())
                        .unwrap_or(0),
                },
                stop_distance: row
                    .get_opt("shape_dist_traveled")
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(0.0),
            });
        }

        if timings.is_empty() {
            return Ok(None);
        }

        let is_rail_replacement_bus = trip.identity.is_rail_replacement
            || route_gtfs_id.ends_with(RAIL_REPLACEMENT_ROUTE_SUFFIX);
        if is_rail_replacement_bus && self.mode.is_rail() {
            for timing in &mut timings {
                timing.platform = Some("RRB".to_string());
            }
        }

        // the first stop is boarding-only and the last alighting-only by
        // definition, whatever the raw feed says
        let first = timings.first_mut().expect("timings are non-empty");
        first.arrival_time = None;
        first.arrival_time_minutes = None;
        first.stop_conditions.dropoff = 1;
        let origin = first.stop_name.clone();
        let departure_time = first.departure_time.clone().unwrap_or_default();

        let last = timings.last_mut().expect("timings are non-empty");
        let destination_arrival_time = last.arrival_time.clone().unwrap_or_default();
        last.departure_time = None;
        last.departure_time_minutes = None;
        last.stop_conditions.pickup = 1;
        let destination = last.stop_name.clone();

        Ok(Some(Timetable {
            mode: self.mode,
            route_gtfs_id,
            route_name: route.route_name.clone(),
            route_number: route.route_number.clone(),
            calendar_id: trip.calendar_id.clone(),
            trip_id: trip.trip_id.clone(),
            shape_id: trip.shape_id.clone(),
            operation_days: trip.operation_days.clone(),
            block: trip.block.clone(),
            gtfs_direction: trip.gtfs_direction,
            headsign: trip.headsign.clone(),
            run_id: trip.identity.run_id.clone(),
            direction: trip
                .identity
                .direction
                .map(|direction| direction.as_str().to_string()),
            is_rail_replacement_bus,
            origin,
            departure_time,
            destination,
            destination_arrival_time,
            stop_timings: timings,
        }))
    }

    fn cached_route(&mut self, route_gtfs_id: &str) -> Option<MergedRoute> {
        if let Some(cached) = self.caches.routes.get(route_gtfs_id) {
            return cached.clone();
        }
        let route = self
            .store
            .find_route(route_gtfs_id)
            .map(|(_, route)| route);
        self.caches
            .routes
            .insert(route_gtfs_id.to_string(), route.clone());
        route
    }

    fn cached_stop(&mut self, stop_gtfs_id: &str) -> Option<MergedStop> {
        if let Some(cached) = self.caches.stops.get(stop_gtfs_id) {
            return cached.clone();
        }
        let stop = self
            .store
            .find_stop_by_bay(self.mode, stop_gtfs_id)
            .map(|(_, stop)| stop);
        self.caches
            .stops
            .insert(stop_gtfs_id.to_string(), stop.clone());
        stop
    }

    /// the shape-id to route map accumulated while loading, consumed by the
    /// shape pass.
    pub fn shape_id_map(&self) -> &HashMap<String, String> {
        &self.shape_id_map
    }

    /// per-route headsign to direction-number map, consumed by the topology
    /// pass.
    pub fn direction_map(&self) -> &HashMap<String, BTreeMap<String, u8>> {
        &self.direction_map
    }
}
