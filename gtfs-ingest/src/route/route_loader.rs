use std::collections::{BTreeMap, HashMap};

use crate::identity::{resolve_route_identity, RouteIdContext, RouteIdKind};
use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::reader::{RawRecord, RowReader};
use crate::route::MergedRoute;
use crate::stop::name_ops;
use crate::store::RouteCollection;

/// sentinel operator for routes whose agency is missing from the feed.
pub const UNKNOWN_OPERATOR: &str = "Unknown Operator";

/// reads agency.txt into an agency-id to operator-name map.
pub fn read_operators(
    reader: &mut dyn RowReader,
) -> Result<HashMap<String, String>, IngestError> {
    let mut operators = HashMap::new();
    while reader.available() {
        let record = reader.next_row()?;
        operators.insert(
            record.get("agency_id")?.to_string(),
            record.get("agency_name")?.to_string(),
        );
    }
    Ok(operators)
}

/// streams raw route rows into the merged-route store, normalizing each
/// identity via the recognizer chain and unioning operators into existing
/// aggregates. also maintains the original-to-final identity map trips
/// resolve through.
pub struct RouteLoader<'a, S: RouteCollection> {
    store: &'a mut S,
    mode: TransitMode,
    route_id_map: HashMap<String, String>,
}

impl<'a, S: RouteCollection> RouteLoader<'a, S> {
    pub fn new(store: &'a mut S, mode: TransitMode) -> RouteLoader<'a, S> {
        RouteLoader {
            store,
            mode,
            route_id_map: HashMap::new(),
        }
    }

    pub fn load_routes(
        &mut self,
        reader: &mut dyn RowReader,
        operators: &HashMap<String, String>,
        mut process_route: Option<&mut dyn FnMut(MergedRoute) -> Option<MergedRoute>>,
    ) -> Result<(), IngestError> {
        while reader.available() {
            let record = reader.next_row()?;
            match self.load_route(&record, operators, process_route.as_deref_mut()) {
                Ok(()) => {}
                // a bad row never aborts the pass
                Err(e) => log::warn!("Skipping unresolvable route record: {e}"),
            }
        }
        Ok(())
    }

    /// resolves and persists one routes.txt row. the caller-supplied hook
    /// may veto the route (returning None drops it) or rewrite its identity
    /// (folding several raw variants into one target route).
    pub fn load_route<'f>(
        &mut self,
        record: &RawRecord,
        operators: &HashMap<String, String>,
        process_route: Option<&mut (dyn FnMut(MergedRoute) -> Option<MergedRoute> + 'f)>,
    ) -> Result<(), IngestError> {
        let raw_route_id = record.get("route_id")?.to_string();
        let route_number = record.get_opt("route_short_name").map(str::to_string);
        let identity = resolve_route_identity(
            &raw_route_id,
            &RouteIdContext {
                mode: self.mode,
                route_number: route_number.as_deref(),
            },
        )?;

        let route_name = record
            .get_opt("route_long_name")
            .map(name_ops::collapse_whitespace);
        let operator = record
            .get_opt("agency_id")
            .and_then(|agency_id| operators.get(agency_id))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_OPERATOR.to_string());

        // rail lines publish the line name through the route-number field;
        // promote it and discard the number
        let (route_name, route_number) = if identity.kind == RouteIdKind::RailLine {
            (route_number.or(route_name).unwrap_or_default(), None)
        } else {
            (route_name.unwrap_or_default(), route_number)
        };

        let mut route = MergedRoute {
            route_gtfs_id: identity.route_gtfs_id,
            mode: self.mode,
            route_name,
            route_number,
            operators: vec![operator],
            route_path: Vec::new(),
            directions: Vec::new(),
            ptv_directions: BTreeMap::new(),
        };

        if let Some(hook) = process_route {
            match hook(route) {
                Some(processed) => route = processed,
                // vetoed: the raw id stays unmapped so its trips drop out
                None => return Ok(()),
            }
        }

        self.route_id_map
            .insert(raw_route_id, route.route_gtfs_id.clone());

        match self.store.find_route(&route.route_gtfs_id) {
            Some((id, mut existing)) => {
                for operator in &route.operators {
                    existing.add_operator(operator);
                }
                self.store.replace_route(id, existing);
            }
            None => {
                route.operators.sort();
                route.operators.dedup();
                self.store.insert_route(route);
            }
        }
        Ok(())
    }

    /// the original raw identifier to final normalized identity map,
    /// consumed by the trip loader.
    pub fn route_id_map(&self) -> &HashMap<String, String> {
        &self.route_id_map
    }

    pub fn into_route_id_map(self) -> HashMap<String, String> {
        self.route_id_map
    }
}
