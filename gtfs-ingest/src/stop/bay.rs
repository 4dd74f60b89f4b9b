use geo::Point;
use serde::{Deserialize, Serialize};

use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::reader::RawRecord;
use crate::services::ServiceRef;
use crate::stop::name_ops;
use crate::suburb::SuburbBoundaries;

/// the feed's location_type values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    Stop,
    Station,
    Entrance,
    Generic,
    Boarding,
}

impl StopType {
    pub fn from_feed_value(value: Option<&str>) -> StopType {
        match value {
            Some("1") => StopType::Station,
            Some("2") => StopType::Entrance,
            Some("3") => StopType::Generic,
            Some("4") => StopType::Boarding,
            _ => StopType::Stop,
        }
    }

    /// entrances and generic sub-points never influence a merged stop's
    /// derived name or suburb list.
    pub fn is_station_like(&self) -> bool {
        matches!(self, StopType::Stop | StopType::Station)
    }
}

/// an optional caller hook that decides a bay's suburb before the name and
/// polygon lookups run.
pub type SuburbHook<'a> = &'a dyn Fn(&RawRecord) -> Option<String>;

/// one physical stop location from the feed, owned by exactly one merged
/// stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bay {
    #[serde(rename = "stopGTFSID")]
    pub stop_gtfs_id: String,
    pub mode: TransitMode,
    pub original_name: String,
    pub full_stop_name: String,
    pub stop_number: Option<String>,
    pub suburb: String,
    pub location: Point<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(rename = "parentStopGTFSID")]
    pub parent_stop_gtfs_id: Option<String>,
    pub stop_type: StopType,
    pub services: Vec<ServiceRef>,
    pub screen_services: Vec<ServiceRef>,
}

impl Bay {
    /// canonicalizes one stops.txt row: name repair, suburb determination,
    /// stop number extraction and abbreviation expansion.
    pub fn resolve(
        record: &RawRecord,
        mode: TransitMode,
        suburbs: &SuburbBoundaries,
        suburb_hook: Option<SuburbHook>,
    ) -> Result<Bay, IngestError> {
        let stop_gtfs_id = record.get("stop_id")?.to_string();
        let latitude: f64 = record
            .get("stop_lat")?
            .parse()
            .map_err(|_| IngestError::InvalidDataError(format!(
                "stop '{stop_gtfs_id}' has a malformed latitude"
            )))?;
        let longitude: f64 = record
            .get("stop_lon")?
            .parse()
            .map_err(|_| IngestError::InvalidDataError(format!(
                "stop '{stop_gtfs_id}' has a malformed longitude"
            )))?;
        let location = Point::new(longitude, latitude);

        let sanitized = name_ops::sanitize_name(record.get("stop_name")?);
        let (base_name, suburb_in_name) = name_ops::strip_suburb(&sanitized);

        let suburb = suburb_hook
            .and_then(|hook| hook(record))
            .or(suburb_in_name)
            .unwrap_or_else(|| suburbs.suburb_of(&location).to_string());

        let (base_name, stop_number) = name_ops::extract_stop_number(&base_name);
        let full_stop_name = name_ops::expand_stop_name(&base_name);

        Ok(Bay {
            stop_gtfs_id,
            mode,
            original_name: sanitized,
            full_stop_name,
            stop_number,
            suburb,
            location,
            platform: record.get_opt("platform_code").map(str::to_string),
            parent_stop_gtfs_id: record.get_opt("parent_station").map(str::to_string),
            stop_type: StopType::from_feed_value(record.get_opt("location_type")),
            services: Vec::new(),
            screen_services: Vec::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Bay, StopType};
    use crate::mode::TransitMode;
    use crate::reader::RawRecord;
    use crate::suburb::{SuburbBoundaries, INTERSTATE_SUBURB};

    fn record(name: &str) -> RawRecord {
        RawRecord::from_pairs([
            ("stop_id", "1000"),
            ("stop_name", name),
            ("stop_lat", "-37.7007748061827"),
            ("stop_lon", "145.018951051008"),
        ])
    }

    #[test]
    fn test_resolves_a_suburbed_bus_stop() {
        let bay = Bay::resolve(
            &record("Dole Ave/Cheddar Rd (Reservoir)"),
            TransitMode::Bus,
            &SuburbBoundaries::empty(),
            None,
        )
        .unwrap();
        assert_eq!(bay.full_stop_name, "Dole Avenue/Cheddar Road");
        assert_eq!(bay.suburb, "Reservoir");
        assert_eq!(bay.stop_number, None);
        assert_eq!(bay.stop_type, StopType::Stop);
        assert_eq!(bay.location.x(), 145.018951051008);
    }

    #[test]
    fn test_resolves_a_numbered_tram_stop() {
        let bay = Bay::resolve(
            &record("Glen  Huntly Railway Station/Glen Huntly Rd #61 (Glen Huntly)"),
            TransitMode::Tram,
            &SuburbBoundaries::empty(),
            None,
        )
        .unwrap();
        assert_eq!(
            bay.full_stop_name,
            "Glen Huntly Railway Station/Glen Huntly Road"
        );
        assert_eq!(bay.stop_number.as_deref(), Some("61"));
        assert_eq!(
            bay.original_name,
            "Glen Huntly Railway Station/Glen Huntly Rd #61 (Glen Huntly)"
        );
    }

    #[test]
    fn test_suburbless_stop_falls_back_to_polygons() {
        let bay = Bay::resolve(
            &record("Moffat St/Main Rd West"),
            TransitMode::Bus,
            &SuburbBoundaries::empty(),
            None,
        )
        .unwrap();
        assert_eq!(bay.full_stop_name, "Moffat Street/Main Road West");
        assert_eq!(bay.suburb, INTERSTATE_SUBURB);
    }

    #[test]
    fn test_suburb_hook_wins() {
        let hook = crate::stop::fixed_suburb_hook("Override");
        let bay = Bay::resolve(
            &record("Moffat St/Main Rd West"),
            TransitMode::Bus,
            &SuburbBoundaries::empty(),
            Some(&hook),
        )
        .unwrap();
        assert_eq!(bay.suburb, "Override");
    }
}
