//! per-stop service indexing: which route+direction combinations serve each
//! bay, and the boarding-permitted subset shown on departure screens.

use serde::{Deserialize, Serialize};

use crate::ingest_error::IngestError;
use crate::store::{StopCollection, TimetableCollection};

/// one route+direction combination serving a bay. the derive order gives
/// the stable route-then-direction sort the documents are stored in.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    #[serde(rename = "routeGTFSID")]
    pub route_gtfs_id: String,
    pub gtfs_direction: u8,
    pub route_number: Option<String>,
}

/// aggregates, for every bay of every merged stop, the distinct services
/// calling there and the pickup-permitted "screen services". both lists
/// replace the bay's prior value wholesale, so re-running the pass is
/// idempotent.
pub fn set_stop_services<S>(store: &mut S) -> Result<(), IngestError>
where
    S: StopCollection + TimetableCollection,
{
    for stop_id in store.stop_ids() {
        let Some(mut stop) = store.get_stop(stop_id) else {
            continue;
        };
        for bay in &mut stop.bays {
            bay.services = store.services_at_bay(bay.mode, &bay.stop_gtfs_id, false);
            bay.screen_services = store.services_at_bay(bay.mode, &bay.stop_gtfs_id, true);
        }
        store.replace_stop(stop_id, stop);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{set_stop_services, ServiceRef};
    use crate::mode::TransitMode;
    use crate::store::{MemoryDatabase, StopCollection};
    use crate::timetable::fixtures::load_alamein_fixture;

    #[test]
    fn test_indexes_services_and_screen_services_per_bay() {
        let mut database = MemoryDatabase::new();
        load_alamein_fixture(&mut database);
        set_stop_services(&mut database).unwrap();

        let (_, alamein) = database
            .find_stop_by_bay(TransitMode::MetroTrain, "vic:rail:ALM")
            .unwrap();
        let bay = alamein
            .bays
            .iter()
            .find(|bay| bay.stop_gtfs_id == "vic:rail:ALM")
            .unwrap();

        assert_eq!(
            bay.services,
            vec![
                ServiceRef {
                    route_gtfs_id: "2-ALM".to_string(),
                    gtfs_direction: 0,
                    route_number: None,
                },
                ServiceRef {
                    route_gtfs_id: "2-ALM".to_string(),
                    gtfs_direction: 1,
                    route_number: None,
                },
            ]
        );
        // only the departing trips permit boarding here; arriving trips end
        // alighting-only
        assert_eq!(
            bay.screen_services,
            vec![ServiceRef {
                route_gtfs_id: "2-ALM".to_string(),
                gtfs_direction: 1,
                route_number: None,
            }]
        );
    }

    #[test]
    fn test_rerunning_the_pass_is_idempotent() {
        let mut database = MemoryDatabase::new();
        load_alamein_fixture(&mut database);
        set_stop_services(&mut database).unwrap();

        let (_, before) = database
            .find_stop_by_bay(TransitMode::MetroTrain, "vic:rail:ALM")
            .unwrap();
        set_stop_services(&mut database).unwrap();
        let (_, after) = database
            .find_stop_by_bay(TransitMode::MetroTrain, "vic:rail:ALM")
            .unwrap();
        assert_eq!(before, after);
    }
}
