use std::collections::HashMap;

use crate::ingest_error::IngestError;
use crate::mode::TransitMode;
use crate::reader::{RawRecord, RowReader};
use crate::stop::bay::{Bay, SuburbHook};
use crate::stop::merged_stop::MergedStop;
use crate::stop::name_ops;
use crate::store::StopCollection;
use crate::suburb::SuburbBoundaries;

/// two bays sharing a merge name further apart than this are different
/// places and must not merge.
pub const MERGE_RADIUS_METERS: f64 = 500.0;

/// caller configuration for one stop-loading pass.
#[derive(Default)]
pub struct StopLoaderOptions<'a> {
    /// decides a bay's suburb ahead of the name and polygon lookups
    pub suburb_hook: Option<SuburbHook<'a>>,
    /// overrides the computed merge name for individual bays
    pub merge_name_override: Option<&'a dyn Fn(&Bay) -> Option<String>>,
    /// names that always merge by full name, never by primary component
    pub force_full_name: &'a [&'a str],
}

/// streams raw stop rows into the merged-stop store: canonicalize, match by
/// merge name within the proximity radius, and append or create. bays that
/// declare a not-yet-seen parent are buffered and drained once the parent
/// itself loads.
pub struct StopLoader<'a, S: StopCollection> {
    store: &'a mut S,
    mode: TransitMode,
    pending_children: HashMap<String, Vec<Bay>>,
}

impl<'a, S: StopCollection> StopLoader<'a, S> {
    pub fn new(store: &'a mut S, mode: TransitMode) -> StopLoader<'a, S> {
        StopLoader {
            store,
            mode,
            pending_children: HashMap::new(),
        }
    }

    pub fn load_stops(
        &mut self,
        reader: &mut dyn RowReader,
        suburbs: &SuburbBoundaries,
        options: &StopLoaderOptions,
    ) -> Result<(), IngestError> {
        while reader.available() {
            let record = reader.next_row()?;
            match Bay::resolve(&record, self.mode, suburbs, options.suburb_hook) {
                Ok(bay) => self.load_bay(bay, options)?,
                // a bad row never aborts the pass
                Err(e) => log::warn!("Skipping unresolvable stop record: {e}"),
            }
        }
        self.resolve_orphaned_children(options)?;
        Ok(())
    }

    /// merges one canonicalized bay into the store.
    pub fn load_bay(&mut self, bay: Bay, options: &StopLoaderOptions) -> Result<(), IngestError> {
        if let Some(parent_id) = bay.parent_stop_gtfs_id.clone() {
            // children merge into the stop owning their parent bay. parents
            // are not guaranteed to precede children in feed order, so an
            // unmatched child waits until the parent is processed.
            if let Some((id, mut stop)) = self.store.find_stop_by_bay(self.mode, &parent_id) {
                stop.add_bay(bay);
                self.store.replace_stop(id, stop);
            } else {
                self.pending_children.entry(parent_id).or_default().push(bay);
            }
            return Ok(());
        }

        let merge_name = self.merge_name_for(&bay, options);
        let stop_gtfs_id = bay.stop_gtfs_id.clone();
        match self
            .store
            .find_stop_near(&merge_name, &bay.location, MERGE_RADIUS_METERS)
        {
            Some((id, mut stop)) => {
                stop.add_bay(bay);
                self.store.replace_stop(id, stop);
            }
            None => {
                self.store.insert_stop(MergedStop::new(bay, merge_name));
            }
        }

        self.drain_pending_children(&stop_gtfs_id)?;
        Ok(())
    }

    fn merge_name_for(&self, bay: &Bay, options: &StopLoaderOptions) -> String {
        if let Some(hook) = options.merge_name_override {
            if let Some(name) = hook(bay) {
                return name;
            }
        }
        if options
            .force_full_name
            .contains(&bay.full_stop_name.as_str())
        {
            return bay.full_stop_name.clone();
        }
        name_ops::merge_name(&bay.full_stop_name).to_string()
    }

    /// folds every buffered child of a just-loaded parent into its stop in
    /// one pass.
    fn drain_pending_children(&mut self, parent_id: &str) -> Result<(), IngestError> {
        let Some(children) = self.pending_children.remove(parent_id) else {
            return Ok(());
        };
        let Some((id, mut stop)) = self.store.find_stop_by_bay(self.mode, parent_id) else {
            // the parent bay merged away underneath us, a caller bug
            return Err(IngestError::InvalidDataError(format!(
                "parent stop '{parent_id}' vanished while children were pending"
            )));
        };
        for child in children {
            stop.add_bay(child);
        }
        self.store.replace_stop(id, stop);
        Ok(())
    }

    /// a child whose declared parent never appears in the feed falls back
    /// to the ordinary merge-name path.
    fn resolve_orphaned_children(
        &mut self,
        options: &StopLoaderOptions,
    ) -> Result<(), IngestError> {
        let orphaned: Vec<(String, Vec<Bay>)> = self.pending_children.drain().collect();
        for (parent_id, children) in orphaned {
            for mut child in children {
                log::warn!(
                    "Stop '{}' references parent '{parent_id}' absent from the feed",
                    child.stop_gtfs_id
                );
                child.parent_stop_gtfs_id = None;
                self.load_bay(child, options)?;
            }
        }
        Ok(())
    }
}

/// parses the suburb-override column format some operators publish, e.g.
/// a fixed suburb for every rail replacement bay.
pub fn fixed_suburb_hook(suburb: &'static str) -> impl Fn(&RawRecord) -> Option<String> {
    move |_| Some(suburb.to_string())
}
