mod bay;
mod merged_stop;
pub mod name_ops;
mod stop_loader;

pub use bay::{Bay, StopType, SuburbHook};
pub use merged_stop::MergedStop;
pub use stop_loader::{
    fixed_suburb_hook, StopLoader, StopLoaderOptions, MERGE_RADIUS_METERS,
};
