mod feed_trip;
pub mod time_ops;
mod timetable;
mod trip_loader;

pub use feed_trip::FeedTrip;
pub use timetable::{StopConditions, StopTiming, Timetable};
pub use trip_loader::{
    TripFeedReaders, TripLoader, TripLoaderOptions, TRIP_FLUSH_SIZE,
};

#[cfg(test)]
pub(crate) use trip_loader::test as fixtures;
