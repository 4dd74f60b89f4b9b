//! entity resolution and route topology reconstruction for periodically
//! published transit feeds.
//!
//! a feed bundle is ingested per mode in four passes:
//!
//! 1. raw stop and route rows stream through the identity resolvers into
//!    the merged stop/route stores ([`stop::StopLoader`],
//!    [`route::RouteLoader`])
//! 2. trips, calendars and stop-times join into one timetable document per
//!    trip ([`timetable::TripLoader`]), with shapes deduplicated per route
//!    ([`shape::ShapeLoader`])
//! 3. every route's observed stop sequences reduce to one canonical
//!    branch-aware ordering per direction ([`topology::set_route_stops`])
//! 4. every stop bay is indexed by the services calling there
//!    ([`services::set_stop_services`])
//!
//! the document store, suburb boundaries and row tokenizer are collaborator
//! boundaries ([`store`], [`suburb`], [`reader`]); an in-memory store ships
//! for tests and local runs.

pub mod calendar;
pub mod identity;
pub mod ingest_error;
pub mod mode;
pub mod reader;
pub mod route;
pub mod services;
pub mod shape;
pub mod stop;
pub mod store;
pub mod suburb;
pub mod timetable;
pub mod topology;
