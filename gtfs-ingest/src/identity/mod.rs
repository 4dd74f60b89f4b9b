//! ordered chains of format recognizers that normalize the raw route and
//! trip identifiers used across feed-export generations. dispatch is
//! first-predicate-wins over an explicit, tested constant; a universal
//! fallback always terminates each chain.

mod route_identity;
mod trip_identity;

pub use route_identity::{
    resolve_route_identity, RouteIdContext, RouteIdKind, RouteIdentity, ROUTE_RECOGNIZERS,
};
pub use trip_identity::{
    resolve_trip_identity, RailDirection, TripIdentity, TRIP_RECOGNIZERS,
};
