mod merged_route;
mod route_loader;

pub use merged_route::MergedRoute;
pub use route_loader::{read_operators, RouteLoader, UNKNOWN_OPERATOR};
