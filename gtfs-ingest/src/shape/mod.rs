mod shape_loader;
mod shape_variant;

pub use shape_loader::{ShapeLoader, SHAPE_FLUSH_SIZE};
pub use shape_variant::{FeedShape, ShapeVariant};
