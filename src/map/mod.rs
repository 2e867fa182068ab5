//! Static map graph: locations, territories, adjacency

pub mod loader;
pub mod location;
pub mod model;

pub use loader::{load_map, load_map_str, MapError, STANDARD_MAP};
pub use location::Location;
pub use model::MapModel;
