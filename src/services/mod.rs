// Service exports
pub mod catalog;
pub mod distances;
pub mod geocoding;
pub mod routing;

pub use catalog::{Catalog, CatalogError};
pub use distances::{DistanceResolver, ResolverOptions};
pub use geocoding::{Geocoder, GeocodingError};
pub use routing::{RoutingClient, RoutingError, WalkingRoute};
