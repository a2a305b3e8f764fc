pub mod cache;
pub mod geocode;
pub mod providers;
pub mod resolver;

pub use cache::{cache_key, DistanceCache};
pub use geocode::{GeocodeError, Geocoder};
pub use providers::{GeocodeProvider, ProviderError, RouteProvider};
pub use resolver::{haversine_km, RouteResolver, RoutingConfig};
