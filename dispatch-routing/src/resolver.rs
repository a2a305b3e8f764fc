use dispatch_shared::RouteInfo;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{cache_key, DistanceCache};
use crate::providers::{GoogleMaps, OpenRouteService, RouteProvider};

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Routing configuration. Every field has a default so the resolver works
/// offline out of the box.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Call real directions providers before falling back to haversine.
    pub use_real_routing: bool,
    /// Average road speed used to synthesize minutes for haversine routes.
    pub assumed_speed_kmh: f64,
    pub route_cache_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
    pub google_api_key: Option<String>,
    pub ors_api_key: Option<String>,
    pub region: String,
    pub language: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            use_real_routing: false,
            assumed_speed_kmh: 40.0,
            route_cache_ttl_seconds: 7 * 24 * 3600,
            http_timeout_seconds: 30,
            google_api_key: None,
            ors_api_key: None,
            region: "th".to_string(),
            language: "th".to_string(),
        }
    }
}

/// Great-circle distance in km.
pub fn haversine_km(origin: (f64, f64), destination: (f64, f64)) -> f64 {
    let (lat1, lng1) = origin;
    let (lat2, lng2) = destination;
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Resolves km/minutes between two coordinates. Never fails: cache hit,
/// then the ordered provider chain, then a deterministic haversine
/// estimate. Results are written back to the cache with a TTL.
pub struct RouteResolver {
    cache: Arc<dyn DistanceCache>,
    providers: Vec<Box<dyn RouteProvider>>,
    assumed_speed_kmh: f64,
    cache_ttl_seconds: u64,
}

impl RouteResolver {
    /// Build from configuration: providers are only constructed when real
    /// routing is enabled and the respective key is present, primary first.
    pub fn new(cache: Arc<dyn DistanceCache>, config: &RoutingConfig) -> Self {
        let mut providers: Vec<Box<dyn RouteProvider>> = Vec::new();
        if config.use_real_routing {
            if let Some(key) = &config.google_api_key {
                providers.push(Box::new(GoogleMaps::new(
                    key.clone(),
                    config.region.clone(),
                    config.language.clone(),
                    config.http_timeout_seconds,
                )));
            }
            if let Some(key) = &config.ors_api_key {
                providers.push(Box::new(OpenRouteService::new(
                    key.clone(),
                    config.language.clone(),
                    config.http_timeout_seconds,
                )));
            }
        }
        Self::with_providers(cache, providers, config)
    }

    pub fn with_providers(cache: Arc<dyn DistanceCache>, providers: Vec<Box<dyn RouteProvider>>, config: &RoutingConfig) -> Self {
        Self {
            cache,
            providers,
            assumed_speed_kmh: config.assumed_speed_kmh.max(1e-6),
            cache_ttl_seconds: config.route_cache_ttl_seconds,
        }
    }

    pub async fn resolve(&self, origin: (f64, f64), destination: (f64, f64)) -> RouteInfo {
        let key = cache_key(origin, destination);

        match self.cache.get_route(&key).await {
            Ok(Some(route)) => {
                debug!(%key, "route cache hit");
                return route;
            }
            Ok(None) => {}
            Err(e) => warn!(%key, error = %e, "route cache read failed"),
        }

        let route = self.resolve_uncached(origin, destination).await;

        // Cache writes are best-effort; a failure costs a redundant provider
        // call later, nothing more.
        if let Err(e) = self
            .cache
            .put_route(&key, (origin, destination), route.km, route.minutes, self.cache_ttl_seconds)
            .await
        {
            warn!(%key, error = %e, "route cache write failed");
        }

        route
    }

    async fn resolve_uncached(&self, origin: (f64, f64), destination: (f64, f64)) -> RouteInfo {
        for provider in &self.providers {
            match provider.route(origin, destination).await {
                Ok(route) => {
                    debug!(provider = provider.name(), km = route.km, "route resolved by provider");
                    return route;
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "route provider failed");
                }
            }
        }

        let km = haversine_km(origin, destination);
        RouteInfo {
            km,
            minutes: km / self.assumed_speed_kmh * 60.0,
        }
    }
}
