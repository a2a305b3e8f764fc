use async_trait::async_trait;
use dispatch_shared::RouteInfo;

pub type CacheError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical cache key for an origin/destination pair, both endpoints
/// rounded to six decimal places (~0.1 m), so nearby lookups collide on
/// purpose.
pub fn cache_key(origin: (f64, f64), destination: (f64, f64)) -> String {
    format!(
        "{:.6},{:.6}|{:.6},{:.6}",
        origin.0, origin.1, destination.0, destination.1
    )
}

/// Key-value cache of resolved routes with passive expiry.
///
/// `get_route` treats an expired entry as absent; a miss is a normal
/// outcome, not a failure. `put_route` overwrites any entry for the key.
#[async_trait]
pub trait DistanceCache: Send + Sync {
    async fn get_route(&self, key: &str) -> Result<Option<RouteInfo>, CacheError>;

    async fn put_route(
        &self,
        key: &str,
        endpoints: ((f64, f64), (f64, f64)),
        km: f64,
        minutes: f64,
        ttl_seconds: u64,
    ) -> Result<(), CacheError>;
}
