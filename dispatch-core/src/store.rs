use async_trait::async_trait;
use dispatch_routing::DistanceCache;
use dispatch_shared::{Decision, DecisionMeta, Offer, Warehouse};
use serde::{Deserialize, Serialize};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Deterministic reservation identifier for a successful hold.
pub fn reservation_id(offer_id: &str, warehouse_id: &str) -> String {
    let prefix: String = offer_id.chars().take(8).collect();
    format!("RESV-{}-{}", prefix, warehouse_id)
}

/// A persisted decision run, replayed for KPI aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// unix seconds
    pub ts: i64,
    pub offer: Offer,
    pub decision: Decision,
}

/// Backend-agnostic store interface, selected once at composition time and
/// passed by reference into the coordinator. Also serves the route cache
/// through the `DistanceCache` supertrait.
#[async_trait]
pub trait DispatchStore: DistanceCache {
    /// Warehouses eligible as candidates; the status filter is applied at
    /// the store.
    async fn list_active_warehouses(&self) -> Result<Vec<Warehouse>, StoreError>;

    /// Atomic conditional hold: succeeds only if `used + volume <= capacity`
    /// at the instant of mutation. `Ok(None)` (race lost, insufficient room,
    /// unknown warehouse) is a normal outcome.
    async fn try_hold_capacity(&self, warehouse_id: &str, offer_id: &str, volume_cbm: f64) -> Result<Option<String>, StoreError>;

    /// Unconditional release, used for cancellation and compensation.
    /// Floors at zero so the capacity invariant cannot be violated.
    async fn release_capacity(&self, warehouse_id: &str, volume_cbm: f64) -> Result<bool, StoreError>;

    /// Fire-and-forget audit sink; callers swallow failures.
    async fn save_decision(&self, offer: &Offer, decision: &Decision, meta: &DecisionMeta) -> Result<(), StoreError>;

    async fn recent_decisions(&self, days: u32) -> Result<Vec<DecisionRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_id_takes_offer_prefix() {
        assert_eq!(reservation_id("OFF-2024-0042", "W1"), "RESV-OFF-2024-W1");
        // short ids are used whole
        assert_eq!(reservation_id("X1", "W3"), "RESV-X1-W3");
    }
}
