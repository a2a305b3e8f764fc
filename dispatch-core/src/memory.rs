use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dispatch_routing::cache::CacheError;
use dispatch_routing::DistanceCache;
use dispatch_shared::{Decision, DecisionMeta, Offer, RouteInfo, Warehouse};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::store::{reservation_id, DecisionRecord, DispatchStore, StoreError};

#[derive(Debug, Clone)]
struct CachedRoute {
    route: RouteInfo,
    expires_at: DateTime<Utc>,
}

/// In-memory store. The default composition target for tests and embedded
/// use; the SQLite store is the durable sibling.
///
/// Holds mutate `used_cbm` under a single write guard, which makes the
/// conditional update atomic with respect to concurrent holders.
#[derive(Default)]
pub struct MemoryStore {
    warehouses: RwLock<HashMap<String, Warehouse>>,
    routes: RwLock<HashMap<String, CachedRoute>>,
    decisions: RwLock<Vec<DecisionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, warehouses: Vec<Warehouse>) {
        let mut map = self.warehouses.write().await;
        for warehouse in warehouses {
            map.insert(warehouse.warehouse_id.clone(), warehouse);
        }
    }

    /// Current snapshot of one warehouse, mainly for assertions.
    pub async fn warehouse(&self, warehouse_id: &str) -> Option<Warehouse> {
        self.warehouses.read().await.get(warehouse_id).cloned()
    }
}

#[async_trait]
impl DistanceCache for MemoryStore {
    async fn get_route(&self, key: &str) -> Result<Option<RouteInfo>, CacheError> {
        let routes = self.routes.read().await;
        Ok(routes
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.route))
    }

    async fn put_route(
        &self,
        key: &str,
        _endpoints: ((f64, f64), (f64, f64)),
        km: f64,
        minutes: f64,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let mut routes = self.routes.write().await;
        routes.insert(
            key.to_string(),
            CachedRoute {
                route: RouteInfo { km, minutes },
                expires_at: Utc::now() + Duration::seconds(ttl_seconds as i64),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    async fn list_active_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let map = self.warehouses.read().await;
        let mut active: Vec<Warehouse> = map.values().filter(|w| w.is_active()).cloned().collect();
        active.sort_by(|a, b| a.warehouse_id.cmp(&b.warehouse_id));
        Ok(active)
    }

    async fn try_hold_capacity(&self, warehouse_id: &str, offer_id: &str, volume_cbm: f64) -> Result<Option<String>, StoreError> {
        let mut map = self.warehouses.write().await;
        let Some(warehouse) = map.get_mut(warehouse_id) else {
            return Ok(None);
        };
        if warehouse.used_cbm + volume_cbm > warehouse.capacity_cbm {
            return Ok(None);
        }
        warehouse.used_cbm += volume_cbm;
        info!(warehouse_id, volume_cbm, used_cbm = warehouse.used_cbm, "capacity held");
        Ok(Some(reservation_id(offer_id, warehouse_id)))
    }

    async fn release_capacity(&self, warehouse_id: &str, volume_cbm: f64) -> Result<bool, StoreError> {
        let mut map = self.warehouses.write().await;
        let Some(warehouse) = map.get_mut(warehouse_id) else {
            return Ok(false);
        };
        warehouse.used_cbm = (warehouse.used_cbm - volume_cbm).max(0.0);
        Ok(true)
    }

    async fn save_decision(&self, offer: &Offer, decision: &Decision, _meta: &DecisionMeta) -> Result<(), StoreError> {
        let mut decisions = self.decisions.write().await;
        decisions.push(DecisionRecord {
            ts: Utc::now().timestamp(),
            offer: offer.clone(),
            decision: decision.clone(),
        });
        Ok(())
    }

    async fn recent_decisions(&self, days: u32) -> Result<Vec<DecisionRecord>, StoreError> {
        let since = Utc::now().timestamp() - i64::from(days) * 24 * 3600;
        let decisions = self.decisions.read().await;
        Ok(decisions.iter().filter(|r| r.ts >= since).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_shared::WarehouseStatus;
    use std::sync::Arc;

    fn warehouse(id: &str, capacity: f64, used: f64, status: WarehouseStatus) -> Warehouse {
        Warehouse {
            warehouse_id: id.to_string(),
            name: format!("DC {}", id),
            lat: 13.649,
            lng: 100.647,
            capacity_cbm: capacity,
            used_cbm: used,
            service_limit: 200.0,
            status,
        }
    }

    #[tokio::test]
    async fn lists_only_active_warehouses() {
        let store = MemoryStore::new();
        store
            .seed(vec![
                warehouse("W1", 10000.0, 2000.0, WarehouseStatus::Active),
                warehouse("W2", 15000.0, 2200.0, WarehouseStatus::Inactive),
            ])
            .await;

        let active = store.list_active_warehouses().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].warehouse_id, "W1");
    }

    #[tokio::test]
    async fn hold_succeeds_within_capacity() {
        let store = MemoryStore::new();
        store.seed(vec![warehouse("W1", 10000.0, 2000.0, WarehouseStatus::Active)]).await;

        let reservation = store.try_hold_capacity("W1", "OFFER-001", 500.0).await.unwrap();
        assert_eq!(reservation.as_deref(), Some("RESV-OFFER-00-W1"));
        assert_eq!(store.warehouse("W1").await.unwrap().used_cbm, 2500.0);
    }

    #[tokio::test]
    async fn hold_fails_beyond_capacity_without_mutation() {
        let store = MemoryStore::new();
        store.seed(vec![warehouse("W1", 10000.0, 2000.0, WarehouseStatus::Active)]).await;

        let reservation = store.try_hold_capacity("W1", "OFFER-002", 9000.0).await.unwrap();
        assert!(reservation.is_none());
        assert_eq!(store.warehouse("W1").await.unwrap().used_cbm, 2000.0);
    }

    #[tokio::test]
    async fn hold_on_unknown_warehouse_is_a_miss() {
        let store = MemoryStore::new();
        assert!(store.try_hold_capacity("W9", "OFFER-003", 1.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_holds_never_overallocate() {
        let store = Arc::new(MemoryStore::new());
        store.seed(vec![warehouse("W1", 1000.0, 0.0, WarehouseStatus::Active)]).await;

        // 10 offers of 150 cbm against 1000 cbm: at most 6 can fit.
        let mut tasks = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .try_hold_capacity("W1", &format!("OFFER-{:03}", i), 150.0)
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 6);
        let snapshot = store.warehouse("W1").await.unwrap();
        assert_eq!(snapshot.used_cbm, 900.0);
        assert!(snapshot.used_cbm <= snapshot.capacity_cbm);
    }

    #[tokio::test]
    async fn release_floors_at_zero() {
        let store = MemoryStore::new();
        store.seed(vec![warehouse("W1", 1000.0, 100.0, WarehouseStatus::Active)]).await;

        assert!(store.release_capacity("W1", 400.0).await.unwrap());
        assert_eq!(store.warehouse("W1").await.unwrap().used_cbm, 0.0);
        assert!(!store.release_capacity("W9", 1.0).await.unwrap());
    }

    #[tokio::test]
    async fn cache_entry_expires_passively() {
        let store = MemoryStore::new();
        let endpoints = ((13.649, 100.647), (13.651, 100.637));

        store.put_route("k", endpoints, 5.0, 8.0, 3600).await.unwrap();
        let hit = store.get_route("k").await.unwrap().unwrap();
        assert_eq!((hit.km, hit.minutes), (5.0, 8.0));

        // ttl of zero expires as soon as any time passes
        store.put_route("k", endpoints, 6.0, 9.0, 0).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(store.get_route("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let store = MemoryStore::new();
        let endpoints = ((13.649, 100.647), (13.651, 100.637));

        store.put_route("k", endpoints, 5.0, 8.0, 3600).await.unwrap();
        store.put_route("k", endpoints, 7.0, 11.0, 3600).await.unwrap();
        let hit = store.get_route("k").await.unwrap().unwrap();
        assert_eq!((hit.km, hit.minutes), (7.0, 11.0));
    }
}
