use dispatch_shared::Warehouse;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{DispatchStore, StoreError};

/// Thin facade over the store's warehouse operations. All `used_cbm`
/// mutation goes through here; callers never read-then-write capacity
/// themselves.
#[derive(Clone)]
pub struct WarehouseRegistry {
    store: Arc<dyn DispatchStore>,
}

impl WarehouseRegistry {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    pub async fn list_active(&self) -> Result<Vec<Warehouse>, StoreError> {
        self.store.list_active_warehouses().await
    }

    /// Attempt an atomic capacity hold. A lost race, insufficient space or
    /// an unknown warehouse all come back as `None`; store failures are
    /// logged and treated the same way so a flaky backend degrades into
    /// "no hold" rather than a fault.
    pub async fn try_hold(&self, warehouse_id: &str, offer_id: &str, volume_cbm: f64) -> Option<String> {
        match self.store.try_hold_capacity(warehouse_id, offer_id, volume_cbm).await {
            Ok(Some(reservation)) => Some(reservation),
            Ok(None) => {
                debug!(warehouse_id, volume_cbm, "hold refused");
                None
            }
            Err(e) => {
                warn!(warehouse_id, error = %e, "hold attempt failed at store");
                None
            }
        }
    }

    /// Compensating release; idempotence is the caller's concern (only
    /// release holds that actually succeeded).
    pub async fn release(&self, warehouse_id: &str, volume_cbm: f64) -> bool {
        match self.store.release_capacity(warehouse_id, volume_cbm).await {
            Ok(released) => released,
            Err(e) => {
                warn!(warehouse_id, error = %e, "release failed at store");
                false
            }
        }
    }
}
