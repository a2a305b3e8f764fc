use dispatch_shared::{Offer, RouteInfo, Warehouse};

/// Supplies the externally computed `sla_fit` term in [0, 1].
pub trait SlaAssessor: Send + Sync {
    fn sla_fit(&self, offer: &Offer, warehouse: &Warehouse, route: &RouteInfo) -> f64;
}

/// Default assessor: a route within the warehouse's service-time limit fits
/// perfectly; beyond it the fit decays as limit/minutes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceLimitAssessor;

impl SlaAssessor for ServiceLimitAssessor {
    fn sla_fit(&self, _offer: &Offer, warehouse: &Warehouse, route: &RouteInfo) -> f64 {
        if route.minutes <= 0.0 || warehouse.service_limit <= 0.0 {
            return 1.0;
        }
        if route.minutes <= warehouse.service_limit {
            1.0
        } else {
            (warehouse.service_limit / route.minutes).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_shared::WarehouseStatus;

    fn warehouse(limit: f64) -> Warehouse {
        Warehouse {
            warehouse_id: "W1".to_string(),
            name: "DC".to_string(),
            lat: 0.0,
            lng: 0.0,
            capacity_cbm: 1000.0,
            used_cbm: 0.0,
            service_limit: limit,
            status: WarehouseStatus::Active,
        }
    }

    #[test]
    fn within_limit_is_perfect_fit() {
        let assessor = ServiceLimitAssessor;
        let offer = Offer::new("C1", (0.0, 0.0), 10.0, "2026-09-01", 1);
        let fit = assessor.sla_fit(&offer, &warehouse(200.0), &RouteInfo { km: 10.0, minutes: 45.0 });
        assert_eq!(fit, 1.0);
    }

    #[test]
    fn beyond_limit_decays() {
        let assessor = ServiceLimitAssessor;
        let offer = Offer::new("C1", (0.0, 0.0), 10.0, "2026-09-01", 1);
        let fit = assessor.sla_fit(&offer, &warehouse(180.0), &RouteInfo { km: 300.0, minutes: 360.0 });
        assert_eq!(fit, 0.5);
    }
}
