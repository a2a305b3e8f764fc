use dispatch_quote::{PricingModel, RateCard, ScoreWeights, ScoringEngine};
use dispatch_routing::{DistanceCache, Geocoder, RouteResolver, RoutingConfig};
use dispatch_shared::{Candidate, Decision, DecisionMeta, Offer, Warehouse};
use std::sync::Arc;
use tracing::{info, warn};

use crate::registry::WarehouseRegistry;
use crate::sla::{ServiceLimitAssessor, SlaAssessor};
use crate::store::DispatchStore;

/// Orchestrates one offer through
/// VALIDATING -> RESOLVING_CANDIDATES -> SCORING -> RESERVING -> DECIDED.
///
/// The outcome is always a well-formed `Decision`; provider failures,
/// capacity races and persistence errors all degrade internally and never
/// surface as faults. There is no await point between a successful hold and
/// the decision being built, so a cancelled caller cannot leak capacity.
pub struct DispatchCoordinator {
    store: Arc<dyn DispatchStore>,
    registry: WarehouseRegistry,
    resolver: RouteResolver,
    geocoder: Option<Geocoder>,
    pricing: PricingModel,
    scoring: ScoringEngine,
    sla: Arc<dyn SlaAssessor>,
}

impl DispatchCoordinator {
    /// Compose the engine around one explicitly owned store.
    pub fn new<S: DispatchStore + 'static>(store: Arc<S>, routing: &RoutingConfig, rates: RateCard, weights: ScoreWeights) -> Self {
        let cache: Arc<dyn DistanceCache> = store.clone();
        let store: Arc<dyn DispatchStore> = store;
        Self {
            registry: WarehouseRegistry::new(store.clone()),
            store,
            resolver: RouteResolver::new(cache, routing),
            geocoder: None,
            pricing: PricingModel::new(rates),
            scoring: ScoringEngine::new(weights),
            sla: Arc::new(ServiceLimitAssessor),
        }
    }

    /// Enable address origins. Without a geocoder, offers that carry only an
    /// address are rejected as invalid.
    pub fn with_geocoder(mut self, geocoder: Geocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_sla_assessor(mut self, assessor: Arc<dyn SlaAssessor>) -> Self {
        self.sla = assessor;
        self
    }

    pub async fn decide(&self, offer: &Offer) -> Decision {
        // VALIDATING
        let origin = match self.validate(offer).await {
            Ok(origin) => origin,
            Err(reason) => {
                info!(offer_id = %offer.offer_id, reason, "offer rejected during validation");
                let decision = Decision::rejected(offer, "invalid_offer", vec![]);
                self.persist_audit(offer, &decision);
                return decision;
            }
        };

        // RESOLVING_CANDIDATES
        let warehouses = match self.registry.list_active().await {
            Ok(warehouses) => warehouses,
            Err(e) => {
                warn!(offer_id = %offer.offer_id, error = %e, "could not list warehouses");
                Vec::new()
            }
        };

        let mut candidates = Vec::with_capacity(warehouses.len());
        for warehouse in &warehouses {
            candidates.push(self.build_candidate(offer, warehouse, origin).await);
        }

        // SCORING
        let ranked = self.scoring.rank(candidates, Some(offer));

        // RESERVING: strictly sequential, in ranked order, stop at first
        // success so the offer never holds capacity in two warehouses.
        for candidate in &ranked {
            if let Some(reservation) = self
                .registry
                .try_hold(&candidate.warehouse_id, &offer.offer_id, offer.volume_cbm)
                .await
            {
                info!(
                    offer_id = %offer.offer_id,
                    warehouse_id = %candidate.warehouse_id,
                    reservation = %reservation,
                    price = candidate.price_amount,
                    "offer accepted"
                );
                let decision = Decision::accepted(
                    offer,
                    candidate.warehouse_id.clone(),
                    reservation,
                    candidate.price_amount,
                    ranked.clone(),
                );
                self.persist_audit(offer, &decision);
                return decision;
            }
        }

        // DECIDED: every candidate refused the hold (or there were none).
        info!(offer_id = %offer.offer_id, candidates = ranked.len(), "offer rejected, no capacity");
        let decision = Decision::rejected(offer, "no_capacity", ranked);
        self.persist_audit(offer, &decision);
        decision
    }

    async fn validate(&self, offer: &Offer) -> Result<(f64, f64), &'static str> {
        if offer.volume_cbm <= 0.0 {
            return Err("non-positive volume");
        }
        if offer.duration_days == 0 {
            return Err("non-positive duration");
        }
        if let Some(coords) = offer.origin_coords() {
            return Ok(coords);
        }
        let Some(address) = offer.origin_address.as_deref() else {
            return Err("no origin");
        };
        let Some(geocoder) = &self.geocoder else {
            return Err("address origin without geocoder");
        };
        match geocoder.resolve(address).await {
            Ok(coords) => Ok(coords),
            Err(e) => {
                warn!(offer_id = %offer.offer_id, error = %e, "origin geocoding failed");
                Err("unresolvable origin")
            }
        }
    }

    async fn build_candidate(&self, offer: &Offer, warehouse: &Warehouse, origin: (f64, f64)) -> Candidate {
        let route = self.resolver.resolve(origin, warehouse.location()).await;
        let utilization = warehouse.utilization();
        let quote = self.pricing.quote(offer.volume_cbm, offer.duration_days, route.km, utilization);
        let sla_fit = self.sla.sla_fit(offer, warehouse, &route);

        Candidate {
            warehouse_id: warehouse.warehouse_id.clone(),
            route,
            available_cbm: warehouse.available_cbm(),
            price_amount: quote.price_amount,
            margin: quote.margin,
            utilization,
            sla_fit,
            cost: Some(quote.cost),
            profit: quote.profit,
            distance_score: 0.0,
            price_score: 0.0,
            profit_score: 0.0,
            util_score: 0.0,
            sla_score: 0.0,
            availability_score: 0.0,
            score: 0.0,
        }
    }

    /// Fire-and-forget audit write; never blocks or fails the decision.
    fn persist_audit(&self, offer: &Offer, decision: &Decision) {
        let store = self.store.clone();
        let offer = offer.clone();
        let decision = decision.clone();
        let meta = DecisionMeta::now("dispatch-core");
        tokio::spawn(async move {
            if let Err(e) = store.save_decision(&offer, &decision, &meta).await {
                warn!(offer_id = %offer.offer_id, error = %e, "decision audit write failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{DecisionRecord, StoreError};
    use async_trait::async_trait;
    use dispatch_routing::cache::CacheError;
    use dispatch_shared::{RouteInfo, WarehouseStatus};

    fn warehouse(id: &str, lat: f64, lng: f64, capacity: f64, used: f64) -> Warehouse {
        Warehouse {
            warehouse_id: id.to_string(),
            name: format!("Bangkok {}", id),
            lat,
            lng,
            capacity_cbm: capacity,
            used_cbm: used,
            service_limit: 200.0,
            status: WarehouseStatus::Active,
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(vec![
                warehouse("W1", 13.649, 100.647, 10000.0, 2000.0),
                warehouse("W2", 13.651, 100.637, 15000.0, 2200.0),
                warehouse("W3", 13.655, 100.634, 10000.0, 1500.0),
            ])
            .await;
        store
    }

    fn coordinator(store: Arc<MemoryStore>) -> DispatchCoordinator {
        DispatchCoordinator::new(store, &RoutingConfig::default(), RateCard::default(), ScoreWeights::default())
    }

    fn offer(volume: f64, duration: u32) -> Offer {
        Offer::new("C1", (13.65, 100.64), volume, "2026-09-01", duration)
    }

    #[tokio::test]
    async fn rejects_non_positive_volume() {
        let coordinator = coordinator(seeded_store().await);
        let decision = coordinator.decide(&offer(0.0, 3)).await;
        assert!(!decision.accept);
        assert_eq!(decision.reason, "invalid_offer");
        assert!(decision.candidates.is_empty());
    }

    #[tokio::test]
    async fn rejects_zero_duration() {
        let coordinator = coordinator(seeded_store().await);
        let decision = coordinator.decide(&offer(10.0, 0)).await;
        assert!(!decision.accept);
        assert_eq!(decision.reason, "invalid_offer");
    }

    #[tokio::test]
    async fn rejects_address_origin_without_geocoder() {
        let coordinator = coordinator(seeded_store().await);
        let mut shipment = offer(10.0, 3);
        shipment.origin_lat = None;
        shipment.origin_lng = None;
        shipment.origin_address = Some("99 Rama IX Rd".to_string());

        let decision = coordinator.decide(&shipment).await;
        assert!(!decision.accept);
        assert_eq!(decision.reason, "invalid_offer");
    }

    #[tokio::test]
    async fn accepts_and_reserves_top_candidate() {
        let store = seeded_store().await;
        let coordinator = coordinator(store.clone());

        let shipment = offer(500.0, 3);
        let decision = coordinator.decide(&shipment).await;

        assert!(decision.accept);
        assert_eq!(decision.reason, "ok");
        assert_eq!(decision.candidates.len(), 3);

        let chosen_id = decision.chosen_warehouse.clone().unwrap();
        assert_eq!(chosen_id, decision.candidates[0].warehouse_id);
        assert_eq!(decision.priced_amount, Some(decision.candidates[0].price_amount));

        let expected_prefix: String = shipment.offer_id.chars().take(8).collect();
        assert_eq!(
            decision.reservation_id.as_deref(),
            Some(format!("RESV-{}-{}", expected_prefix, chosen_id).as_str())
        );

        // the hold really landed
        let held = store.warehouse(&chosen_id).await.unwrap();
        let seeded_used = match chosen_id.as_str() {
            "W1" => 2000.0,
            "W2" => 2200.0,
            _ => 1500.0,
        };
        assert_eq!(held.used_cbm, seeded_used + 500.0);
    }

    #[tokio::test]
    async fn rejects_when_no_candidate_has_room() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(vec![
                warehouse("W1", 13.649, 100.647, 1000.0, 950.0),
                warehouse("W2", 13.651, 100.637, 1000.0, 990.0),
            ])
            .await;
        let coordinator = coordinator(store.clone());

        let decision = coordinator.decide(&offer(500.0, 3)).await;
        assert!(!decision.accept);
        assert_eq!(decision.reason, "no_capacity");
        assert!(decision.chosen_warehouse.is_none());
        assert!(decision.reservation_id.is_none());
        assert_eq!(decision.candidates.len(), 2);

        // nothing was mutated
        assert_eq!(store.warehouse("W1").await.unwrap().used_cbm, 950.0);
        assert_eq!(store.warehouse("W2").await.unwrap().used_cbm, 990.0);
    }

    /// Store wrapper that refuses the first hold attempt, simulating a
    /// race lost after the snapshot was taken.
    struct LosingRace {
        inner: Arc<MemoryStore>,
        refused_once: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl DistanceCache for LosingRace {
        async fn get_route(&self, key: &str) -> Result<Option<RouteInfo>, CacheError> {
            self.inner.get_route(key).await
        }

        async fn put_route(
            &self,
            key: &str,
            endpoints: ((f64, f64), (f64, f64)),
            km: f64,
            minutes: f64,
            ttl_seconds: u64,
        ) -> Result<(), CacheError> {
            self.inner.put_route(key, endpoints, km, minutes, ttl_seconds).await
        }
    }

    #[async_trait]
    impl DispatchStore for LosingRace {
        async fn list_active_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
            self.inner.list_active_warehouses().await
        }

        async fn try_hold_capacity(&self, warehouse_id: &str, offer_id: &str, volume_cbm: f64) -> Result<Option<String>, StoreError> {
            if !self.refused_once.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.try_hold_capacity(warehouse_id, offer_id, volume_cbm).await
        }

        async fn release_capacity(&self, warehouse_id: &str, volume_cbm: f64) -> Result<bool, StoreError> {
            self.inner.release_capacity(warehouse_id, volume_cbm).await
        }

        async fn save_decision(&self, offer: &Offer, decision: &Decision, meta: &DecisionMeta) -> Result<(), StoreError> {
            self.inner.save_decision(offer, decision, meta).await
        }

        async fn recent_decisions(&self, days: u32) -> Result<Vec<DecisionRecord>, StoreError> {
            self.inner.recent_decisions(days).await
        }
    }

    #[tokio::test]
    async fn cascades_to_next_ranked_candidate_on_lost_race() {
        let inner = seeded_store().await;
        let coordinator = DispatchCoordinator::new(
            Arc::new(LosingRace {
                inner: inner.clone(),
                refused_once: std::sync::atomic::AtomicBool::new(false),
            }),
            &RoutingConfig::default(),
            RateCard::default(),
            ScoreWeights::default(),
        );

        let decision = coordinator.decide(&offer(500.0, 3)).await;
        assert!(decision.accept);

        // the top-ranked candidate lost its race; the next one got the hold
        let chosen = decision.chosen_warehouse.unwrap();
        assert_ne!(chosen, decision.candidates[0].warehouse_id);
        assert_eq!(chosen, decision.candidates[1].warehouse_id);

        // the fallback hold landed on the real store
        let held = inner.warehouse(&chosen).await.unwrap();
        let seeded_used = match chosen.as_str() {
            "W1" => 2000.0,
            "W2" => 2200.0,
            _ => 1500.0,
        };
        assert_eq!(held.used_cbm, seeded_used + 500.0);
    }
}
