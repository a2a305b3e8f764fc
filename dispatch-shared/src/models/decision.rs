use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::offer::Offer;

/// Resolved road distance and drive time between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub km: f64,
    pub minutes: f64,
}

/// One warehouse evaluated against an offer.
///
/// Built fresh per decision. The pricing fields come from the quote, the
/// score fields are filled in by the scoring engine; `cost` stays `None`
/// until either the quote or the scoring pass supplies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub warehouse_id: String,
    pub route: RouteInfo,
    pub available_cbm: f64,
    pub price_amount: f64,
    pub margin: f64,
    pub utilization: f64,
    pub sla_fit: f64,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub distance_score: f64,
    #[serde(default)]
    pub price_score: f64,
    #[serde(default)]
    pub profit_score: f64,
    #[serde(default)]
    pub util_score: f64,
    #[serde(default)]
    pub sla_score: f64,
    #[serde(default)]
    pub availability_score: f64,
    #[serde(default)]
    pub score: f64,
}

/// The terminal outcome of a dispatch run. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub offer_id: String,
    pub accept: bool,
    pub chosen_warehouse: Option<String>,
    pub reason: String,
    pub candidates: Vec<Candidate>,
    pub priced_amount: Option<f64>,
    pub reservation_id: Option<String>,
}

impl Decision {
    pub fn rejected(offer: &Offer, reason: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            offer_id: offer.offer_id.clone(),
            accept: false,
            chosen_warehouse: None,
            reason: reason.into(),
            candidates,
            priced_amount: None,
            reservation_id: None,
        }
    }

    pub fn accepted(offer: &Offer, warehouse_id: impl Into<String>, reservation_id: impl Into<String>, priced_amount: f64, candidates: Vec<Candidate>) -> Self {
        Self {
            offer_id: offer.offer_id.clone(),
            accept: true,
            chosen_warehouse: Some(warehouse_id.into()),
            reason: "ok".to_string(),
            candidates,
            priced_amount: Some(priced_amount),
            reservation_id: Some(reservation_id.into()),
        }
    }
}

/// Audit metadata attached to a persisted decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMeta {
    pub decided_at: DateTime<Utc>,
    pub engine: String,
}

impl DecisionMeta {
    pub fn now(engine: impl Into<String>) -> Self {
        Self {
            decided_at: Utc::now(),
            engine: engine.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_serializes_with_contract_fields() {
        let offer = Offer::new("C1", (13.7, 100.5), 10.0, "2026-09-01", 3);
        let decision = Decision::rejected(&offer, "no_capacity", vec![]);
        let value = serde_json::to_value(&decision).unwrap();

        for field in [
            "offer_id",
            "accept",
            "chosen_warehouse",
            "reason",
            "candidates",
            "priced_amount",
            "reservation_id",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(value["accept"], serde_json::json!(false));
        assert!(value["chosen_warehouse"].is_null());
    }
}
