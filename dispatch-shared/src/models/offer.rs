use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service-level constraints attached to an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sla {
    pub latest_dropoff_hour: u8,
    #[serde(default = "default_weekday_only")]
    pub weekday_only: bool,
}

fn default_weekday_only() -> bool {
    true
}

impl Default for Sla {
    fn default() -> Self {
        Self {
            latest_dropoff_hour: 17,
            weekday_only: true,
        }
    }
}

/// An inbound shipment offer. Immutable once handed to the coordinator.
///
/// The origin is either explicit coordinates or an address that still needs
/// geocoding; at least one of the two must resolve for the offer to be valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub origin_address: Option<String>,
    #[serde(default)]
    pub origin_lat: Option<f64>,
    #[serde(default)]
    pub origin_lng: Option<f64>,
    pub volume_cbm: f64,
    pub start_date: String,
    pub duration_days: u32,
    #[serde(default)]
    pub sla: Sla,
}

impl Offer {
    /// Create an offer with a generated id and an explicit origin.
    pub fn new(customer_id: impl Into<String>, origin: (f64, f64), volume_cbm: f64, start_date: impl Into<String>, duration_days: u32) -> Self {
        Self {
            offer_id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            origin_address: None,
            origin_lat: Some(origin.0),
            origin_lng: Some(origin.1),
            volume_cbm,
            start_date: start_date.into(),
            duration_days,
            sla: Sla::default(),
        }
    }

    /// Explicit origin coordinates, if the offer carries them.
    pub fn origin_coords(&self) -> Option<(f64, f64)> {
        match (self.origin_lat, self.origin_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_requires_both_coordinates() {
        let mut offer = Offer::new("C1", (13.7, 100.5), 10.0, "2026-09-01", 3);
        assert_eq!(offer.origin_coords(), Some((13.7, 100.5)));

        offer.origin_lng = None;
        assert_eq!(offer.origin_coords(), None);
    }

    #[test]
    fn sla_defaults_to_weekday_only() {
        let sla: Sla = serde_json::from_str(r#"{"latest_dropoff_hour": 16}"#).unwrap();
        assert!(sla.weekday_only);
        assert_eq!(sla.latest_dropoff_hour, 16);
    }
}
