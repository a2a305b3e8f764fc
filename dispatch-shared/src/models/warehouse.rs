use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Warehouse lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseStatus {
    Active,
    Inactive,
    Maintenance,
}

impl fmt::Display for WarehouseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarehouseStatus::Active => "ACTIVE",
            WarehouseStatus::Inactive => "INACTIVE",
            WarehouseStatus::Maintenance => "MAINTENANCE",
        };
        f.write_str(s)
    }
}

impl FromStr for WarehouseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(WarehouseStatus::Active),
            "INACTIVE" => Ok(WarehouseStatus::Inactive),
            "MAINTENANCE" => Ok(WarehouseStatus::Maintenance),
            other => Err(format!("unknown warehouse status: {}", other)),
        }
    }
}

/// A warehouse that can take on shipment volume.
///
/// Invariant: `0 <= used_cbm <= capacity_cbm`. `used_cbm` is only mutated
/// through the store's conditional hold/release operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub capacity_cbm: f64,
    pub used_cbm: f64,
    /// Service-time limit in minutes for routes served from this site
    pub service_limit: f64,
    pub status: WarehouseStatus,
}

impl Warehouse {
    /// Remaining free volume, never negative.
    pub fn available_cbm(&self) -> f64 {
        (self.capacity_cbm - self.used_cbm).max(0.0)
    }

    /// Fraction of capacity currently consumed, in [0, 1].
    pub fn utilization(&self) -> f64 {
        if self.capacity_cbm <= 0.0 {
            return 0.0;
        }
        (self.used_cbm / self.capacity_cbm).clamp(0.0, 1.0)
    }

    pub fn is_active(&self) -> bool {
        self.status == WarehouseStatus::Active
    }

    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}
