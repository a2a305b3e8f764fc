pub mod models;

pub use models::decision::{Candidate, Decision, DecisionMeta, RouteInfo};
pub use models::offer::{Offer, Sla};
pub use models::warehouse::{Warehouse, WarehouseStatus};
