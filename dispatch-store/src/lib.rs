pub mod app_config;
pub mod seed;
pub mod sqlite_store;
pub mod stats;

pub use app_config::Config;
pub use seed::default_fleet;
pub use sqlite_store::SqliteStore;
pub use stats::{compute_warehouse_stats, warehouse_stats, WarehouseKpi};
