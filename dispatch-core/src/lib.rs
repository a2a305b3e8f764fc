pub mod coordinator;
pub mod error;
pub mod memory;
pub mod registry;
pub mod sla;
pub mod store;

pub use coordinator::DispatchCoordinator;
pub use error::DispatchError;
pub use memory::MemoryStore;
pub use registry::WarehouseRegistry;
pub use sla::{ServiceLimitAssessor, SlaAssessor};
pub use store::{reservation_id, DecisionRecord, DispatchStore, StoreError};
