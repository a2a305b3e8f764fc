pub mod decision;
pub mod offer;
pub mod warehouse;
