//! Shipment permissions and pricing

pub mod permission;
pub mod resolver;

pub use permission::ShipmentPermission;
pub use resolver::{CostTier, PermissionResolver, ShipmentCost};
