//! Arrakis Rules - placement and shipment engine for a Dune-style board game
//!
//! Validates force placements (shipments, movements, deployments) against
//! the map, shipment permissions and the force ledger, then applies them
//! atomically so every faction's force pool is conserved.

pub mod core;
pub mod event;
pub mod forces;
pub mod map;
pub mod placement;
pub mod session;
pub mod shipment;
