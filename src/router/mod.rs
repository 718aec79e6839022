//! Routing state
//!
//! The published configuration of the router: the control-plane topology
//! resolved into a routing table, paired with validated handshake data per
//! hostname. [`RoutingStateManager`] owns the published [`RoutingState`] and
//! replaces it atomically on every accepted push.

pub mod manager;
pub mod state;
pub mod topology;

pub use manager::RoutingStateManager;
pub use state::{HandshakeMap, RoutingState};
pub use topology::{CacheNode, DeliveryService, HostResolver, RoutingTable, StaticHostResolver, Topology};
