use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::topology::{RoutingTable, Topology};
use crate::security::tls::HandshakeData;
use crate::types::Hostname;

/// Handshake data keyed by lowercased hostname.
pub type HandshakeMap = BTreeMap<Hostname, Arc<HandshakeData>>;

/// One published, immutable view of the router's configuration.
///
/// A push never mutates a `RoutingState`; it builds the successor in full and
/// the manager swaps it in. Unchanged halves are shared between generations.
#[derive(Debug, Clone)]
pub struct RoutingState {
    generation: u64,
    topology: Option<Arc<Topology>>,
    routing_table: Arc<RoutingTable>,
    handshakes: Arc<HandshakeMap>,
    last_change: DateTime<Utc>,
}

impl RoutingState {
    /// Generation 0: no topology and no handshake data.
    pub fn initial() -> Self {
        Self {
            generation: 0,
            topology: None,
            routing_table: Arc::new(RoutingTable::default()),
            handshakes: Arc::new(HandshakeMap::new()),
            last_change: Utc::now(),
        }
    }

    /// Successor carrying a new topology and this state's handshake data.
    pub(crate) fn with_topology(&self, topology: Topology, routing_table: RoutingTable) -> Self {
        Self {
            generation: self.generation + 1,
            topology: Some(Arc::new(topology)),
            routing_table: Arc::new(routing_table),
            handshakes: self.handshakes.clone(),
            last_change: Utc::now(),
        }
    }

    /// Successor carrying this state's topology and a new handshake mapping.
    pub(crate) fn with_handshakes(&self, handshakes: HandshakeMap) -> Self {
        Self {
            generation: self.generation + 1,
            topology: self.topology.clone(),
            routing_table: self.routing_table.clone(),
            handshakes: Arc::new(handshakes),
            last_change: Utc::now(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_deref()
    }

    pub fn has_topology(&self) -> bool {
        self.topology.is_some()
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }

    pub fn handshakes(&self) -> &HandshakeMap {
        &self.handshakes
    }

    pub fn handshake_count(&self) -> usize {
        self.handshakes.len()
    }

    /// Exact, case-insensitive lookup by hostname.
    pub fn handshake_for(&self, hostname: &str) -> Option<&Arc<HandshakeData>> {
        self.handshakes.get(&hostname.to_ascii_lowercase())
    }

    pub fn handshakes_for_delivery_service(&self, delivery_service_id: &str) -> Vec<Arc<HandshakeData>> {
        self.handshakes
            .values()
            .filter(|h| h.delivery_service_id == delivery_service_id)
            .cloned()
            .collect()
    }

    /// Hostnames with handshake data, sorted.
    pub fn hostnames(&self) -> Vec<&str> {
        self.handshakes.keys().map(String::as_str).collect()
    }
}

impl Default for RoutingState {
    fn default() -> Self {
        Self::initial()
    }
}
