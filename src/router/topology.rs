use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, SocketAddr};

use crate::error::{Result, RouterError};
use crate::types::{CacheId, DeliveryServiceId, Hostname};

fn default_cache_port() -> u16 {
    80
}

/// Cache and delivery-service layout pushed by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    #[serde(default)]
    pub caches: Vec<CacheNode>,
    #[serde(default)]
    pub delivery_services: BTreeMap<DeliveryServiceId, DeliveryService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheNode {
    pub id: CacheId,
    pub fqdn: Hostname,
    #[serde(default)]
    pub ip: Option<IpAddr>,
    #[serde(default = "default_cache_port")]
    pub port: u16,
    #[serde(default)]
    pub delivery_services: Vec<DeliveryServiceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryService {
    pub id: DeliveryServiceId,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub ssl_enabled: bool,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RouterError::Config(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty() && self.delivery_services.is_empty()
    }

    pub fn cache(&self, id: &str) -> Option<&CacheNode> {
        self.caches.iter().find(|c| c.id == id)
    }
}

/// Resolves a cache to the socket address traffic is routed to.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, cache: &CacheNode) -> Result<SocketAddr>;
}

/// Resolver that never touches the network.
///
/// Uses the cache's explicit address, then an IP literal in its FQDN, then the
/// override table.
#[derive(Debug, Clone, Default)]
pub struct StaticHostResolver {
    overrides: HashMap<Hostname, IpAddr>,
}

impl StaticHostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, host: impl Into<Hostname>, ip: IpAddr) -> Self {
        self.overrides.insert(host.into().to_ascii_lowercase(), ip);
        self
    }
}

impl HostResolver for StaticHostResolver {
    fn resolve(&self, cache: &CacheNode) -> Result<SocketAddr> {
        let ip = cache
            .ip
            .or_else(|| cache.fqdn.parse::<IpAddr>().ok())
            .or_else(|| self.overrides.get(&cache.fqdn.to_ascii_lowercase()).copied())
            .ok_or_else(|| RouterError::UnresolvableHost {
                cache_id: cache.id.clone(),
                host: cache.fqdn.clone(),
            })?;
        Ok(SocketAddr::new(ip, cache.port))
    }
}

/// Resolved view of a topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    caches: BTreeMap<CacheId, SocketAddr>,
    delivery_services: BTreeMap<DeliveryServiceId, Vec<CacheId>>,
}

impl RoutingTable {
    /// Resolve every cache; any failure aborts the whole build.
    pub fn build(topology: &Topology, resolver: &dyn HostResolver) -> Result<Self> {
        let mut table = RoutingTable::default();

        for id in topology.delivery_services.keys() {
            table.delivery_services.entry(id.clone()).or_default();
        }

        for cache in &topology.caches {
            let addr = resolver.resolve(cache)?;
            table.caches.insert(cache.id.clone(), addr);
            for ds in &cache.delivery_services {
                table
                    .delivery_services
                    .entry(ds.clone())
                    .or_default()
                    .push(cache.id.clone());
            }
        }

        Ok(table)
    }

    pub fn address_of(&self, cache_id: &str) -> Option<SocketAddr> {
        self.caches.get(cache_id).copied()
    }

    pub fn caches_for(&self, delivery_service_id: &str) -> &[CacheId] {
        self.delivery_services
            .get(delivery_service_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOPOLOGY_JSON: &str = r#"{
        "caches": [
            { "id": "edge-1", "fqdn": "edge-1.cdn.test", "ip": "192.0.2.1", "port": 8080,
              "deliveryServices": ["video"] },
            { "id": "edge-2", "fqdn": "198.51.100.7", "deliveryServices": ["video", "img"] }
        ],
        "deliveryServices": {
            "video": { "id": "video", "domains": ["video.example.com"], "sslEnabled": true },
            "docs": { "id": "docs" }
        }
    }"#;

    #[test]
    fn test_topology_from_json() {
        let topology = Topology::from_json(TOPOLOGY_JSON).unwrap();

        assert!(!topology.is_empty());
        assert_eq!(topology.caches.len(), 2);
        assert_eq!(topology.cache("edge-2").unwrap().port, 80);
        assert!(topology.delivery_services["video"].ssl_enabled);
        assert!(!topology.delivery_services["docs"].ssl_enabled);
        assert!(Topology::default().is_empty());
        assert!(Topology::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_routing_table_resolution() {
        let topology = Topology::from_json(TOPOLOGY_JSON).unwrap();
        let table = RoutingTable::build(&topology, &StaticHostResolver::new()).unwrap();

        assert_eq!(table.cache_count(), 2);
        assert_eq!(
            table.address_of("edge-1"),
            Some("192.0.2.1:8080".parse().unwrap())
        );
        assert_eq!(table.address_of("edge-2"), Some("198.51.100.7:80".parse().unwrap()));
        assert_eq!(table.caches_for("video"), &["edge-1".to_string(), "edge-2".to_string()]);
        assert_eq!(table.caches_for("img"), &["edge-2".to_string()]);
        assert!(table.caches_for("docs").is_empty());
        assert!(table.caches_for("unknown").is_empty());
    }

    #[test]
    fn test_unresolvable_host_fails_build() {
        let mut topology = Topology::from_json(TOPOLOGY_JSON).unwrap();
        topology.caches.push(CacheNode {
            id: "edge-3".to_string(),
            fqdn: "edge-3.cdn.test".to_string(),
            ip: None,
            port: 80,
            delivery_services: vec![],
        });

        let err = RoutingTable::build(&topology, &StaticHostResolver::new()).unwrap_err();
        assert!(matches!(
            err,
            RouterError::UnresolvableHost { ref cache_id, .. } if cache_id == "edge-3"
        ));

        let resolver = StaticHostResolver::new().with_override("EDGE-3.cdn.test", "203.0.113.3".parse().unwrap());
        let table = RoutingTable::build(&topology, &resolver).unwrap();
        assert_eq!(table.address_of("edge-3"), Some("203.0.113.3:80".parse().unwrap()));
    }
}
