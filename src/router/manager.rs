use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::state::{HandshakeMap, RoutingState};
use super::topology::{HostResolver, RoutingTable, StaticHostResolver, Topology};
use crate::config::{RouterConfig, DEFAULT_API_PORT};
use crate::health::{EventTimeTracker, RouterEvent};
use crate::metrics::{RouterMetrics, PUSH_CERTIFICATES, PUSH_CONFIGURATION};
use crate::security::tls::{CertificateValidator, ValidationError, ValidationFailure};
use crate::types::CertificateData;

/// Owner of the published routing state.
///
/// Readers call [`current_state`](Self::current_state) without locking. Pushes
/// are serialized; each builds a complete successor state before a single
/// atomic store publishes it, and a failed push publishes nothing.
pub struct RoutingStateManager {
    state: ArcSwap<RoutingState>,
    /// Serializes "build candidate, then publish".
    write_lock: Mutex<()>,
    validator: CertificateValidator,
    resolver: Arc<dyn HostResolver>,
    events: Arc<EventTimeTracker>,
    metrics: Option<Arc<RouterMetrics>>,
    api_port: AtomicU16,
}

impl RoutingStateManager {
    pub fn new(events: Arc<EventTimeTracker>) -> Self {
        Self {
            state: ArcSwap::from_pointee(RoutingState::initial()),
            write_lock: Mutex::new(()),
            validator: CertificateValidator::default(),
            resolver: Arc::new(StaticHostResolver::new()),
            events,
            metrics: None,
            api_port: AtomicU16::new(DEFAULT_API_PORT),
        }
    }

    pub fn from_config(config: &RouterConfig, events: Arc<EventTimeTracker>) -> Self {
        let manager = Self::new(events).with_validator(CertificateValidator::from_config(&config.tls));
        manager.set_api_port(config.api_port);
        manager
    }

    pub fn with_validator(mut self, validator: CertificateValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<RouterMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of the published state. Never blocks on a push.
    pub fn current_state(&self) -> Arc<RoutingState> {
        self.state.load_full()
    }

    pub fn events(&self) -> &Arc<EventTimeTracker> {
        &self.events
    }

    pub fn api_port(&self) -> u16 {
        self.api_port.load(Ordering::Relaxed)
    }

    pub fn set_api_port(&self, port: u16) {
        self.api_port.store(port, Ordering::Relaxed);
    }

    /// Install a new topology, keeping the published handshake data.
    ///
    /// Returns `false` without touching the published state when the topology
    /// is absent or empty, or when any cache fails to resolve.
    pub fn apply_configuration(&self, topology: Option<Topology>) -> bool {
        self.events.record(RouterEvent::ConfigCheck);

        let topology = match topology {
            Some(topology) if !topology.is_empty() => topology,
            _ => {
                debug!("Ignoring empty configuration push");
                self.record_rejected(PUSH_CONFIGURATION);
                return false;
            }
        };

        let _guard = self.write_lock.lock();

        let routing_table = match RoutingTable::build(&topology, self.resolver.as_ref()) {
            Ok(table) => table,
            Err(e) => {
                error!("Rejected configuration push, keeping current state: {}", e);
                self.record_rejected(PUSH_CONFIGURATION);
                return false;
            }
        };

        let candidate = self.state.load().with_topology(topology, routing_table);
        self.publish(candidate, PUSH_CONFIGURATION);
        self.events.record(RouterEvent::ConfigChange);
        true
    }

    /// Replace the handshake mapping with the records that validate.
    ///
    /// Records that fail validation are logged and left out, so their
    /// hostnames have no handshake data in the new state.
    pub fn apply_certificates(&self, certificates: &[CertificateData]) -> bool {
        self.events.record(RouterEvent::CacheStateCheck);

        if certificates.is_empty() {
            debug!("Ignoring empty certificate push");
            self.record_rejected(PUSH_CERTIFICATES);
            return false;
        }

        let mut handshakes = HandshakeMap::new();
        for data in certificates {
            match self.validator.validate(data) {
                Ok(handshake) => {
                    self.record_validation("success");
                    handshakes.insert(data.hostname.to_ascii_lowercase(), Arc::new(handshake));
                }
                Err(e) => {
                    self.record_validation(e.failure.kind());
                    log_rejection(&e);
                }
            }
        }

        let _guard = self.write_lock.lock();
        let candidate = self.state.load().with_handshakes(handshakes);
        self.publish(candidate, PUSH_CERTIFICATES);
        self.events.record(RouterEvent::CacheStateChange);
        true
    }

    fn publish(&self, candidate: RoutingState, kind: &str) {
        let generation = candidate.generation();
        let hostnames = candidate.handshake_count();
        self.state.store(Arc::new(candidate));

        info!(
            "Published routing state generation {} after {} push ({} hostnames with handshake data)",
            generation, kind, hostnames
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_publish(kind, generation, hostnames);
        }
    }

    fn record_validation(&self, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_validation(result);
        }
    }

    fn record_rejected(&self, kind: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_rejected(kind);
        }
    }
}

fn log_rejection(e: &ValidationError) {
    match e.failure {
        ValidationFailure::NoHostMatch { .. } => warn!("{}", e),
        _ => error!("{}", e),
    }
}
