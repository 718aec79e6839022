use prometheus::{IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

use crate::Result;

pub const PUSH_CONFIGURATION: &str = "configuration";
pub const PUSH_CERTIFICATES: &str = "certificates";

pub struct RouterMetrics {
    pub certificate_validations: IntCounterVec,
    pub state_publishes: IntCounterVec,
    pub rejected_pushes: IntCounterVec,
    pub published_generation: IntGauge,
    pub handshake_hostnames: IntGauge,
    pub registry: Registry,
}

impl RouterMetrics {
    pub fn new() -> Result<Arc<Self>> {
        Self::with_registry(Registry::new())
    }

    /// Register the router metrics into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Arc<Self>> {
        let certificate_validations = IntCounterVec::new(
            Opts::new(
                "routecore_certificate_validations_total",
                "Certificate records validated, by result",
            ),
            &["result"],
        )?;

        let state_publishes = IntCounterVec::new(
            Opts::new(
                "routecore_state_publishes_total",
                "Routing states published, by push kind",
            ),
            &["kind"],
        )?;

        let rejected_pushes = IntCounterVec::new(
            Opts::new(
                "routecore_rejected_pushes_total",
                "Pushes that left the published state unchanged, by push kind",
            ),
            &["kind"],
        )?;

        let published_generation = IntGauge::new(
            "routecore_published_generation",
            "Generation of the currently published routing state",
        )?;

        let handshake_hostnames = IntGauge::new(
            "routecore_handshake_hostnames",
            "Hostnames with validated handshake data in the published state",
        )?;

        registry.register(Box::new(certificate_validations.clone()))?;
        registry.register(Box::new(state_publishes.clone()))?;
        registry.register(Box::new(rejected_pushes.clone()))?;
        registry.register(Box::new(published_generation.clone()))?;
        registry.register(Box::new(handshake_hostnames.clone()))?;

        Ok(Arc::new(Self {
            certificate_validations,
            state_publishes,
            rejected_pushes,
            published_generation,
            handshake_hostnames,
            registry,
        }))
    }

    pub fn record_validation(&self, result: &str) {
        self.certificate_validations.with_label_values(&[result]).inc();
    }

    pub fn record_publish(&self, kind: &str, generation: u64, hostnames: usize) {
        self.state_publishes.with_label_values(&[kind]).inc();
        self.published_generation.set(generation as i64);
        self.handshake_hostnames.set(hostnames as i64);
    }

    pub fn record_rejected(&self, kind: &str) {
        self.rejected_pushes.with_label_values(&[kind]).inc();
    }
}
