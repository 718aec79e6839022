//! Router health reporting
//!
//! Staleness is judged from the *check* events: a control plane that stops
//! pushing leaves them ageing even when the published state is still usable.

pub mod events;

pub use events::{EventTimeTracker, RouterEvent};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::config::HealthConfig;
use crate::router::RoutingStateManager;

/// Staleness thresholds for the control-plane feeds.
#[derive(Debug, Clone)]
pub struct HealthThresholds {
    /// Maximum age of the last configuration check, in seconds
    pub config_stale_after_secs: u64,
    /// Maximum age of the last certificate check, in seconds
    pub certificates_stale_after_secs: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self::from(&HealthConfig::default())
    }
}

impl From<&HealthConfig> for HealthThresholds {
    fn from(config: &HealthConfig) -> Self {
        Self {
            config_stale_after_secs: config.config_stale_after_secs,
            certificates_stale_after_secs: config.certificates_stale_after_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterHealthReport {
    pub generation: u64,
    pub has_topology: bool,
    pub handshake_count: usize,
    /// Seconds since each recorded event.
    pub event_ages_secs: BTreeMap<String, i64>,
    pub config_stale: bool,
    pub certificates_stale: bool,
    pub healthy: bool,
}

pub struct HealthReporter {
    manager: Arc<RoutingStateManager>,
    thresholds: HealthThresholds,
}

impl HealthReporter {
    pub fn new(manager: Arc<RoutingStateManager>, thresholds: HealthThresholds) -> Self {
        Self {
            manager,
            thresholds,
        }
    }

    pub fn report(&self) -> RouterHealthReport {
        let state = self.manager.current_state();
        let now = chrono::Utc::now();

        let event_ages_secs: BTreeMap<String, i64> = self
            .manager
            .events()
            .snapshot()
            .into_iter()
            .map(|(name, at)| (name, (now - at).num_seconds()))
            .collect();

        let is_stale = |event: RouterEvent, limit: u64| match event_ages_secs.get(event.as_str()) {
            Some(age) => *age > i64::try_from(limit).unwrap_or(i64::MAX),
            None => true,
        };
        let config_stale = is_stale(RouterEvent::ConfigCheck, self.thresholds.config_stale_after_secs);
        let certificates_stale = is_stale(
            RouterEvent::CacheStateCheck,
            self.thresholds.certificates_stale_after_secs,
        );

        let healthy = state.has_topology() && !config_stale;
        if !healthy {
            warn!(
                "Router unhealthy: topology present={}, configuration stale={}",
                state.has_topology(),
                config_stale
            );
        }

        RouterHealthReport {
            generation: state.generation(),
            has_topology: state.has_topology(),
            handshake_count: state.handshake_count(),
            event_ages_secs,
            config_stale,
            certificates_stale,
            healthy,
        }
    }
}
