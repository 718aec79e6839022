pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod security;
pub mod types;

pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use health::{EventTimeTracker, HealthReporter, RouterEvent};
pub use router::{RoutingState, RoutingStateManager, Topology};
pub use security::{CertificateValidator, HandshakeData};
pub use types::CertificateData;
