use std::sync::Arc;

use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use tracing::{debug, warn};

use crate::router::RoutingStateManager;

/// Serves handshake material from whatever routing state is published at the
/// moment of each handshake.
pub struct SniCertificateResolver {
    manager: Arc<RoutingStateManager>,
}

impl SniCertificateResolver {
    pub fn new(manager: Arc<RoutingStateManager>) -> Self {
        Self { manager }
    }

    /// Look up signing material for a server name in the current state.
    pub fn resolve_server_name(&self, server_name: &str) -> Option<Arc<CertifiedKey>> {
        let state = self.manager.current_state();
        let Some(handshake) = state.handshake_for(server_name) else {
            debug!("No handshake data for server name {}", server_name);
            return None;
        };

        match handshake.to_certified_key() {
            Ok(key) => Some(Arc::new(key)),
            Err(e) => {
                warn!("Cannot build signing key for {}: {}", server_name, e);
                None
            }
        }
    }
}

impl ResolvesServerCert for SniCertificateResolver {
    fn resolve(&self, client_hello: ClientHello) -> Option<Arc<CertifiedKey>> {
        let server_name = client_hello.server_name()?;
        self.resolve_server_name(server_name)
    }
}
