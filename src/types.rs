use serde::{Deserialize, Serialize};
use std::fmt;

pub type DeliveryServiceId = String;
pub type CacheId = String;
pub type Hostname = String;

/// Encoded key and certificate blobs as delivered by the control plane.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMaterial {
    /// Private key, PEM or base64-wrapped PEM.
    pub key: String,
    /// Certificate chain, leaf first, PEM or base64-wrapped PEM.
    pub crt: String,
}

impl fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("key", &"<redacted>")
            .field("crt_len", &self.crt.len())
            .finish()
    }
}

/// One certificate record of a certificate-set push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateData {
    #[serde(rename = "deliveryservice")]
    pub delivery_service_id: DeliveryServiceId,
    pub hostname: Hostname,
    #[serde(rename = "alias", default, skip_serializing_if = "Option::is_none")]
    pub alias_hint: Option<String>,
    pub certificate: CertificateMaterial,
}

impl CertificateData {
    pub fn new(
        delivery_service_id: impl Into<DeliveryServiceId>,
        hostname: impl Into<Hostname>,
        key: impl Into<String>,
        crt: impl Into<String>,
    ) -> Self {
        Self {
            delivery_service_id: delivery_service_id.into(),
            hostname: hostname.into(),
            alias_hint: None,
            certificate: CertificateMaterial {
                key: key.into(),
                crt: crt.into(),
            },
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias_hint = Some(alias.into());
        self
    }

    /// Identity matched against certificate subjects and SANs.
    pub fn alias(&self) -> &str {
        self.alias_hint.as_deref().unwrap_or(&self.hostname)
    }
}

impl fmt::Display for CertificateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.delivery_service_id, self.hostname)
    }
}
