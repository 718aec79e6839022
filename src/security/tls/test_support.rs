//! Certificate fixtures for unit tests. The minting helpers are shared with
//! the integration tests.

use base64::{engine::general_purpose, Engine};

use crate::types::CertificateData;

#[path = "../../../tests/common/certs.rs"]
mod certs;

pub use certs::*;

/// Control-plane style record: key and chain are base64-wrapped PEM.
pub fn certificate_data(
    delivery_service: &str,
    hostname: &str,
    key: &str,
    certs: &[&MintedCert],
) -> CertificateData {
    CertificateData::new(
        delivery_service,
        hostname,
        general_purpose::STANDARD.encode(key),
        general_purpose::STANDARD.encode(chain_pem(certs)),
    )
}
