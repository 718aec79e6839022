//! Shared helpers for integration tests: fixture keys and rcgen-minted
//! certificates packaged as control-plane records.
#![allow(dead_code)]

mod certs;

pub use certs::*;

use base64::{engine::general_purpose, Engine};
use routecore::types::CertificateData;

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
