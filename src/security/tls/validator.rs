//! Certificate validation
//!
//! [`CertificateValidator`] turns one [`CertificateData`] record into a
//! [`HandshakeData`] bundle that the TLS termination layer can serve, or a
//! classified [`ValidationError`]. The chain is scanned leaf first; validity
//! windows are enforced on every element while the host and modulus matches may
//! be satisfied by any element.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rsa::BigUint;
use rustls::sign::CertifiedKey;
use rustls::Certificate;
use thiserror::Error;
use tracing::debug;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::{FromDer, X509Certificate};

use super::decoder::{CredentialDecoder, DecodeError, PemCredentialDecoder, PrivateKey};
use super::modulus::{modulus_of, RsaModulus};
use crate::config::TlsValidationConfig;
use crate::error::{Result, RouterError};
use crate::types::{CertificateData, DeliveryServiceId, Hostname};

const CN_MARKER: &str = "CN=";

/// Verified TLS material for exactly one hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeData {
    pub delivery_service_id: DeliveryServiceId,
    pub hostname: Hostname,
    /// Leaf first, in the order delivered.
    pub chain: Vec<Certificate>,
    pub private_key: PrivateKey,
}

impl HandshakeData {
    pub fn leaf(&self) -> Option<&Certificate> {
        self.chain.first()
    }

    /// Build the signing bundle rustls serves for this hostname.
    pub fn to_certified_key(&self) -> Result<CertifiedKey> {
        let key = self.private_key.to_rustls().ok_or_else(|| {
            RouterError::Tls(rustls::Error::General(format!(
                "{} key for {} cannot sign handshakes",
                self.private_key.encoding(),
                self.hostname
            )))
        })?;
        let signing_key = rustls::sign::any_supported_type(&key)
            .map_err(|e| RouterError::Tls(rustls::Error::General(e.to_string())))?;
        Ok(CertifiedKey::new(self.chain.clone(), signing_key))
    }
}

/// Closed set of reasons a certificate record is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("undecodable material: {0}")]
    Decode(#[from] DecodeError),

    #[error("certificate {index} is not valid before {not_before}")]
    NotYetValid { index: usize, not_before: String },

    #[error("certificate {index} expired at {not_after}")]
    Expired { index: usize, not_after: String },

    #[error("no certificate subject or SAN matches '{alias}'")]
    NoHostMatch { alias: String },

    #[error("no certificate public key matches the private key modulus")]
    NoModulusMatch,
}

impl ValidationFailure {
    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationFailure::Decode(_) => "decode_error",
            ValidationFailure::NotYetValid { .. } => "not_yet_valid",
            ValidationFailure::Expired { .. } => "expired",
            ValidationFailure::NoHostMatch { .. } => "no_host_match",
            ValidationFailure::NoModulusMatch => "no_modulus_match",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("certificate for {hostname} (delivery service {delivery_service_id}) rejected: {failure}")]
pub struct ValidationError {
    pub delivery_service_id: DeliveryServiceId,
    pub hostname: Hostname,
    pub failure: ValidationFailure,
}

impl ValidationError {
    fn new(data: &CertificateData, failure: impl Into<ValidationFailure>) -> Self {
        Self {
            delivery_service_id: data.delivery_service_id.clone(),
            hostname: data.hostname.clone(),
            failure: failure.into(),
        }
    }
}

/// Bidirectional substring match between an alias and a certificate name.
///
/// Either name containing the other is a match. Failing that, the value after
/// the first `CN=` (with a leading `*.` reduced to `.` and cut at the first
/// `,`) is tested the same way.
pub fn hostname_matches(alias: &str, subject: &str) -> bool {
    if alias.contains(subject) || subject.contains(alias) {
        return true;
    }

    let Some(start) = subject.find(CN_MARKER) else {
        return false;
    };
    let common_name = subject[start + CN_MARKER.len()..].replacen("*.", ".", 1);
    let common_name = match common_name.find(',') {
        Some(end) => &common_name[..end],
        None => common_name.as_str(),
    };

    !common_name.is_empty() && (alias.contains(common_name) || common_name.contains(alias))
}

/// Subject followed by every SAN in its string form. The subject is offered
/// even when empty, which under the substring rule matches any alias.
fn candidate_names(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut names = vec![cert.subject().to_string()];

    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(s) | GeneralName::RFC822Name(s) | GeneralName::URI(s) => {
                    names.push(s.to_string())
                }
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_to_string(bytes) {
                        names.push(ip);
                    }
                }
                GeneralName::DirectoryName(dn) => names.push(dn.to_string()),
                _ => {}
            }
        }
    }

    names
}

fn ip_to_string(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

fn unix_seconds(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Stateless validator; safe to share across threads.
pub struct CertificateValidator {
    decoder: Arc<dyn CredentialDecoder>,
    allow_textual_modulus: bool,
}

impl CertificateValidator {
    pub fn new(decoder: Arc<dyn CredentialDecoder>) -> Self {
        Self {
            decoder,
            allow_textual_modulus: true,
        }
    }

    pub fn from_config(config: &TlsValidationConfig) -> Self {
        let decoder = PemCredentialDecoder::with_base64_unwrapping(config.decode_base64_wrapped);
        Self {
            decoder: Arc::new(decoder),
            allow_textual_modulus: config.allow_textual_modulus_fallback,
        }
    }

    pub fn with_textual_modulus_fallback(mut self, allow: bool) -> Self {
        self.allow_textual_modulus = allow;
        self
    }

    pub fn validate(
        &self,
        data: &CertificateData,
    ) -> std::result::Result<HandshakeData, ValidationError> {
        self.validate_at(data, SystemTime::now())
    }

    /// Validate against an explicit clock.
    pub fn validate_at(
        &self,
        data: &CertificateData,
        now: SystemTime,
    ) -> std::result::Result<HandshakeData, ValidationError> {
        let private_key = self
            .decoder
            .decode_private_key(&data.certificate.key)
            .map_err(|e| ValidationError::new(data, e))?;
        let chain = self
            .decoder
            .decode_certificate_chain(&data.certificate.crt)
            .map_err(|e| ValidationError::new(data, e))?;

        let key_modulus = self.private_key_modulus(&private_key);
        let alias = data.alias();
        let now = unix_seconds(now);
        let mut host_match = false;
        let mut modulus_match = false;

        for (index, der) in chain.iter().enumerate() {
            let (_, cert) = X509Certificate::from_der(&der.0).map_err(|e| {
                ValidationError::new(
                    data,
                    DecodeError::Certificate {
                        index,
                        reason: e.to_string(),
                    },
                )
            })?;

            let validity = cert.validity();
            if now < validity.not_before.timestamp() {
                return Err(ValidationError::new(
                    data,
                    ValidationFailure::NotYetValid {
                        index,
                        not_before: validity.not_before.to_string(),
                    },
                ));
            }
            if now > validity.not_after.timestamp() {
                return Err(ValidationError::new(
                    data,
                    ValidationFailure::Expired {
                        index,
                        not_after: validity.not_after.to_string(),
                    },
                ));
            }

            if !host_match {
                host_match = candidate_names(&cert)
                    .iter()
                    .any(|name| hostname_matches(alias, name));
            }

            if !modulus_match {
                if let Some(expected) = &key_modulus {
                    modulus_match = modulus_of(cert.public_key()).ok().as_ref() == Some(expected);
                }
            }
        }

        if !host_match {
            return Err(ValidationError::new(
                data,
                ValidationFailure::NoHostMatch {
                    alias: alias.to_string(),
                },
            ));
        }
        if !modulus_match {
            return Err(ValidationError::new(data, ValidationFailure::NoModulusMatch));
        }

        debug!(
            "Validated {} certificate(s) for {} in delivery service {}",
            chain.len(),
            data.hostname,
            data.delivery_service_id
        );

        Ok(HandshakeData {
            delivery_service_id: data.delivery_service_id.clone(),
            hostname: data.hostname.clone(),
            chain,
            private_key,
        })
    }

    fn private_key_modulus(&self, key: &PrivateKey) -> Option<BigUint> {
        if key.is_opaque() && !self.allow_textual_modulus {
            return None;
        }
        key.rsa_modulus().ok()
    }
}

impl Default for CertificateValidator {
    fn default() -> Self {
        Self::new(Arc::new(PemCredentialDecoder::new()))
    }
}
