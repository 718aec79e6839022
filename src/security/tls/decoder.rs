//! Credential decoding
//!
//! Turns the encoded key and certificate blobs of a [`CertificateData`] record
//! into DER material. The control plane delivers PEM either directly or wrapped
//! in one more layer of base64; [`PemCredentialDecoder`] accepts both.
//!
//! [`CertificateData`]: crate::types::CertificateData

use std::fmt;

use base64::{engine::general_purpose, Engine};
use rsa::BigUint;
use rustls::Certificate;
use rustls_pemfile::Item;
use thiserror::Error;

use super::modulus::{
    NotSupported, Pkcs1PrivateKeyDer, Pkcs8PrivateKeyDer, RsaModulus, TextualKey,
};

const PEM_ARMOR: &str = "-----BEGIN";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("credential material is empty")]
    Empty,

    #[error("invalid base64 wrapping: {0}")]
    Base64(String),

    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("no private key found in material")]
    NoPrivateKey,

    #[error("unsupported private key encoding: {0}")]
    UnsupportedKeyEncoding(&'static str),

    #[error("no certificates found in material")]
    NoCertificates,

    #[error("certificate {index} in chain is not valid X.509: {reason}")]
    Certificate { index: usize, reason: String },
}

/// A decoded private key.
///
/// `Opaque` is for keys a custom decoder can only describe textually, such as
/// handles into external key stores. Their modulus is reached through the
/// textual compatibility shim.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKey {
    Pkcs1(Vec<u8>),
    Pkcs8(Vec<u8>),
    Opaque { description: String },
}

impl PrivateKey {
    pub fn encoding(&self) -> &'static str {
        match self {
            PrivateKey::Pkcs1(_) => "pkcs1",
            PrivateKey::Pkcs8(_) => "pkcs8",
            PrivateKey::Opaque { .. } => "opaque",
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, PrivateKey::Opaque { .. })
    }

    /// DER key usable by rustls, if this key has one.
    pub fn to_rustls(&self) -> Option<rustls::PrivateKey> {
        match self {
            PrivateKey::Pkcs1(der) | PrivateKey::Pkcs8(der) => Some(rustls::PrivateKey(der.clone())),
            PrivateKey::Opaque { .. } => None,
        }
    }
}

impl RsaModulus for PrivateKey {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        match self {
            PrivateKey::Pkcs1(der) => Pkcs1PrivateKeyDer(der).rsa_modulus(),
            PrivateKey::Pkcs8(der) => Pkcs8PrivateKeyDer(der).rsa_modulus(),
            PrivateKey::Opaque { description } => TextualKey(description).rsa_modulus(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKey::Pkcs1(der) | PrivateKey::Pkcs8(der) => f
                .debug_struct("PrivateKey")
                .field("encoding", &self.encoding())
                .field("der_len", &der.len())
                .finish(),
            PrivateKey::Opaque { .. } => f
                .debug_struct("PrivateKey")
                .field("encoding", &self.encoding())
                .finish(),
        }
    }
}

/// Decoding collaborator used by the certificate validator.
pub trait CredentialDecoder: Send + Sync {
    fn decode_private_key(&self, material: &str) -> Result<PrivateKey, DecodeError>;

    /// Decode a chain, preserving the order of the material (leaf first).
    fn decode_certificate_chain(&self, material: &str) -> Result<Vec<Certificate>, DecodeError>;
}

/// PEM decoder that also unwraps base64-encoded PEM.
#[derive(Debug, Clone)]
pub struct PemCredentialDecoder {
    unwrap_base64: bool,
}

impl Default for PemCredentialDecoder {
    fn default() -> Self {
        Self {
            unwrap_base64: true,
        }
    }
}

impl PemCredentialDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base64_unwrapping(unwrap_base64: bool) -> Self {
        Self { unwrap_base64 }
    }

    fn pem_text(&self, material: &str) -> Result<String, DecodeError> {
        let trimmed = material.trim();
        if trimmed.is_empty() {
            return Err(DecodeError::Empty);
        }

        if trimmed.contains(PEM_ARMOR) {
            return Ok(trimmed.to_string());
        }

        if !self.unwrap_base64 {
            return Err(DecodeError::Pem("no PEM armor found".to_string()));
        }

        let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| DecodeError::Base64(e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| DecodeError::Pem("base64 payload is not text".to_string()))?;

        if !text.contains(PEM_ARMOR) {
            return Err(DecodeError::Pem(
                "no PEM armor found after base64 unwrapping".to_string(),
            ));
        }
        Ok(text)
    }

    fn read_items(&self, material: &str) -> Result<Vec<Item>, DecodeError> {
        let text = self.pem_text(material)?;
        rustls_pemfile::read_all(&mut text.as_bytes()).map_err(|e| DecodeError::Pem(e.to_string()))
    }
}

impl CredentialDecoder for PemCredentialDecoder {
    fn decode_private_key(&self, material: &str) -> Result<PrivateKey, DecodeError> {
        for item in self.read_items(material)? {
            match item {
                Item::RSAKey(der) => return Ok(PrivateKey::Pkcs1(der)),
                Item::PKCS8Key(der) => return Ok(PrivateKey::Pkcs8(der)),
                Item::ECKey(_) => return Err(DecodeError::UnsupportedKeyEncoding("sec1")),
                _ => {}
            }
        }
        Err(DecodeError::NoPrivateKey)
    }

    fn decode_certificate_chain(&self, material: &str) -> Result<Vec<Certificate>, DecodeError> {
        let chain: Vec<Certificate> = self
            .read_items(material)?
            .into_iter()
            .filter_map(|item| match item {
                Item::X509Certificate(der) => Some(Certificate(der)),
                _ => None,
            })
            .collect();

        if chain.is_empty() {
            return Err(DecodeError::NoCertificates);
        }
        Ok(chain)
    }
}
