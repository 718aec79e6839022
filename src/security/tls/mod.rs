//! TLS credential handling
//!
//! Decoding of control-plane key and certificate material, RSA modulus
//! extraction, certificate validation and SNI-based resolution of the validated
//! material at handshake time.

pub mod decoder;
pub mod modulus;
pub mod resolver;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use decoder::{CredentialDecoder, DecodeError, PemCredentialDecoder, PrivateKey};
pub use modulus::{
    moduli_match, modulus_of, NotSupported, Pkcs1PrivateKeyDer, Pkcs1PublicKeyDer,
    Pkcs8PrivateKeyDer, RsaModulus, TextualKey,
};
pub use resolver::SniCertificateResolver;
pub use validator::{
    hostname_matches, CertificateValidator, HandshakeData, ValidationError, ValidationFailure,
};
