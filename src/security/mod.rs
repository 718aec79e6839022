//! RouteCore Security Module
//!
//! Credential handling for HTTPS termination at the router: control-plane
//! certificate records are decoded, checked against their validity window,
//! hostname and key modulus, and exposed to rustls as per-hostname signing
//! material.
//!
//! ## Key Components
//!
//! - **Modulus extraction**: one `RsaModulus` adapter per key representation
//! - **Validation**: `CertificateValidator` producing `HandshakeData` or a classified failure
//! - **SNI resolution**: `SniCertificateResolver` backed by the published routing state

pub mod tls;

pub use tls::{
    hostname_matches, modulus_of, CertificateValidator, CredentialDecoder, DecodeError,
    HandshakeData, NotSupported, PemCredentialDecoder, PrivateKey, RsaModulus,
    SniCertificateResolver, ValidationError, ValidationFailure,
};
