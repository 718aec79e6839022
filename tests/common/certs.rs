//! Certificate fixtures shared by unit and integration tests.
//!
//! Keys are fixed 2048-bit RSA fixtures; certificates are minted on demand with
//! rcgen so validity windows can be placed relative to the test clock.
#![allow(dead_code)]

use rcgen::{Certificate, CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rustls_pemfile::Item;

pub const PRIMARY_PKCS8: &str = include_str!("../fixtures/primary.pkcs8.pem");
pub const PRIMARY_PKCS1: &str = include_str!("../fixtures/primary.pkcs1.pem");
pub const PRIMARY_RSA_PUBLIC: &str = include_str!("../fixtures/primary.rsapub.pem");
pub const PRIMARY_MODULUS: &str = include_str!("../fixtures/primary.modulus.txt");
pub const SECONDARY_PKCS8: &str = include_str!("../fixtures/secondary.pkcs8.pem");
pub const SECONDARY_PKCS1: &str = include_str!("../fixtures/secondary.pkcs1.pem");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    Primary,
    Secondary,
}

impl Fixture {
    pub fn pkcs8_pem(self) -> &'static str {
        match self {
            Fixture::Primary => PRIMARY_PKCS8,
            Fixture::Secondary => SECONDARY_PKCS8,
        }
    }

    pub fn pkcs1_pem(self) -> &'static str {
        match self {
            Fixture::Primary => PRIMARY_PKCS1,
            Fixture::Secondary => SECONDARY_PKCS1,
        }
    }
}

/// DER of the first key or certificate block in `pem`.
pub fn pem_body(pem: &str) -> Vec<u8> {
    match rustls_pemfile::read_one(&mut pem.as_bytes()).unwrap() {
        Some(Item::X509Certificate(der))
        | Some(Item::RSAKey(der))
        | Some(Item::PKCS8Key(der))
        | Some(Item::ECKey(der)) => der,
        _ => panic!("no key or certificate block in PEM"),
    }
}

/// DER of a PKCS#1 `RSA PUBLIC KEY` block, which rustls-pemfile skips.
pub fn rsa_public_der(pem: &str) -> Vec<u8> {
    let key = rsa::RsaPublicKey::from_pkcs1_pem(pem).unwrap();
    key.to_pkcs1_der().unwrap().as_bytes().to_vec()
}

pub struct MintedCert {
    pub cert_der: Vec<u8>,
    pub cert_pem: String,
}

pub struct CertSpec {
    key: Fixture,
    common_name: Option<String>,
    organization: Option<String>,
    sans: Vec<SanType>,
    not_before: (i32, u8, u8),
    not_after: (i32, u8, u8),
}

impl CertSpec {
    /// No subject, no SANs, valid 2000 to 2090.
    pub fn new(key: Fixture) -> Self {
        Self {
            key,
            common_name: None,
            organization: None,
            sans: Vec::new(),
            not_before: (2000, 1, 1),
            not_after: (2090, 1, 1),
        }
    }

    pub fn common_name(mut self, cn: &str) -> Self {
        self.common_name = Some(cn.to_string());
        self
    }

    pub fn organization(mut self, org: &str) -> Self {
        self.organization = Some(org.to_string());
        self
    }

    pub fn dns_san(mut self, name: &str) -> Self {
        self.sans.push(SanType::DnsName(name.to_string()));
        self
    }

    pub fn ip_san(mut self, ip: std::net::IpAddr) -> Self {
        self.sans.push(SanType::IpAddress(ip));
        self
    }

    pub fn expired(mut self) -> Self {
        self.not_before = (2010, 1, 1);
        self.not_after = (2011, 1, 1);
        self
    }

    pub fn not_yet_valid(mut self) -> Self {
        self.not_before = (2089, 1, 1);
        self.not_after = (2090, 1, 1);
        self
    }

    pub fn build(self) -> MintedCert {
        let mut params = CertificateParams::default();
        params.alg = &rcgen::PKCS_RSA_SHA256;
        params.key_pair = Some(KeyPair::from_pem(self.key.pkcs8_pem()).unwrap());
        params.not_before = rcgen::date_time_ymd(self.not_before.0, self.not_before.1, self.not_before.2);
        params.not_after = rcgen::date_time_ymd(self.not_after.0, self.not_after.1, self.not_after.2);
        params.subject_alt_names = self.sans;

        let mut dn = DistinguishedName::new();
        if let Some(cn) = self.common_name {
            dn.push(DnType::CommonName, cn);
        }
        if let Some(org) = self.organization {
            dn.push(DnType::OrganizationName, org);
        }
        params.distinguished_name = dn;

        let cert = Certificate::from_params(params).unwrap();
        MintedCert {
            cert_der: cert.serialize_der().unwrap(),
            cert_pem: cert.serialize_pem().unwrap(),
        }
    }
}

/// Shorthand for a currently valid certificate with only a common name.
pub fn mint(key: Fixture, common_name: &str) -> MintedCert {
    CertSpec::new(key).common_name(common_name).build()
}

/// Concatenate certificate PEMs into chain material, leaf first.
pub fn chain_pem(certs: &[&MintedCert]) -> String {
    certs.iter().map(|c| c.cert_pem.as_str()).collect::<Vec<_>>().join("")
}
