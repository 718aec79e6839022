//! RSA modulus extraction
//!
//! A key's modulus is reached through the [`RsaModulus`] capability, which each
//! supported key representation implements. Callers compare moduli without
//! knowing whether a key arrived as PKCS#1, PKCS#8, an X.509 subject public key
//! or an already-parsed `rsa` key.
//!
//! [`TextualKey`] is a compatibility shim for keys that can only describe
//! themselves as text (`modulus: <decimal>`). It is never the primary path.

use rsa::pkcs1;
use rsa::pkcs8::PrivateKeyInfo;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use thiserror::Error;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

const TEXTUAL_MODULUS_MARKER: &str = "modulus: ";

/// The key does not expose an RSA modulus through any supported path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key representation does not expose an RSA modulus")]
pub struct NotSupported;

/// Capability implemented by every key representation that carries an RSA modulus.
pub trait RsaModulus {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported>;
}

/// Extract the modulus of any supported key.
pub fn modulus_of<K: RsaModulus + ?Sized>(key: &K) -> Result<BigUint, NotSupported> {
    key.rsa_modulus()
}

/// True only when both keys expose a modulus and the values are equal.
pub fn moduli_match<A, B>(left: &A, right: &B) -> bool
where
    A: RsaModulus + ?Sized,
    B: RsaModulus + ?Sized,
{
    match (left.rsa_modulus(), right.rsa_modulus()) {
        (Ok(l), Ok(r)) => l == r,
        _ => false,
    }
}

/// DER-encoded PKCS#1 `RSAPrivateKey`.
#[derive(Debug, Clone, Copy)]
pub struct Pkcs1PrivateKeyDer<'a>(pub &'a [u8]);

impl RsaModulus for Pkcs1PrivateKeyDer<'_> {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        let key = pkcs1::RsaPrivateKey::try_from(self.0).map_err(|_| NotSupported)?;
        Ok(BigUint::from_bytes_be(key.modulus.as_bytes()))
    }
}

/// DER-encoded PKCS#8 `PrivateKeyInfo` wrapping an RSA key.
#[derive(Debug, Clone, Copy)]
pub struct Pkcs8PrivateKeyDer<'a>(pub &'a [u8]);

impl RsaModulus for Pkcs8PrivateKeyDer<'_> {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        let info = PrivateKeyInfo::try_from(self.0).map_err(|_| NotSupported)?;
        if info.algorithm.oid != pkcs1::ALGORITHM_OID {
            return Err(NotSupported);
        }
        Pkcs1PrivateKeyDer(info.private_key).rsa_modulus()
    }
}

/// DER-encoded PKCS#1 `RSAPublicKey`.
#[derive(Debug, Clone, Copy)]
pub struct Pkcs1PublicKeyDer<'a>(pub &'a [u8]);

impl RsaModulus for Pkcs1PublicKeyDer<'_> {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        let key = pkcs1::RsaPublicKey::try_from(self.0).map_err(|_| NotSupported)?;
        Ok(BigUint::from_bytes_be(key.modulus.as_bytes()))
    }
}

impl RsaModulus for SubjectPublicKeyInfo<'_> {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        match self.parsed() {
            // leading zero octets are harmless for from_bytes_be
            Ok(PublicKey::RSA(key)) => Ok(BigUint::from_bytes_be(key.modulus)),
            _ => Err(NotSupported),
        }
    }
}

impl RsaModulus for rsa::RsaPrivateKey {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        Ok(self.n().clone())
    }
}

impl RsaModulus for rsa::RsaPublicKey {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        Ok(self.n().clone())
    }
}

/// Compatibility shim: a key known only by its textual description.
///
/// The first line containing `modulus: ` is read as a base-10 integer. Any other
/// shape of text is `NotSupported`.
#[derive(Debug, Clone, Copy)]
pub struct TextualKey<'a>(pub &'a str);

impl RsaModulus for TextualKey<'_> {
    fn rsa_modulus(&self) -> Result<BigUint, NotSupported> {
        for line in self.0.lines() {
            if let Some(start) = line.find(TEXTUAL_MODULUS_MARKER) {
                let digits = line[start + TEXTUAL_MODULUS_MARKER.len()..].trim();
                return BigUint::parse_bytes(digits.as_bytes(), 10).ok_or(NotSupported);
            }
        }
        Err(NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::tls::test_support::{self, Fixture};
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs8::DecodePrivateKey;
    use x509_parser::prelude::{FromDer, X509Certificate};

    fn expected_primary_modulus() -> BigUint {
        BigUint::parse_bytes(test_support::PRIMARY_MODULUS.trim().as_bytes(), 10).unwrap()
    }

    #[test]
    fn test_private_key_encodings_agree() {
        let pkcs1_der = test_support::pem_body(test_support::PRIMARY_PKCS1);
        let pkcs8_der = test_support::pem_body(test_support::PRIMARY_PKCS8);

        let from_pkcs1 = modulus_of(&Pkcs1PrivateKeyDer(&pkcs1_der)).unwrap();
        let from_pkcs8 = modulus_of(&Pkcs8PrivateKeyDer(&pkcs8_der)).unwrap();

        assert_eq!(from_pkcs1, from_pkcs8);
        assert_eq!(from_pkcs1, expected_primary_modulus());
    }

    #[test]
    fn test_parsed_rsa_keys_agree_with_der_adapters() {
        let parsed_pkcs1 = rsa::RsaPrivateKey::from_pkcs1_pem(test_support::PRIMARY_PKCS1).unwrap();
        let parsed_pkcs8 = rsa::RsaPrivateKey::from_pkcs8_pem(test_support::PRIMARY_PKCS8).unwrap();
        let public = rsa::RsaPublicKey::from(&parsed_pkcs1);

        assert_eq!(modulus_of(&parsed_pkcs1).unwrap(), expected_primary_modulus());
        assert_eq!(modulus_of(&parsed_pkcs8).unwrap(), expected_primary_modulus());
        assert_eq!(modulus_of(&public).unwrap(), expected_primary_modulus());
    }

    #[test]
    fn test_public_key_encodings_agree() {
        let rsapub_der = test_support::rsa_public_der(test_support::PRIMARY_RSA_PUBLIC);
        let from_pkcs1 = modulus_of(&Pkcs1PublicKeyDer(&rsapub_der)).unwrap();

        let cert = test_support::mint(Fixture::Primary, "cdn.example.com").cert_der;
        let (_, parsed) = X509Certificate::from_der(&cert).unwrap();
        let from_spki = modulus_of(parsed.public_key()).unwrap();

        assert_eq!(from_pkcs1, from_spki);
        assert_eq!(from_spki, expected_primary_modulus());
    }

    #[test]
    fn test_textual_shim_parses_described_key() {
        let description = format!(
            "Sun RSA public key, 2048 bits\n  params: null\n  modulus: {}\n  public exponent: 65537",
            test_support::PRIMARY_MODULUS.trim()
        );

        assert_eq!(
            modulus_of(&TextualKey(&description)).unwrap(),
            expected_primary_modulus()
        );
    }

    #[test]
    fn test_textual_shim_rejects_unparseable_text() {
        assert_eq!(modulus_of(&TextualKey("no numbers here")), Err(NotSupported));
        assert_eq!(modulus_of(&TextualKey("modulus: 12ab")), Err(NotSupported));
        assert_eq!(modulus_of(&TextualKey("")), Err(NotSupported));
    }

    #[test]
    fn test_malformed_der_is_not_supported() {
        let garbage = [0x30u8, 0x03, 0x02, 0x01];
        assert_eq!(modulus_of(&Pkcs1PrivateKeyDer(&garbage)), Err(NotSupported));
        assert_eq!(modulus_of(&Pkcs8PrivateKeyDer(&garbage)), Err(NotSupported));
        assert_eq!(modulus_of(&Pkcs1PublicKeyDer(&[])), Err(NotSupported));
    }

    #[test]
    fn test_pkcs1_der_is_not_accepted_as_pkcs8() {
        let pkcs1_der = test_support::pem_body(test_support::PRIMARY_PKCS1);
        assert_eq!(modulus_of(&Pkcs8PrivateKeyDer(&pkcs1_der)), Err(NotSupported));
    }

    #[test]
    fn test_moduli_match_across_representations() {
        let pkcs1_der = test_support::pem_body(test_support::PRIMARY_PKCS1);
        let other_der = test_support::pem_body(test_support::SECONDARY_PKCS8);
        let rsapub_der = test_support::rsa_public_der(test_support::PRIMARY_RSA_PUBLIC);

        assert!(moduli_match(&Pkcs1PrivateKeyDer(&pkcs1_der), &Pkcs1PublicKeyDer(&rsapub_der)));
        assert!(!moduli_match(&Pkcs8PrivateKeyDer(&other_der), &Pkcs1PublicKeyDer(&rsapub_der)));
        assert!(!moduli_match(&TextualKey("nothing"), &TextualKey("nothing")));
    }
}
