#![forbid(unsafe_code)]

//! Signing capability.

use std::path::Path;

use tillid_core::{algorithm, Error};
use tillid_crypto::sign::{self, SigningKey};

use crate::certificate::Certificate;
use crate::loader;

/// Something that can produce a `SignatureValue` over canonical
/// `SignedInfo` bytes.
///
/// Implemented by [`KeyMaterial`] for in-memory keys; smart-card or HSM
/// signers implement it by forwarding `data` to the device.
pub trait SignatureProvider: Send + Sync {
    /// The `SignatureMethod` algorithm URI the provider signs with.
    fn signature_method(&self) -> &'static str {
        algorithm::RSA_SHA1
    }

    /// Sign `data`, returning the raw signature bytes.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// The certificate whose key verifies the produced signatures.
    fn certificate(&self) -> &Certificate;
}

/// An RSA private key paired with its certificate.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    key: SigningKey,
    certificate: Certificate,
    signature_method: &'static str,
}

impl KeyMaterial {
    /// Pair a private key with its certificate. The certificate must carry
    /// the key's public half.
    pub fn new(private_key: rsa::RsaPrivateKey, certificate: Certificate) -> Result<Self, Error> {
        if private_key.to_public_key() != *certificate.public_key() {
            return Err(Error::Key(format!(
                "private key does not match certificate {}",
                certificate.subject()
            )));
        }
        Ok(Self {
            key: SigningKey::Rsa(private_key),
            certificate,
            signature_method: algorithm::RSA_SHA1,
        })
    }

    /// Load from PEM-encoded key and certificate.
    pub fn from_pem(key_pem: &[u8], cert_pem: &[u8]) -> Result<Self, Error> {
        let key = loader::load_rsa_private_pem(key_pem)?;
        let cert = Certificate::from_pem(cert_pem)?;
        Self::new(key, cert)
    }

    /// Load from key and certificate files (PEM or DER).
    pub fn from_files(key_path: &Path, cert_path: &Path) -> Result<Self, Error> {
        let key = loader::load_private_key_file(key_path)?;
        let cert = loader::load_certificate_file(cert_path)?;
        Self::new(key, cert)
    }

    /// Sign with a different RSA signature method.
    pub fn with_signature_method(mut self, uri: &str) -> Result<Self, Error> {
        self.signature_method = sign::from_uri(uri)?.uri();
        Ok(self)
    }
}

impl SignatureProvider for KeyMaterial {
    fn signature_method(&self) -> &'static str {
        self.signature_method
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        sign::from_uri(self.signature_method)?.sign(&self.key, data)
    }

    fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}
