#![forbid(unsafe_code)]

//! RSA PKCS#1 v1.5 signature algorithms.

use signature::SignatureEncoding;
use tillid_core::{algorithm, Error};

/// Key material for signature operations.
#[derive(Clone)]
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningKey::Rsa(_) => f.write_str("SigningKey::Rsa(..)"),
            SigningKey::RsaPublic(_) => f.write_str("SigningKey::RsaPublic(..)"),
        }
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA1,
            hash: HashType::Sha1,
        })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 {
            uri: algorithm::RSA_SHA256,
            hash: HashType::Sha256,
        })),
        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha256,
}

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
        }
    }

    fn verify_with_key(
        &self,
        public_key: &rsa::RsaPublicKey,
        data: &[u8],
        sig_bytes: &[u8],
    ) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            SigningKey::RsaPublic(_) => Err(Error::Key("RSA private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::DecodeRsaPrivateKey;

    const KEY_PEM: &str = include_str!("../../../test-data/keys/signer-key.pem");

    fn key() -> rsa::RsaPrivateKey {
        rsa::RsaPrivateKey::from_pkcs1_pem(KEY_PEM).unwrap()
    }

    #[test]
    fn test_rsa_sha1_sign_verify() {
        let private = key();
        let public = SigningKey::RsaPublic(private.to_public_key());
        let alg = from_uri(algorithm::RSA_SHA1).unwrap();
        let sig = alg.sign(&SigningKey::Rsa(private), b"<SignedInfo/>").unwrap();
        assert_eq!(sig.len(), 256);
        assert!(alg.verify(&public, b"<SignedInfo/>", &sig).unwrap());
        assert!(!alg.verify(&public, b"<SignedInfo />", &sig).unwrap());
    }

    #[test]
    fn test_hash_mismatch_fails() {
        let private = SigningKey::Rsa(key());
        let sha1 = from_uri(algorithm::RSA_SHA1).unwrap();
        let sha256 = from_uri(algorithm::RSA_SHA256).unwrap();
        let sig = sha256.sign(&private, b"data").unwrap();
        assert!(sha256.verify(&private, b"data", &sig).unwrap());
        assert!(!sha1.verify(&private, b"data", &sig).unwrap());
    }

    #[test]
    fn test_public_key_cannot_sign() {
        let public = SigningKey::RsaPublic(key().to_public_key());
        let alg = from_uri(algorithm::RSA_SHA1).unwrap();
        assert!(matches!(alg.sign(&public, b"x"), Err(Error::Key(_))));
    }

    #[test]
    fn test_unsupported() {
        assert!(from_uri("http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256").is_err());
    }
}
