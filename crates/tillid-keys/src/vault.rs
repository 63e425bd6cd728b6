#![forbid(unsafe_code)]

//! Trusted certificate storage.

use std::path::Path;

use tillid_core::Error;

use crate::certificate::Certificate;
use crate::loader;
use crate::provider::KeyMaterial;

/// Decides whether a certificate is trusted by membership.
pub trait TrustStore: Send + Sync {
    fn is_trusted(&self, certificate: &Certificate) -> bool;
}

/// Holds the trusted certificates of a deployment and, optionally, the
/// system's own signing credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialVault {
    trusted: Vec<Certificate>,
    system_credentials: Option<KeyMaterial>,
}

impl CredentialVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trusted certificate. Duplicates are ignored.
    pub fn add_trusted_certificate(&mut self, certificate: Certificate) {
        if !self.trusted.contains(&certificate) {
            self.trusted.push(certificate);
        }
    }

    /// Load every `.pem`, `.crt`, `.cer` and `.der` file in `dir` as a
    /// trusted certificate.
    pub fn load_trusted_dir(&mut self, dir: &Path) -> Result<usize, Error> {
        let mut count = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !["pem", "crt", "cer", "der"].iter().any(|x| ext.eq_ignore_ascii_case(x)) {
                continue;
            }
            match loader::load_certificate_file(&path) {
                Ok(cert) => {
                    self.add_trusted_certificate(cert);
                    count += 1;
                }
                Err(e) => log::debug!("skipping {}: {e}", path.display()),
            }
        }
        Ok(count)
    }

    pub fn trusted_certificates(&self) -> &[Certificate] {
        &self.trusted
    }

    /// Set the system's own signing credentials. Their certificate is
    /// trusted as well.
    pub fn set_system_credentials(&mut self, credentials: KeyMaterial) {
        use crate::provider::SignatureProvider;
        self.add_trusted_certificate(credentials.certificate().clone());
        self.system_credentials = Some(credentials);
    }

    pub fn system_credentials(&self) -> Option<&KeyMaterial> {
        self.system_credentials.as_ref()
    }
}

impl TrustStore for CredentialVault {
    fn is_trusted(&self, certificate: &Certificate) -> bool {
        self.trusted.contains(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_PEM: &str = include_str!("../../../test-data/keys/signer-key.pem");
    const CERT_PEM: &str = include_str!("../../../test-data/keys/signer-cert.pem");
    const RENEWED_PEM: &str = include_str!("../../../test-data/keys/signer-cert-renewed.pem");

    #[test]
    fn test_membership() {
        let cert = Certificate::from_pem(CERT_PEM.as_bytes()).unwrap();
        let renewed = Certificate::from_pem(RENEWED_PEM.as_bytes()).unwrap();
        let mut vault = CredentialVault::new();
        assert!(!vault.is_trusted(&cert));
        vault.add_trusted_certificate(cert.clone());
        vault.add_trusted_certificate(cert.clone());
        assert_eq!(vault.trusted_certificates().len(), 1);
        assert!(vault.is_trusted(&cert));
        // same key, different certificate
        assert!(!vault.is_trusted(&renewed));
    }

    #[test]
    fn test_system_credentials_are_trusted() {
        let km = KeyMaterial::from_pem(KEY_PEM.as_bytes(), CERT_PEM.as_bytes()).unwrap();
        let mut vault = CredentialVault::new();
        vault.set_system_credentials(km);
        let cert = Certificate::from_pem(CERT_PEM.as_bytes()).unwrap();
        assert!(vault.is_trusted(&cert));
        assert!(vault.system_credentials().is_some());
    }

    #[test]
    fn test_load_trusted_dir() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/keys");
        let mut vault = CredentialVault::new();
        // three certificates; the two key files fail to parse and are skipped
        assert_eq!(vault.load_trusted_dir(&dir).unwrap(), 3);
    }
}
