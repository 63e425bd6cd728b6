#![forbid(unsafe_code)]

//! Remote certificate stores.
//!
//! A store is the authoritative source of federation certificates for one
//! OCES generation, keyed by subject serial number. The wire protocol used
//! by a production directory is pluggable behind [`CertificateStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tillid_core::Error;
use tillid_keys::{loader, Certificate};

/// Fetches the current certificate of a subject.
pub trait CertificateStore: Send + Sync {
    /// Returns [`Error::CertificateNotFound`] when the subject is unknown and
    /// [`Error::LookupFailed`] when the store could not be queried.
    fn fetch(&self, subject_serial_number: &str) -> Result<Certificate, Error>;
}

/// An in-memory store.
#[derive(Debug, Clone, Default)]
pub struct StaticCertificateStore {
    certificates: HashMap<String, Certificate>,
}

impl StaticCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate under its own subject serial number.
    pub fn insert(&mut self, certificate: Certificate) -> Result<(), Error> {
        let subject = certificate
            .subject_serial_number()
            .ok_or_else(|| {
                Error::Certificate(format!(
                    "certificate {} has no subject serial number",
                    certificate.subject()
                ))
            })?
            .to_owned();
        self.certificates.insert(subject, certificate);
        Ok(())
    }
}

impl CertificateStore for StaticCertificateStore {
    fn fetch(&self, subject_serial_number: &str) -> Result<Certificate, Error> {
        self.certificates
            .get(subject_serial_number)
            .cloned()
            .ok_or_else(|| Error::CertificateNotFound(subject_serial_number.to_owned()))
    }
}

/// Serves certificates from PEM or DER files in a directory, matched on
/// the subject serial number inside each certificate.
#[derive(Debug, Clone)]
pub struct DirectoryCertificateStore {
    dir: PathBuf,
}

impl DirectoryCertificateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CertificateStore for DirectoryCertificateStore {
    fn fetch(&self, subject_serial_number: &str) -> Result<Certificate, Error> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| Error::LookupFailed(format!("{}: {e}", self.dir.display())))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        for path in paths {
            let Ok(cert) = loader::load_certificate_file(&path) else {
                continue;
            };
            if cert.subject_serial_number() == Some(subject_serial_number) {
                log::debug!("found {subject_serial_number} in {}", path.display());
                return Ok(cert);
            }
        }
        Err(Error::CertificateNotFound(subject_serial_number.to_owned()))
    }
}
