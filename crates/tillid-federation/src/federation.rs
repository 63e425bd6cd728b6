#![forbid(unsafe_code)]

//! Federation trust authorities.

use std::collections::HashSet;
use std::sync::Arc;

use tillid_core::Error;
use tillid_keys::Certificate;

use crate::reference::{FederationCertificateReference, OcesVersion};
use crate::resolver::CertificateResolver;

/// A trust authority that vouches for certificates of its members.
pub trait Federation: Send + Sync {
    fn name(&self) -> &str;

    /// The certificate the federation publishes for `reference`.
    fn certificate_for(&self, reference: &FederationCertificateReference) -> Result<Certificate, Error>;

    /// Decide whether an embedded certificate is one the federation vouches
    /// for. Lookup failures other than "not found" are returned as errors.
    fn is_trusted_certificate(&self, certificate: &Certificate) -> Result<bool, Error>;
}

/// The OCES federation: certificates are published per subject serial
/// number in the OCES directory of one generation.
pub struct OcesFederation {
    name: String,
    version: OcesVersion,
    trusted_subjects: HashSet<String>,
    resolver: Arc<dyn CertificateResolver>,
}

impl OcesFederation {
    pub fn new(name: impl Into<String>, version: OcesVersion, resolver: Arc<dyn CertificateResolver>) -> Self {
        Self {
            name: name.into(),
            version,
            trusted_subjects: HashSet::new(),
            resolver,
        }
    }

    /// Restrict trust for embedded certificates to these subject serial
    /// numbers. Without any, every certificate the directory publishes is
    /// trusted.
    pub fn with_trusted_subject(mut self, subject_serial_number: impl Into<String>) -> Self {
        self.trusted_subjects.insert(subject_serial_number.into());
        self
    }

    pub fn version(&self) -> OcesVersion {
        self.version
    }
}

impl Federation for OcesFederation {
    fn name(&self) -> &str {
        &self.name
    }

    fn certificate_for(&self, reference: &FederationCertificateReference) -> Result<Certificate, Error> {
        self.resolver.resolve(reference)
    }

    fn is_trusted_certificate(&self, certificate: &Certificate) -> Result<bool, Error> {
        let Some(subject) = certificate.subject_serial_number() else {
            return Ok(false);
        };
        if !self.trusted_subjects.is_empty() && !self.trusted_subjects.contains(subject) {
            log::debug!("{subject} is not a trusted subject of {}", self.name);
            return Ok(false);
        }
        let reference = FederationCertificateReference::for_certificate(self.version, certificate)?;
        match self.resolver.resolve(&reference) {
            Ok(published) => Ok(published == *certificate),
            Err(Error::CertificateNotFound(_))
            | Err(Error::SerialMismatch { .. })
            | Err(Error::SubjectMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
