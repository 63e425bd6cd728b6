#![forbid(unsafe_code)]

//! Certificate cache.
//!
//! Entries are written once, after a successful and validated remote
//! fetch, and shared read-only afterwards.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tillid_core::Error;
use tillid_keys::Certificate;

/// What a cached certificate was fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateCategory {
    /// A signing certificate named by a federation reference.
    FederationCertificate,
    /// The certificate of a token issuer (identity provider / STS).
    IssuerCertificate,
}

/// A cached certificate.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub certificate: Certificate,
    pub category: CertificateCategory,
}

/// Storage for fetched certificates.
pub trait CertificateCache: Send + Sync {
    fn get(&self, category: CertificateCategory, key: &str) -> Option<Certificate>;

    /// Store a certificate. An existing entry for the same key is kept.
    fn insert(&self, category: CertificateCategory, key: &str, certificate: Certificate);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An unbounded in-memory cache. Readers never block each other.
#[derive(Debug, Default)]
pub struct MemoryCertificateCache {
    map: RwLock<HashMap<(CertificateCategory, String), CacheEntry>>,
}

impl MemoryCertificateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.map.read().values().cloned().collect()
    }

    pub fn clear(&self) {
        self.map.write().clear();
    }
}

impl CertificateCache for MemoryCertificateCache {
    fn get(&self, category: CertificateCategory, key: &str) -> Option<Certificate> {
        self.map
            .read()
            .get(&(category, key.to_owned()))
            .map(|entry| entry.certificate.clone())
    }

    fn insert(&self, category: CertificateCategory, key: &str, certificate: Certificate) {
        let mut map = self.map.write();
        map.entry((category, key.to_owned()))
            .or_insert_with(|| CacheEntry {
                key: key.to_owned(),
                certificate,
                category,
            });
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}

static GLOBAL: OnceLock<Arc<dyn CertificateCache>> = OnceLock::new();

/// Install the process-wide cache. May be called once.
pub fn init_global(cache: Arc<dyn CertificateCache>) -> Result<(), Error> {
    GLOBAL
        .set(cache)
        .map_err(|_| Error::Config("global certificate cache already initialized".into()))
}

/// The process-wide cache installed by [`init_global`].
pub fn global() -> Result<Arc<dyn CertificateCache>, Error> {
    GLOBAL
        .get()
        .cloned()
        .ok_or_else(|| Error::Config("global certificate cache not initialized".into()))
}
