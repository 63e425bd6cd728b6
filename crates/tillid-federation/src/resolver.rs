#![forbid(unsafe_code)]

//! Caching resolution of federation certificate references.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tillid_core::Error;
use tillid_keys::Certificate;

use crate::cache::{CertificateCache, CertificateCategory};
use crate::reference::{FederationCertificateReference, OcesVersion};
use crate::store::CertificateStore;

/// Resolves a federation reference to the certificate it names.
pub trait CertificateResolver: Send + Sync {
    fn resolve(&self, reference: &FederationCertificateReference) -> Result<Certificate, Error>;
}

type Slot = Arc<OnceLock<Result<Certificate, Error>>>;

/// Resolves references through a cache in front of per-generation stores.
///
/// Cache keys are the full reference string, so a renewed certificate
/// (new serial) is a new entry. Concurrent misses on one key share a
/// single remote fetch; misses on different keys proceed independently.
pub struct FederationCertificateResolver {
    stores: HashMap<OcesVersion, Arc<dyn CertificateStore>>,
    cache: Arc<dyn CertificateCache>,
    category: CertificateCategory,
    in_flight: Mutex<HashMap<String, Slot>>,
}

impl FederationCertificateResolver {
    pub fn new(cache: Arc<dyn CertificateCache>) -> Self {
        Self {
            stores: HashMap::new(),
            cache,
            category: CertificateCategory::FederationCertificate,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Serve references of `version` from `store`.
    pub fn with_store(mut self, version: OcesVersion, store: Arc<dyn CertificateStore>) -> Self {
        self.stores.insert(version, store);
        self
    }

    /// Cache under a category other than
    /// [`CertificateCategory::FederationCertificate`].
    pub fn with_category(mut self, category: CertificateCategory) -> Self {
        self.category = category;
        self
    }

    pub fn cache(&self) -> &Arc<dyn CertificateCache> {
        &self.cache
    }

    fn fetch_validated(
        &self,
        store: &dyn CertificateStore,
        reference: &FederationCertificateReference,
        key: &str,
    ) -> Result<Certificate, Error> {
        log::debug!("fetching certificate for {key}");
        let certificate = store.fetch(reference.subject_serial_number())?;
        let subject = certificate.subject_serial_number().unwrap_or("");
        if subject != reference.subject_serial_number() {
            log::warn!("store returned subject {subject:?} for {key}");
            return Err(Error::SubjectMismatch {
                expected: reference.subject_serial_number().to_owned(),
                actual: subject.to_owned(),
            });
        }
        let actual = certificate.serial_hex();
        if actual != reference.certificate_serial_number() {
            log::warn!(
                "store returned serial {actual} for {key}, expected {}",
                reference.certificate_serial_number()
            );
            return Err(Error::SerialMismatch {
                expected: reference.certificate_serial_number().to_owned(),
                actual,
            });
        }
        self.cache.insert(self.category, key, certificate.clone());
        Ok(certificate)
    }
}

impl CertificateResolver for FederationCertificateResolver {
    fn resolve(&self, reference: &FederationCertificateReference) -> Result<Certificate, Error> {
        let key = reference.to_string();
        if let Some(cert) = self.cache.get(self.category, &key) {
            log::debug!("certificate cache hit for {key}");
            return Ok(cert);
        }

        let store = self
            .stores
            .get(&reference.oces_version())
            .ok_or_else(|| Error::NotSupported(format!("no store for {}", reference.oces_version())))?
            .clone();

        let slot = {
            let mut in_flight = self.in_flight.lock();
            if let Some(slot) = in_flight.get(&key) {
                slot.clone()
            } else {
                // A fetch for this key may have completed since the first
                // cache check.
                if let Some(cert) = self.cache.get(self.category, &key) {
                    return Ok(cert);
                }
                let slot = Slot::default();
                in_flight.insert(key.clone(), slot.clone());
                slot
            }
        };

        let mut fetched_here = false;
        let result = slot
            .get_or_init(|| {
                fetched_here = true;
                self.fetch_validated(store.as_ref(), reference, &key)
            })
            .clone();

        if fetched_here {
            let mut in_flight = self.in_flight.lock();
            if in_flight.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                in_flight.remove(&key);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCertificateCache;
    use crate::store::StaticCertificateStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIGNER: &[u8] = include_bytes!("../../../test-data/keys/signer-cert.pem");
    const RENEWED: &[u8] = include_bytes!("../../../test-data/keys/signer-cert-renewed.pem");
    const OTHER: &[u8] = include_bytes!("../../../test-data/keys/other-cert.pem");

    struct CountingStore {
        inner: StaticCertificateStore,
        calls: AtomicUsize,
    }

    impl CertificateStore for CountingStore {
        fn fetch(&self, subject: &str) -> Result<Certificate, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(subject)
        }
    }

    fn counting(pem: &[u8]) -> Arc<CountingStore> {
        let mut inner = StaticCertificateStore::new();
        inner.insert(Certificate::from_pem(pem).unwrap()).unwrap();
        Arc::new(CountingStore {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn reference(serial: &str) -> FederationCertificateReference {
        FederationCertificateReference::new(OcesVersion::Oces2, "CVR:30808460-FID:94731315", serial)
            .unwrap()
    }

    #[test]
    fn test_hit_after_first_fetch() {
        let store = counting(SIGNER);
        let cache = Arc::new(MemoryCertificateCache::new());
        let resolver =
            FederationCertificateResolver::new(cache.clone()).with_store(OcesVersion::Oces2, store.clone());
        let r = reference("4c0a2b1f");
        let first = resolver.resolve(&r).unwrap();
        let second = resolver.resolve(&r).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert!(cache
            .get(CertificateCategory::FederationCertificate, "OCES2,CVR:30808460-FID:94731315,4c0a2b1f")
            .is_some());
    }

    #[test]
    fn test_serial_mismatch_not_cached() {
        // the store already serves the renewed certificate
        let store = counting(RENEWED);
        let cache = Arc::new(MemoryCertificateCache::new());
        let resolver =
            FederationCertificateResolver::new(cache.clone()).with_store(OcesVersion::Oces2, store.clone());
        let r = reference("4c0a2b1f");
        for _ in 0..2 {
            let err = resolver.resolve(&r).unwrap_err();
            assert!(matches!(err, Error::SerialMismatch { ref actual, .. } if actual == "4c0a2b20"));
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
        assert!(resolver.resolve(&reference("4c0a2b20")).is_ok());
    }

    /// Publishes one certificate under every subject it is asked for.
    struct MisfiledStore(Certificate);

    impl CertificateStore for MisfiledStore {
        fn fetch(&self, _subject: &str) -> Result<Certificate, Error> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_subject_mismatch_not_cached() {
        let cache = Arc::new(MemoryCertificateCache::new());
        let store = Arc::new(MisfiledStore(Certificate::from_pem(OTHER).unwrap()));
        let resolver = FederationCertificateResolver::new(cache.clone()).with_store(OcesVersion::Oces2, store);
        // the serial is right, the subject is not
        let other = Certificate::from_pem(OTHER).unwrap();
        let r = FederationCertificateReference::new(
            OcesVersion::Oces2,
            "CVR:30808460-FID:94731315",
            &other.serial_hex(),
        )
        .unwrap();
        let err = resolver.resolve(&r).unwrap_err();
        assert_eq!(
            err,
            Error::SubjectMismatch {
                expected: "CVR:30808460-FID:94731315".into(),
                actual: "CVR:11111111-FID:22222222".into(),
            }
        );
        assert_eq!(err.kind(), tillid_core::ErrorKind::Lookup);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let resolver = FederationCertificateResolver::new(Arc::new(MemoryCertificateCache::new()))
            .with_store(OcesVersion::Oces2, counting(SIGNER));
        let r = FederationCertificateReference::new(OcesVersion::Oces3, "x", "01").unwrap();
        assert!(matches!(resolver.resolve(&r), Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_not_found_propagates() {
        let resolver = FederationCertificateResolver::new(Arc::new(MemoryCertificateCache::new()))
            .with_store(OcesVersion::Oces2, counting(SIGNER));
        let r = FederationCertificateReference::new(OcesVersion::Oces2, "CVR:1-FID:2", "01").unwrap();
        assert!(matches!(resolver.resolve(&r), Err(Error::CertificateNotFound(_))));
    }

    #[test]
    fn test_category() {
        let cache = Arc::new(MemoryCertificateCache::new());
        let resolver = FederationCertificateResolver::new(cache.clone())
            .with_store(OcesVersion::Oces2, counting(SIGNER))
            .with_category(CertificateCategory::IssuerCertificate);
        resolver.resolve(&reference("4c0a2b1f")).unwrap();
        assert_eq!(cache.entries()[0].category, CertificateCategory::IssuerCertificate);
    }
}
