mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tillid::core::Error;
use tillid::dsig::{
    sign, IdCardValidator, InvalidKind, SignatureConfiguration, SignatureReference, TrustPolicy,
    Validator, VerifyResult,
};
use tillid::federation::{
    CertificateCache, CertificateCategory, CertificateResolver, CertificateStore,
    FederationCertificateReference, FederationCertificateResolver, MemoryCertificateCache,
    OcesFederation, OcesVersion, StaticCertificateStore,
};
use tillid::keys::Certificate;
use tillid::xml::XmlDocument;

use common::*;

const SIGNER_REFERENCE: &str = "OCES2,CVR:30808460-FID:94731315,4c0a2b1f";

/// A remote directory that counts lookups and answers slowly.
struct SlowDirectory {
    inner: StaticCertificateStore,
    calls: AtomicUsize,
}

impl SlowDirectory {
    fn serving(pems: &[&[u8]]) -> Arc<Self> {
        let mut inner = StaticCertificateStore::new();
        for pem in pems {
            inner.insert(certificate(pem)).unwrap();
        }
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CertificateStore for SlowDirectory {
    fn fetch(&self, subject_serial_number: &str) -> Result<Certificate, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        self.inner.fetch(subject_serial_number)
    }
}

fn resolver(
    directory: Arc<SlowDirectory>,
    cache: Arc<MemoryCertificateCache>,
) -> Arc<FederationCertificateResolver> {
    Arc::new(FederationCertificateResolver::new(cache).with_store(OcesVersion::Oces2, directory))
}

fn resolve_concurrently(
    resolver: Arc<FederationCertificateResolver>,
    references: Vec<FederationCertificateReference>,
    threads_per_reference: usize,
) -> Vec<Result<Certificate, Error>> {
    let barrier = Arc::new(Barrier::new(references.len() * threads_per_reference));
    let handles: Vec<_> = references
        .into_iter()
        .flat_map(|r| std::iter::repeat(r).take(threads_per_reference))
        .map(|reference| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve(&reference)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_misses_share_one_fetch() {
    let directory = SlowDirectory::serving(&[SIGNER_CERT]);
    let cache = Arc::new(MemoryCertificateCache::new());
    let resolver = resolver(directory.clone(), cache.clone());
    let reference: FederationCertificateReference = SIGNER_REFERENCE.parse().unwrap();

    let results = resolve_concurrently(resolver.clone(), vec![reference.clone()], 16);
    let expected = certificate(SIGNER_CERT);
    for result in results {
        assert_eq!(result.unwrap(), expected);
    }
    assert_eq!(directory.calls(), 1);
    assert_eq!(cache.len(), 1);

    // later lookups are served from the cache
    resolver.resolve(&reference).unwrap();
    assert_eq!(directory.calls(), 1);
}

#[test]
fn test_different_keys_fetch_independently() {
    let directory = SlowDirectory::serving(&[SIGNER_CERT, OTHER_CERT]);
    let cache = Arc::new(MemoryCertificateCache::new());
    let other = FederationCertificateReference::for_certificate(
        OcesVersion::Oces2,
        &certificate(OTHER_CERT),
    )
    .unwrap();
    let results = resolve_concurrently(
        resolver(directory.clone(), cache.clone()),
        vec![SIGNER_REFERENCE.parse().unwrap(), other],
        8,
    );
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(directory.calls(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_concurrent_serial_mismatch_is_never_cached() {
    // the directory already publishes the renewed certificate
    let directory = SlowDirectory::serving(&[SIGNER_RENEWED]);
    let cache = Arc::new(MemoryCertificateCache::new());
    let resolver = resolver(directory.clone(), cache.clone());

    let results = resolve_concurrently(resolver.clone(), vec![SIGNER_REFERENCE.parse().unwrap()], 8);
    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, Error::SerialMismatch { .. }));
        assert_eq!(err.kind(), tillid::core::ErrorKind::Lookup);
    }
    assert!(cache.is_empty());
    assert!(cache
        .get(CertificateCategory::FederationCertificate, SIGNER_REFERENCE)
        .is_none());

    // a failed fetch is retried on the next call
    let calls = directory.calls();
    let reference: FederationCertificateReference = SIGNER_REFERENCE.parse().unwrap();
    assert!(resolver.resolve(&reference).is_err());
    assert_eq!(directory.calls(), calls + 1);
}

fn sosi(published: &[&[u8]]) -> (Arc<FederationCertificateResolver>, TrustPolicy) {
    let mut store = StaticCertificateStore::new();
    for pem in published {
        store.insert(certificate(pem)).unwrap();
    }
    let resolver = Arc::new(
        FederationCertificateResolver::new(Arc::new(MemoryCertificateCache::new()))
            .with_store(OcesVersion::Oces2, Arc::new(store)),
    );
    let federation = OcesFederation::new("SOSI", OcesVersion::Oces2, resolver.clone())
        .with_trusted_subject("CVR:30808460-FID:94731315");
    (resolver, TrustPolicy::Federation(Arc::new(federation)))
}

fn signed_id_card(key_name: bool) -> XmlDocument {
    let mut doc = dgws_request();
    let mut config = SignatureConfiguration::new(vec![SignatureReference::enveloped("IDCard")])
        .with_parent("IDCard");
    if key_name {
        config = config.with_certificate_reference(OcesVersion::Oces2);
    }
    sign(&signer(), &mut doc, &config).unwrap();
    doc
}

#[test]
fn test_id_card_signed_with_key_name() {
    let doc = signed_id_card(true);
    assert!(doc
        .text()
        .contains(&format!("<ds:KeyName>{SIGNER_REFERENCE}</ds:KeyName>")));
    let (resolver, policy) = sosi(&[SIGNER_CERT]);
    let validator = IdCardValidator::new(Validator::new().with_resolver(resolver));
    assert_eq!(validator.verify(&doc, &policy).unwrap(), VerifyResult::Valid);
}

#[test]
fn test_id_card_with_embedded_certificate() {
    let doc = signed_id_card(false);
    let (_, policy) = sosi(&[SIGNER_CERT]);
    assert!(IdCardValidator::default().validate(&doc, &policy).unwrap());
}

#[test]
fn test_id_card_from_unlisted_subject() {
    let mut doc = dgws_request();
    let other = tillid::keys::KeyMaterial::from_pem(OTHER_KEY, OTHER_CERT).unwrap();
    let config = SignatureConfiguration::new(vec![SignatureReference::enveloped("IDCard")])
        .with_parent("IDCard");
    sign(&other, &mut doc, &config).unwrap();

    // published, but not one of the federation's trusted subjects
    let (_, policy) = sosi(&[SIGNER_CERT, OTHER_CERT]);
    assert!(matches!(
        IdCardValidator::default().verify(&doc, &policy).unwrap(),
        VerifyResult::Invalid { kind: InvalidKind::Trust, .. }
    ));
}

#[test]
fn test_id_card_after_certificate_renewal() {
    // the federation now publishes a newer certificate for the subject
    let (_, policy) = sosi(&[SIGNER_RENEWED]);

    let embedded = signed_id_card(false);
    assert!(!IdCardValidator::default().validate(&embedded, &policy).unwrap());

    let named = signed_id_card(true);
    let err = IdCardValidator::default().verify(&named, &policy).unwrap_err();
    assert!(matches!(err, Error::SerialMismatch { .. }));
}

#[test]
fn test_id_card_tampered_after_signing() {
    let doc = XmlDocument::parse(
        signed_id_card(true)
            .text()
            .replace("<saml:AttributeValue>1.0.1", "<saml:AttributeValue>1.0.2"),
    )
    .unwrap();
    let (_, policy) = sosi(&[SIGNER_CERT]);
    assert!(matches!(
        IdCardValidator::default().verify(&doc, &policy).unwrap(),
        VerifyResult::Invalid { kind: InvalidKind::Digest, .. }
    ));
}
