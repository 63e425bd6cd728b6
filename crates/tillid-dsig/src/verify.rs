#![forbid(unsafe_code)]

//! XML-DSig signature validation.
//!
//! Processing order:
//! 1. Select exactly one `<Signature>` and read `SignedInfo`
//! 2. Resolve the signing certificate from `KeyInfo`
//! 3. Check trust against the policy's authority
//! 4. Check completeness when a [`LibertyValidator`] is attached
//! 5. Recompute every reference digest, then verify `SignatureValue`

use std::fmt;
use std::sync::Arc;

use roxmltree::Node;
use tillid_core::{ns, Error};
use tillid_crypto::SigningKey;
use tillid_federation::{CertificateResolver, Federation};
use tillid_keys::{Certificate, TrustStore};
use tillid_xml::{NodeSelector, XmlDocument};

use crate::context::DsigContext;
use crate::keyinfo::KeyInfoContent;
use crate::liberty::LibertyValidator;
use crate::signature::ParsedSignature;

/// Why a signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidKind {
    /// A reference digest did not match.
    Digest,
    /// The signature value did not verify.
    Signature,
    /// The certificate is not trusted by the authority.
    Trust,
}

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Signature is valid.
    Valid,
    /// Signature is invalid.
    Invalid { kind: InvalidKind, reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }

    /// Turn a rejection into the matching error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            VerifyResult::Valid => Ok(()),
            VerifyResult::Invalid { kind, reason } => Err(match kind {
                InvalidKind::Digest => Error::DigestMismatch(reason),
                InvalidKind::Signature => Error::SignatureInvalid(reason),
                InvalidKind::Trust => Error::Untrusted(reason),
            }),
        }
    }
}

/// Who decides whether the signing certificate is trusted.
#[derive(Clone, Default)]
pub enum TrustPolicy {
    #[default]
    None,
    Federation(Arc<dyn Federation>),
    TrustStore(Arc<dyn TrustStore>),
}

impl TrustPolicy {
    /// Build a policy from optional parts. At most one may be given.
    pub fn from_parts(
        federation: Option<Arc<dyn Federation>>,
        trust_store: Option<Arc<dyn TrustStore>>,
    ) -> Result<Self, Error> {
        match (federation, trust_store) {
            (Some(_), Some(_)) => Err(Error::Config(
                "both a federation and a trust store were given".into(),
            )),
            (Some(f), None) => Ok(TrustPolicy::Federation(f)),
            (None, Some(s)) => Ok(TrustPolicy::TrustStore(s)),
            (None, None) => Ok(TrustPolicy::None),
        }
    }
}

impl fmt::Debug for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustPolicy::None => f.write_str("TrustPolicy::None"),
            TrustPolicy::Federation(fed) => write!(f, "TrustPolicy::Federation({})", fed.name()),
            TrustPolicy::TrustStore(_) => f.write_str("TrustPolicy::TrustStore(..)"),
        }
    }
}

/// Validates signatures in documents.
#[derive(Clone)]
pub struct Validator {
    ctx: DsigContext,
    resolver: Option<Arc<dyn CertificateResolver>>,
    check_trust: bool,
    completeness: Option<LibertyValidator>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator that checks trust and has no federation lookup.
    pub fn new() -> Self {
        Self {
            ctx: DsigContext::new(),
            resolver: None,
            check_trust: true,
            completeness: None,
        }
    }

    /// Resolve `ds:KeyName` references through `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn CertificateResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_context(mut self, ctx: DsigContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_id_attr(mut self, name: &str) -> Self {
        self.ctx.add_id_attr(name);
        self
    }

    /// Skip the trust step. Only the cryptography is checked.
    pub fn check_trust(mut self, check: bool) -> Self {
        self.check_trust = check;
        self
    }

    /// Require the signature to cover what `liberty` demands.
    pub fn with_completeness(mut self, liberty: LibertyValidator) -> Self {
        self.completeness = Some(liberty);
        self
    }

    pub fn context(&self) -> &DsigContext {
        &self.ctx
    }

    /// Verify the signature `selector` identifies.
    pub fn verify(
        &self,
        doc: &XmlDocument,
        selector: &NodeSelector,
        policy: &TrustPolicy,
    ) -> Result<VerifyResult, Error> {
        let parsed = doc.parse_doc()?;
        let id_attrs = self.ctx.id_attrs_for(doc);
        let node = select_signature(&parsed, selector, &id_attrs)?;
        let signature = ParsedSignature::read(node)?;

        let key_info = signature
            .key_info
            .ok_or_else(|| Error::MissingElement("ds:KeyInfo".into()))?;
        let content = KeyInfoContent::read(key_info)?;
        let certificate = self.certificate_for(&content, policy)?;

        if self.check_trust {
            if let Some(reason) = untrusted(&content, &certificate, policy)? {
                log::warn!("signature {selector} rejected: {reason}");
                return Ok(VerifyResult::Invalid {
                    kind: InvalidKind::Trust,
                    reason,
                });
            }
        }

        if let Some(liberty) = &self.completeness {
            liberty.check(&signature, &id_attrs)?;
        }

        let result = check_signature(&self.ctx, &signature, &certificate, &id_attrs)?;
        match &result {
            VerifyResult::Valid => log::info!(
                "signature {selector} valid, signed by {}",
                certificate.subject()
            ),
            VerifyResult::Invalid { reason, .. } => {
                log::warn!("signature {selector} rejected: {reason}")
            }
        }
        Ok(result)
    }

    /// Like [`Validator::verify`], reducing the outcome to a boolean.
    pub fn validate(
        &self,
        doc: &XmlDocument,
        selector: &NodeSelector,
        policy: &TrustPolicy,
    ) -> Result<bool, Error> {
        Ok(self.verify(doc, selector, policy)?.is_valid())
    }

    /// Verify every selected signature, failing on the first that does not
    /// hold.
    pub fn validate_all_or_throw(
        &self,
        doc: &XmlDocument,
        selectors: &[NodeSelector],
        policy: &TrustPolicy,
    ) -> Result<(), Error> {
        if selectors.is_empty() {
            return Err(Error::Config("no signatures to validate".into()));
        }
        for selector in selectors {
            self.verify(doc, selector, policy)?.into_result()?;
        }
        Ok(())
    }

    /// The certificate the selected signature claims to be made with,
    /// without checking the signature.
    pub fn signer_certificate(
        &self,
        doc: &XmlDocument,
        selector: &NodeSelector,
        policy: &TrustPolicy,
    ) -> Result<Certificate, Error> {
        let parsed = doc.parse_doc()?;
        let id_attrs = self.ctx.id_attrs_for(doc);
        let node = select_signature(&parsed, selector, &id_attrs)?;
        let key_info = ParsedSignature::read(node)?
            .key_info
            .ok_or_else(|| Error::MissingElement("ds:KeyInfo".into()))?;
        self.certificate_for(&KeyInfoContent::read(key_info)?, policy)
    }

    fn certificate_for(&self, content: &KeyInfoContent, policy: &TrustPolicy) -> Result<Certificate, Error> {
        match content {
            KeyInfoContent::Certificate(cert) => Ok(cert.clone()),
            KeyInfoContent::Reference(reference) => match (&self.resolver, policy) {
                (Some(resolver), _) => resolver.resolve(reference),
                (None, TrustPolicy::Federation(federation)) => federation.certificate_for(reference),
                (None, _) => Err(Error::Config(format!(
                    "no certificate resolver for key name {reference}"
                ))),
            },
        }
    }
}

/// Find the one `ds:Signature` the selector names.
fn select_signature<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    selector: &NodeSelector,
    id_attrs: &[String],
) -> Result<Node<'a, 'input>, Error> {
    let found: Vec<_> = selector
        .select_all(doc, id_attrs)
        .into_iter()
        .filter(|n| {
            n.tag_name().namespace() == Some(ns::DSIG) && n.tag_name().name() == ns::node::SIGNATURE
        })
        .collect();
    match found.as_slice() {
        [] => Err(Error::MissingElement(format!("ds:Signature at {selector}"))),
        [node] => Ok(*node),
        many => Err(Error::DuplicateElement(format!("ds:Signature at {selector}"), many.len())),
    }
}

/// The reason the certificate is not trusted, if it is not.
fn untrusted(
    content: &KeyInfoContent,
    certificate: &Certificate,
    policy: &TrustPolicy,
) -> Result<Option<String>, Error> {
    match policy {
        TrustPolicy::None => Err(Error::Config(
            "trust check requested without a trust authority".into(),
        )),
        TrustPolicy::Federation(federation) => {
            let trusted = match content {
                KeyInfoContent::Reference(reference) => {
                    federation.certificate_for(reference)? == *certificate
                }
                KeyInfoContent::Certificate(_) => federation.is_trusted_certificate(certificate)?,
            };
            Ok((!trusted).then(|| {
                format!("{} is not vouched for by {}", certificate.subject(), federation.name())
            }))
        }
        TrustPolicy::TrustStore(store) => Ok((!store.is_trusted(certificate))
            .then(|| format!("{} is not in the trust store", certificate.subject()))),
    }
}

/// Recompute the reference digests and verify the signature value with
/// `certificate`'s public key.
pub(crate) fn check_signature(
    ctx: &DsigContext,
    signature: &ParsedSignature<'_, '_>,
    certificate: &Certificate,
    id_attrs: &[String],
) -> Result<VerifyResult, Error> {
    for reference in &signature.references {
        let actual = reference.compute_digest(signature.node.id(), ctx, id_attrs)?;
        if actual != reference.expected_digest()? {
            log::debug!("digest mismatch for {}", reference.uri);
            return Ok(VerifyResult::Invalid {
                kind: InvalidKind::Digest,
                reason: format!("digest mismatch for {}", reference.uri),
            });
        }
        log::debug!("reference {} digest ok", reference.uri);
    }

    let signed_info = signature.canonical_signed_info()?;
    ctx.trace_bytes("pre-signature data", &signed_info);
    let algorithm = tillid_crypto::sign::from_uri(signature.signature_method)?;
    let key = SigningKey::RsaPublic(certificate.public_key().clone());
    if algorithm.verify(&key, &signed_info, &signature.signature_value_bytes()?)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            kind: InvalidKind::Signature,
            reason: "signature value verification failed".into(),
        })
    }
}
