#![forbid(unsafe_code)]

//! What a signature covers and where it goes.

use tillid_core::{algorithm, ns, Error};
use tillid_federation::OcesVersion;
use tillid_xml::writer::XmlWriter;
use tillid_xml::NodeSelector;

/// How a reference target is transformed before digesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Exclusive C14N of the target.
    DirectNotEnveloped,
    /// Enveloped-signature transform, then exclusive C14N.
    DirectEnveloped,
    /// STR-Transform: the target is a `wsse:SecurityTokenReference` and
    /// the digest covers the token it points at.
    SecurityTokenReference,
}

impl ReferenceKind {
    /// Transform algorithm URIs in the order they are applied.
    pub fn transform_uris(self) -> &'static [&'static str] {
        match self {
            ReferenceKind::DirectNotEnveloped => &[algorithm::EXC_C14N],
            ReferenceKind::DirectEnveloped => &[algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N],
            ReferenceKind::SecurityTokenReference => &[algorithm::STR_TRANSFORM],
        }
    }

    /// Write the `ds:Transforms` element for this kind.
    pub(crate) fn write_transforms(self, w: &mut XmlWriter, ds: &str) {
        let transforms = format!("{ds}:Transforms");
        let transform = format!("{ds}:Transform");
        w.start_element(&transforms, &[]);
        for uri in self.transform_uris() {
            if *uri == algorithm::STR_TRANSFORM {
                w.start_element(&transform, &[(ns::attr::ALGORITHM, uri)]);
                let params = format!("{}:{}", ns::prefix::WSSE, ns::node::TRANSFORMATION_PARAMETERS);
                let xmlns = format!("xmlns:{}", ns::prefix::WSSE);
                w.start_element(&params, &[(xmlns.as_str(), ns::WSSE)]);
                w.empty_element(
                    &format!("{ds}:CanonicalizationMethod"),
                    &[(ns::attr::ALGORITHM, algorithm::EXC_C14N)],
                );
                w.end_element(&params);
                w.end_element(&transform);
            } else {
                w.empty_element(&transform, &[(ns::attr::ALGORITHM, uri)]);
            }
        }
        w.end_element(&transforms);
    }
}

/// One element to sign, named by its ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureReference {
    pub element_id: String,
    pub kind: ReferenceKind,
}

impl SignatureReference {
    pub fn new(element_id: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            element_id: element_id.into(),
            kind,
        }
    }

    pub fn not_enveloped(element_id: impl Into<String>) -> Self {
        Self::new(element_id, ReferenceKind::DirectNotEnveloped)
    }

    pub fn enveloped(element_id: impl Into<String>) -> Self {
        Self::new(element_id, ReferenceKind::DirectEnveloped)
    }

    pub fn token_reference(element_id: impl Into<String>) -> Self {
        Self::new(element_id, ReferenceKind::SecurityTokenReference)
    }

    /// The `URI` attribute value (`#id`).
    pub fn uri(&self) -> String {
        format!("#{}", self.element_id)
    }
}

/// Everything the signer needs to know about one signature.
#[derive(Debug, Clone)]
pub struct SignatureConfiguration {
    /// Elements to sign, in `SignedInfo` order.
    pub references: Vec<SignatureReference>,
    /// ID of the element the signature is appended to. The document
    /// element when `None`.
    pub signature_parent_id: Option<String>,
    /// Additional ID attribute name used to resolve references.
    pub id_attribute_name: Option<String>,
    /// Publish a federation certificate reference in `ds:KeyName` instead
    /// of embedding the certificate.
    pub add_certificate_as_reference: bool,
    /// Insert the signature immediately before this node instead of
    /// appending it.
    pub signature_sibling: Option<NodeSelector>,
    /// `Id` attribute for the generated `ds:KeyInfo`.
    pub key_info_id: Option<String>,
    /// OCES generation written into a `ds:KeyName` reference.
    pub reference_version: OcesVersion,
}

impl SignatureConfiguration {
    pub fn new(references: Vec<SignatureReference>) -> Self {
        Self {
            references,
            signature_parent_id: None,
            id_attribute_name: None,
            add_certificate_as_reference: false,
            signature_sibling: None,
            key_info_id: None,
            reference_version: OcesVersion::default(),
        }
    }

    pub fn with_parent(mut self, id: impl Into<String>) -> Self {
        self.signature_parent_id = Some(id.into());
        self
    }

    pub fn with_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute_name = Some(name.into());
        self
    }

    pub fn with_certificate_reference(mut self, version: OcesVersion) -> Self {
        self.add_certificate_as_reference = true;
        self.reference_version = version;
        self
    }

    pub fn with_sibling(mut self, sibling: NodeSelector) -> Self {
        self.signature_sibling = Some(sibling);
        self
    }

    pub fn with_key_info_id(mut self, id: impl Into<String>) -> Self {
        self.key_info_id = Some(id.into());
        self
    }

    /// Reject configurations no signature can be built from.
    pub fn validate(&self) -> Result<(), Error> {
        if self.references.is_empty() {
            return Err(Error::Config("signature configuration has no references".into()));
        }
        if let Some(r) = self.references.iter().find(|r| r.element_id.is_empty()) {
            return Err(Error::Config(format!("empty element ID in {:?} reference", r.kind)));
        }
        for (i, r) in self.references.iter().enumerate() {
            if self.references[..i].iter().any(|o| o.element_id == r.element_id) {
                return Err(Error::Config(format!("element {} referenced twice", r.element_id)));
            }
        }
        if matches!(self.signature_parent_id.as_deref(), Some("")) {
            return Err(Error::Config("empty signature parent ID".into()));
        }
        Ok(())
    }
}
