#![forbid(unsafe_code)]

//! Completeness of Liberty ID-WSF message signatures.
//!
//! A Liberty message signature lives in `wsse:Security` and must cover the
//! addressing headers, the timestamp, the body and the reference to the
//! embedded token.

use roxmltree::NodeId;
use tillid_core::Error;
use tillid_transforms::str_transform::dereference_token;
use tillid_xml::{tags, NodeSelector, TagPath, TagPathNavigator};

use crate::signature::ParsedSignature;

fn header(tag: tillid_xml::Tag) -> TagPath {
    TagPath::new(vec![tags::SOAP_ENVELOPE, tags::SOAP_HEADER, tag])
}

fn security(tag: tillid_xml::Tag) -> TagPath {
    TagPath::new(vec![
        tags::SOAP_ENVELOPE,
        tags::SOAP_HEADER,
        tags::WSSE_SECURITY,
        tag,
    ])
}

/// Checks that a signature covers every element a Liberty message must
/// sign.
#[derive(Debug, Clone)]
pub struct LibertyValidator {
    required: Vec<TagPath>,
    when_present: Vec<TagPath>,
    token: TagPath,
}

impl Default for LibertyValidator {
    fn default() -> Self {
        Self {
            required: vec![
                header(tags::WSA_MESSAGE_ID),
                header(tags::WSA_ACTION),
                security(tags::WSU_TIMESTAMP),
                TagPath::new(vec![tags::SOAP_ENVELOPE, tags::SOAP_BODY]),
            ],
            when_present: vec![
                header(tags::WSA_TO),
                header(tags::WSA_RELATES_TO),
                header(tags::SBF_FRAMEWORK),
                security(tags::WSSE_SECURITY_TOKEN_REFERENCE),
            ],
            token: security(tags::SAML_ASSERTION),
        }
    }
}

impl LibertyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require `path` to be signed whenever it is present.
    pub fn with_covered(mut self, path: TagPath) -> Self {
        self.when_present.push(path);
        self
    }

    /// Where the message signature sits.
    pub fn signature_selector() -> NodeSelector {
        NodeSelector::Path(security(tags::DS_SIGNATURE))
    }

    /// Check coverage and the token reference of `signature`.
    pub fn check(&self, signature: &ParsedSignature<'_, '_>, id_attrs: &[String]) -> Result<(), Error> {
        let doc = signature.node.document();
        let mut covered: Vec<NodeId> = Vec::with_capacity(signature.references.len());
        for reference in &signature.references {
            covered.push(reference.target(id_attrs)?.id());
        }

        let nav = TagPathNavigator::new(doc);
        for (path, required) in self
            .required
            .iter()
            .map(|p| (p, true))
            .chain(self.when_present.iter().map(|p| (p, false)))
        {
            let found = nav.resolve_all(doc.root(), path);
            if found.is_empty() && required {
                return Err(Error::MissingElement(path.to_string()));
            }
            if found.iter().any(|n| !covered.contains(&n.id())) {
                log::warn!("{path} is not covered by the message signature");
                return Err(Error::NotCovered(path.to_string()));
            }
        }

        for str_node in nav.resolve_all(doc.root(), &security(tags::WSSE_SECURITY_TOKEN_REFERENCE)) {
            let reference = signature
                .references
                .iter()
                .find(|r| r.target(id_attrs).is_ok_and(|t| t == str_node))
                .ok_or_else(|| Error::NotCovered(tags::WSSE_SECURITY_TOKEN_REFERENCE.to_string()))?;
            if !reference.is_token_reference() {
                return Err(Error::TokenReferenceMismatch(format!(
                    "{} is signed without the STR-Transform",
                    reference.uri
                )));
            }
            let token = dereference_token(str_node, id_attrs)?;
            let expected = nav
                .resolve_from_document(&self.token)
                .ok_or_else(|| Error::MissingElement(self.token.to_string()))?;
            if token != expected {
                return Err(Error::TokenReferenceMismatch(format!(
                    "{} does not reference {}",
                    reference.uri, self.token
                )));
            }
        }
        Ok(())
    }
}
