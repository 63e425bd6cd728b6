#![forbid(unsafe_code)]

//! Reading a `ds:Signature` element and recomputing what it signs.

use base64::Engine;
use roxmltree::{Node, NodeId};
use tillid_core::{algorithm, ns, Error};
use tillid_transforms::{
    EnvelopedSignatureTransform, ExcC14nTransform, StrTransform, TransformPipeline,
};
use tillid_xml::document::{find_child_element, find_child_elements};

use crate::context::DsigContext;

/// One step of a reference's transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTransform {
    Enveloped,
    ExcC14n { inclusive_prefixes: Vec<String> },
    SecurityTokenReference { inclusive_prefixes: Vec<String> },
}

/// A `ds:Reference`.
#[derive(Debug, Clone)]
pub struct ParsedReference<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub uri: &'a str,
    pub transforms: Vec<ParsedTransform>,
    pub digest_method: &'a str,
    pub digest_value: Node<'a, 'input>,
}

/// A `ds:Signature` with its `SignedInfo` read.
#[derive(Debug, Clone)]
pub struct ParsedSignature<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub signed_info: Node<'a, 'input>,
    pub c14n_prefixes: Vec<String>,
    pub signature_method: &'a str,
    pub references: Vec<ParsedReference<'a, 'input>>,
    pub signature_value: Node<'a, 'input>,
    pub key_info: Option<Node<'a, 'input>>,
}

fn child<'a, 'input>(parent: Node<'a, 'input>, local: &str) -> Result<Node<'a, 'input>, Error> {
    find_child_element(parent, ns::DSIG, local)
        .ok_or_else(|| Error::MissingElement(format!("ds:{local}")))
}

fn algorithm_attr<'a>(node: Node<'a, '_>) -> Result<&'a str, Error> {
    node.attribute(ns::attr::ALGORITHM).ok_or_else(|| {
        Error::MissingAttribute(format!("Algorithm on {}", node.tag_name().name()))
    })
}

/// Read the InclusiveNamespaces PrefixList below a C14N method element.
pub fn read_inclusive_prefixes(node: Node<'_, '_>) -> Vec<String> {
    find_child_element(node, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES)
        .and_then(|n| n.attribute(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn read_transform(transform: Node<'_, '_>) -> Result<ParsedTransform, Error> {
    match algorithm_attr(transform)? {
        algorithm::ENVELOPED_SIGNATURE => Ok(ParsedTransform::Enveloped),
        algorithm::EXC_C14N => Ok(ParsedTransform::ExcC14n {
            inclusive_prefixes: read_inclusive_prefixes(transform),
        }),
        algorithm::STR_TRANSFORM => {
            let params = find_child_element(transform, ns::WSSE, ns::node::TRANSFORMATION_PARAMETERS)
                .ok_or_else(|| Error::MissingElement("wsse:TransformationParameters".into()))?;
            let method = child(params, ns::node::CANONICALIZATION_METHOD)?;
            tillid_c14n::ensure_supported(algorithm_attr(method)?)?;
            Ok(ParsedTransform::SecurityTokenReference {
                inclusive_prefixes: read_inclusive_prefixes(method),
            })
        }
        other => Err(Error::UnsupportedAlgorithm(format!("transform: {other}"))),
    }
}

impl<'a, 'input> ParsedReference<'a, 'input> {
    fn read(node: Node<'a, 'input>) -> Result<Self, Error> {
        let uri = node
            .attribute(ns::attr::URI)
            .ok_or_else(|| Error::MissingAttribute("URI on Reference".into()))?;
        let transforms = match find_child_element(node, ns::DSIG, ns::node::TRANSFORMS) {
            Some(t) => find_child_elements(t, ns::DSIG, ns::node::TRANSFORM)
                .into_iter()
                .map(read_transform)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let digest_method = algorithm_attr(child(node, ns::node::DIGEST_METHOD)?)?;
        let digest_value = child(node, ns::node::DIGEST_VALUE)?;
        Ok(Self {
            node,
            uri,
            transforms,
            digest_method,
            digest_value,
        })
    }

    /// Whether the chain dereferences a security token reference.
    pub fn is_token_reference(&self) -> bool {
        self.transforms
            .iter()
            .any(|t| matches!(t, ParsedTransform::SecurityTokenReference { .. }))
    }

    /// Build the transform pipeline for this reference.
    pub fn pipeline(&self, signature: NodeId, id_attrs: &[String]) -> TransformPipeline {
        let mut pipeline = TransformPipeline::new();
        for t in &self.transforms {
            match t {
                ParsedTransform::Enveloped => {
                    pipeline.push(Box::new(EnvelopedSignatureTransform::new(signature)))
                }
                ParsedTransform::ExcC14n { inclusive_prefixes } => {
                    pipeline.push(Box::new(ExcC14nTransform::new(inclusive_prefixes.clone())))
                }
                ParsedTransform::SecurityTokenReference { inclusive_prefixes } => pipeline.push(
                    Box::new(StrTransform::new(inclusive_prefixes.clone(), id_attrs.to_vec())),
                ),
            }
        }
        pipeline
    }

    /// The element the URI points at.
    pub fn target(&self, id_attrs: &[String]) -> Result<Node<'a, 'input>, Error> {
        if self.uri.is_empty() {
            return Err(Error::InvalidUri(
                "whole-document references are not supported".into(),
            ));
        }
        tillid_xml::xpath::resolve_reference(self.node.document(), self.uri, id_attrs)
    }

    /// Dereference, transform and digest the target.
    pub fn compute_digest(
        &self,
        signature: NodeId,
        ctx: &DsigContext,
        id_attrs: &[String],
    ) -> Result<Vec<u8>, Error> {
        let data = tillid_transforms::uri::dereference(self.node.document(), self.uri, id_attrs)?;
        let bytes = self.pipeline(signature, id_attrs).execute(data)?;
        ctx.trace_bytes(&format!("pre-digest data for {}", self.uri), &bytes);
        tillid_crypto::digest::digest(self.digest_method, &bytes)
    }

    /// The decoded `DigestValue`.
    pub fn expected_digest(&self) -> Result<Vec<u8>, Error> {
        decode_base64(self.digest_value.text().unwrap_or(""), "DigestValue")
    }
}

impl<'a, 'input> ParsedSignature<'a, 'input> {
    /// Read `node`, which must be a `ds:Signature` element.
    pub fn read(node: Node<'a, 'input>) -> Result<Self, Error> {
        if node.tag_name().namespace() != Some(ns::DSIG)
            || node.tag_name().name() != ns::node::SIGNATURE
        {
            return Err(Error::XmlStructure(format!(
                "<{}> is not a ds:Signature",
                node.tag_name().name()
            )));
        }
        let signed_info = child(node, ns::node::SIGNED_INFO)?;
        let c14n = child(signed_info, ns::node::CANONICALIZATION_METHOD)?;
        tillid_c14n::ensure_supported(algorithm_attr(c14n)?)?;
        let signature_method = algorithm_attr(child(signed_info, ns::node::SIGNATURE_METHOD)?)?;

        let references = find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE)
            .into_iter()
            .map(ParsedReference::read)
            .collect::<Result<Vec<_>, _>>()?;
        if references.is_empty() {
            return Err(Error::MissingElement("ds:Reference".into()));
        }

        Ok(Self {
            node,
            signed_info,
            c14n_prefixes: read_inclusive_prefixes(c14n),
            signature_method,
            references,
            signature_value: child(node, ns::node::SIGNATURE_VALUE)?,
            key_info: find_child_element(node, ns::DSIG, ns::node::KEY_INFO),
        })
    }

    /// Exclusive C14N of `SignedInfo`: the bytes the signature value signs.
    pub fn canonical_signed_info(&self) -> Result<Vec<u8>, Error> {
        tillid_c14n::canonicalize_subtree(self.signed_info, None, &self.c14n_prefixes)
    }

    /// The decoded `SignatureValue`.
    pub fn signature_value_bytes(&self) -> Result<Vec<u8>, Error> {
        decode_base64(self.signature_value.text().unwrap_or(""), "SignatureValue")
    }
}

fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}
