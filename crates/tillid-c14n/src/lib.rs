#![forbid(unsafe_code)]

//! Exclusive XML canonicalization for the Tillid trust engine.
//!
//! Every signature in the supported profiles uses Exclusive C14N 1.0
//! without comments, both for `SignedInfo` and for reference transforms.

pub mod escape;
pub mod exclusive;
pub mod render;

use tillid_core::{algorithm, Error};
use tillid_xml::NodeSet;

pub use exclusive::canonicalize_subtree;

/// Check that `uri` names a canonicalization method this crate implements.
pub fn ensure_supported(uri: &str) -> Result<(), Error> {
    if uri == algorithm::EXC_C14N {
        Ok(())
    } else {
        Err(Error::UnsupportedAlgorithm(format!("canonicalization: {uri}")))
    }
}

/// Parse `xml` and canonicalize it.
///
/// - `node_set`: restricts output to a document subset
/// - `inclusive_prefixes`: the InclusiveNamespaces PrefixList
pub fn canonicalize(
    xml: &str,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, tillid_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    exclusive::canonicalize(&doc, node_set, inclusive_prefixes)
}

/// Canonicalize a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    exclusive::canonicalize(doc, node_set, inclusive_prefixes)
}
