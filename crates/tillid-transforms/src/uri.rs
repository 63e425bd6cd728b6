#![forbid(unsafe_code)]

//! Dereferencing of same-document reference URIs.

use tillid_core::Error;
use tillid_xml::xpath;

use crate::pipeline::TransformData;

/// Resolve `#id` to the subtree of the element carrying that ID.
///
/// The empty URI and external URIs are not used by the supported profiles
/// and are rejected. Ambiguous IDs are rejected.
pub fn dereference<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    uri: &str,
    extra_id_attrs: &[String],
) -> Result<TransformData<'a, 'input>, Error> {
    if uri.is_empty() {
        return Err(Error::InvalidUri(
            "whole-document references are not supported".into(),
        ));
    }
    let node = xpath::resolve_reference(doc, uri, extra_id_attrs)?;
    Ok(TransformData::subtree(node))
}
