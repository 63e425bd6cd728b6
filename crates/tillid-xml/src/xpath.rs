#![forbid(unsafe_code)]

//! Reference URI helpers.
//!
//! Only same-document references (`#id-value`) and the ancestor-or-self
//! axis are needed by the signature profiles.

use tillid_core::Error;

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Resolve a same-document reference, failing closed when the ID is
/// missing or carried by more than one element.
pub fn resolve_reference<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    uri: &str,
    extra_id_attrs: &[String],
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    let id = parse_same_document_ref(uri)
        .ok_or_else(|| Error::InvalidUri(format!("not a same-document reference: {uri}")))?;
    match crate::document::count_by_id(doc, id, extra_id_attrs) {
        0 => Err(Error::InvalidUri(format!("ID not found: {id}"))),
        1 => crate::document::find_by_id(doc, id, extra_id_attrs)
            .ok_or_else(|| Error::InvalidUri(format!("ID not found: {id}"))),
        n => Err(Error::DuplicateElement(format!("element with ID {id}"), n)),
    }
}

/// Check if `ancestor` is an ancestor-or-self of `node`.
pub fn is_ancestor_or_self(
    ancestor: roxmltree::Node<'_, '_>,
    node: roxmltree::Node<'_, '_>,
) -> bool {
    node.ancestors().any(|n| n.id() == ancestor.id())
}
