#![forbid(unsafe_code)]

//! WS-Security STR-Transform.
//!
//! Replaces a `wsse:SecurityTokenReference` by the token it references and
//! canonicalizes the token with the method named in the transform's
//! `wsse:TransformationParameters` (always exclusive C14N here).

use roxmltree::Node;
use tillid_core::{algorithm, ns, Error};
use tillid_xml::document::{count_by_id, find_by_id, find_child_element};
use tillid_xml::xpath;

use crate::pipeline::{Transform, TransformData};

/// Dereference a `wsse:SecurityTokenReference` to the token element.
///
/// The token is named either by a `wsse:KeyIdentifier` holding its ID or
/// by a `wsse:Reference` with a same-document `URI`. The ID must be carried
/// by exactly one element.
pub fn dereference_token<'a, 'input>(
    str_node: Node<'a, 'input>,
    extra_id_attrs: &[String],
) -> Result<Node<'a, 'input>, Error> {
    let token_id = if let Some(ki) = find_child_element(str_node, ns::WSSE, ns::node::KEY_IDENTIFIER) {
        ki.text().map(str::trim).unwrap_or("")
    } else if let Some(r) = find_child_element(str_node, ns::WSSE, ns::node::REFERENCE) {
        let uri = r
            .attribute(ns::attr::URI)
            .ok_or_else(|| Error::MissingAttribute("wsse:Reference/@URI".into()))?;
        xpath::parse_same_document_ref(uri)
            .ok_or_else(|| Error::InvalidUri(format!("token reference: {uri}")))?
    } else {
        return Err(Error::MissingElement("wsse:KeyIdentifier".into()));
    };
    if token_id.is_empty() {
        return Err(Error::TokenReferenceMismatch("empty token identifier".into()));
    }

    let doc = str_node.document();
    match count_by_id(doc, token_id, extra_id_attrs) {
        0 => Err(Error::TokenReferenceMismatch(format!(
            "no token with ID {token_id}"
        ))),
        1 => find_by_id(doc, token_id, extra_id_attrs).ok_or_else(|| {
            Error::TokenReferenceMismatch(format!("no token with ID {token_id}"))
        }),
        n => Err(Error::DuplicateElement(format!("token with ID {token_id}"), n)),
    }
}

/// The STR-Transform.
#[derive(Debug, Clone, Default)]
pub struct StrTransform {
    inclusive_prefixes: Vec<String>,
    extra_id_attrs: Vec<String>,
}

impl StrTransform {
    pub fn new(inclusive_prefixes: Vec<String>, extra_id_attrs: Vec<String>) -> Self {
        Self {
            inclusive_prefixes,
            extra_id_attrs,
        }
    }
}

impl Transform for StrTransform {
    fn uri(&self) -> &str {
        algorithm::STR_TRANSFORM
    }

    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        let TransformData::Xml { start, .. } = input else {
            return Err(Error::Transform("STR-Transform requires XML input".into()));
        };
        if start.tag_name().namespace() != Some(ns::WSSE)
            || start.tag_name().name() != ns::node::SECURITY_TOKEN_REFERENCE
        {
            return Err(Error::Transform(format!(
                "STR-Transform applied to <{}>",
                start.tag_name().name()
            )));
        }
        let token = dereference_token(start, &self.extra_id_attrs)?;
        log::debug!(
            "STR-Transform dereferenced token <{}>",
            token.tag_name().name()
        );
        let bytes = tillid_c14n::canonicalize_subtree(token, None, &self.inclusive_prefixes)?;
        Ok(TransformData::Binary(bytes))
    }
}
