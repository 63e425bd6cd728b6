#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0, without comments.
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//!
//! Only "visibly utilized" namespace declarations are output. A namespace
//! is visibly utilized by an element if its prefix is used by the element's
//! tag name or by one of its attributes, or if the prefix appears in the
//! InclusiveNamespaces PrefixList.

use std::collections::{BTreeMap, BTreeSet};

use roxmltree::{Node, NodeType};
use tillid_core::{ns, Error};
use tillid_xml::document::element_prefix;
use tillid_xml::NodeSet;

use crate::escape;
use crate::render::{Attr, NsDecl};

type Rendered<'a> = BTreeMap<&'a str, &'a str>;

/// Canonicalize the whole document.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    canonicalize_subtree(doc.root(), node_set, inclusive_prefixes)
}

/// Canonicalize starting at `start`. Ancestors of `start` are treated as
/// outside the node set, so nothing they declare is considered rendered.
pub fn canonicalize_subtree(
    start: Node<'_, '_>,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let ctx = ExcC14n {
        node_set,
        inclusive_prefixes: inclusive_prefixes
            .iter()
            .map(|p| if p == "#default" { "" } else { p.as_str() })
            .collect(),
    };
    let mut output = Vec::new();
    ctx.process_node(start, &mut output, &Rendered::new())?;
    Ok(output)
}

struct ExcC14n<'p> {
    node_set: Option<&'p NodeSet>,
    inclusive_prefixes: BTreeSet<&'p str>,
}

impl ExcC14n<'_> {
    fn is_visible(&self, node: Node<'_, '_>) -> bool {
        match self.node_set {
            None => !node.is_comment(),
            Some(set) => set.contains(node),
        }
    }

    fn process_node<'a>(
        &self,
        node: Node<'a, '_>,
        output: &mut Vec<u8>,
        rendered: &Rendered<'a>,
    ) -> Result<(), Error> {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered)?;
                }
            }
            NodeType::Element => self.process_element(node, output, rendered)?,
            NodeType::Text => {
                if self.is_visible(node) {
                    escape::push_text(output, node.text().unwrap_or(""));
                }
            }
            NodeType::PI => {
                if let (true, Some(pi)) = (self.is_visible(node), node.pi()) {
                    let top_level = node.parent().is_some_and(|p| p.is_root());
                    if top_level && node.prev_siblings().skip(1).any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                    output.extend_from_slice(b"<?");
                    output.extend_from_slice(pi.target.as_bytes());
                    if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                        output.push(b' ');
                        escape::push_pi(output, value);
                    }
                    output.extend_from_slice(b"?>");
                    if top_level && node.next_siblings().skip(1).any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                }
            }
            NodeType::Comment => {}
        }
        Ok(())
    }

    fn process_element<'a>(
        &self,
        node: Node<'a, '_>,
        output: &mut Vec<u8>,
        rendered: &Rendered<'a>,
    ) -> Result<(), Error> {
        if !self.is_visible(node) {
            // Invisible elements render nothing but their visible content.
            for child in node.children() {
                self.process_node(child, output, rendered)?;
            }
            return Ok(());
        }

        let elem_prefix = element_prefix(node);
        let attrs = collect_attrs(node)?;

        let mut utilized: BTreeSet<&str> = self.inclusive_prefixes.clone();
        utilized.insert(elem_prefix);
        for attr in &attrs {
            if !attr.prefix.is_empty() {
                utilized.insert(attr.prefix);
            }
        }

        let in_scope = in_scope_namespaces(node);
        let mut ns_decls: Vec<NsDecl<'a>> = Vec::new();
        for prefix in utilized {
            if prefix == "xml" {
                continue;
            }
            match in_scope.get_key_value(prefix) {
                Some((&p, &uri)) => {
                    if rendered.get(p) != Some(&uri) {
                        ns_decls.push(NsDecl { prefix: p, uri });
                    }
                }
                // An element outside any default namespace whose output
                // ancestor rendered one must undeclare it.
                None if prefix.is_empty() => {
                    if rendered.get("").is_some_and(|uri| !uri.is_empty()) {
                        ns_decls.push(NsDecl { prefix: "", uri: "" });
                    }
                }
                None => {}
            }
        }
        ns_decls.sort();

        let mut attrs = attrs;
        attrs.sort();

        let qname = tillid_xml::document::raw_qname(node);
        if qname.is_empty() {
            return Err(Error::Canonicalization("element without a name".into()));
        }
        output.push(b'<');
        output.extend_from_slice(qname.as_bytes());
        for decl in &ns_decls {
            decl.write(output);
        }
        for attr in &attrs {
            attr.write(output);
        }
        output.push(b'>');

        let mut child_rendered = rendered.clone();
        for decl in &ns_decls {
            child_rendered.insert(decl.prefix, decl.uri);
        }
        for child in node.children() {
            self.process_node(child, output, &child_rendered)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(qname.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// In-scope namespace bindings of an element, keyed by prefix ("" for the
/// default namespace). The implicit `xml` binding is left out.
fn in_scope_namespaces<'a>(node: Node<'a, '_>) -> BTreeMap<&'a str, &'a str> {
    node.namespaces()
        .filter(|n| n.name() != Some("xml"))
        .filter(|n| !n.uri().is_empty())
        .map(|n| (n.name().unwrap_or(""), n.uri()))
        .collect()
}

fn collect_attrs<'a>(node: Node<'a, '_>) -> Result<Vec<Attr<'a>>, Error> {
    node.attributes()
        .map(|a| -> Result<Attr<'a>, Error> {
            let (ns_uri, prefix) = match a.namespace() {
                None => ("", ""),
                Some(uri) if uri == ns::XML => (uri, "xml"),
                Some(uri) => {
                    let prefix = node
                        .lookup_prefix(uri)
                        .filter(|p| !p.is_empty())
                        .ok_or_else(|| {
                            Error::Canonicalization(format!("no prefix bound to {uri}"))
                        })?;
                    (uri, prefix)
                }
            };
            Ok(Attr {
                ns_uri,
                prefix,
                local_name: a.name(),
                value: a.value(),
            })
        })
        .collect()
}
