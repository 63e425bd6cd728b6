#![forbid(unsafe_code)]

//! Declarative navigation by namespace-qualified tag paths.
//!
//! Messages in the federation are produced by many stacks. Some emit fully
//! namespaced trees, others reuse well-known prefixes without declaring
//! them on the element where they are used. A [`TagPath`] resolves against
//! both: an element that carries a resolved namespace is matched on
//! namespace URI and local name; otherwise the raw prefix is compared with
//! the prefix the root element declares for the tag's namespace.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use crate::document::raw_qname;

/// A namespace-qualified element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub namespace: &'static str,
    pub local_name: &'static str,
    /// Prefix used when rendering new elements with this tag.
    pub preferred_prefix: &'static str,
}

impl Tag {
    pub const fn new(
        namespace: &'static str,
        local_name: &'static str,
        preferred_prefix: &'static str,
    ) -> Self {
        Self {
            namespace,
            local_name,
            preferred_prefix,
        }
    }

    /// The prefixed name used when rendering (`ds:Signature`).
    pub fn qualified_name(&self) -> String {
        if self.preferred_prefix.is_empty() {
            self.local_name.to_owned()
        } else {
            format!("{}:{}", self.preferred_prefix, self.local_name)
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// An ordered list of tags leading from a root to the target element(s).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagPath {
    tags: Vec<Tag>,
}

impl TagPath {
    pub fn new(tags: impl Into<Vec<Tag>>) -> Self {
        Self { tags: tags.into() }
    }

    /// Extend the path by one tag.
    pub fn then(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn last(&self) -> Option<&Tag> {
        self.tags.last()
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// Resolves [`TagPath`]s against one parsed document.
///
/// The root element's namespace declarations are read once, on first use.
pub struct TagPathNavigator<'a, 'input> {
    doc: &'a roxmltree::Document<'input>,
    root_prefixes: OnceCell<HashMap<&'a str, &'a str>>,
}

impl<'a, 'input> TagPathNavigator<'a, 'input> {
    pub fn new(doc: &'a roxmltree::Document<'input>) -> Self {
        Self {
            doc,
            root_prefixes: OnceCell::new(),
        }
    }

    /// Follow `path` from the children of `root` and return the first match.
    pub fn resolve_first(
        &self,
        root: roxmltree::Node<'a, 'input>,
        path: &TagPath,
    ) -> Option<roxmltree::Node<'a, 'input>> {
        let (last, parent) = self.descend(root, path)?;
        parent.children().find(|n| self.matches(*n, last))
    }

    /// Follow `path` from the children of `root` and return every element
    /// matching the final tag under the resolved parent.
    pub fn resolve_all(
        &self,
        root: roxmltree::Node<'a, 'input>,
        path: &TagPath,
    ) -> Vec<roxmltree::Node<'a, 'input>> {
        match self.descend(root, path) {
            Some((last, parent)) => parent
                .children()
                .filter(|n| self.matches(*n, last))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Resolve from the document node, so the first tag matches the root
    /// element itself.
    pub fn resolve_from_document(&self, path: &TagPath) -> Option<roxmltree::Node<'a, 'input>> {
        self.resolve_first(self.doc.root(), path)
    }

    /// Check whether `node` is an element matching `tag`.
    pub fn matches(&self, node: roxmltree::Node<'a, 'input>, tag: &Tag) -> bool {
        if !node.is_element() || node.tag_name().name() != tag.local_name {
            return false;
        }
        if let Some(uri) = node.tag_name().namespace() {
            return uri == tag.namespace;
        }
        let prefix = match raw_qname(node).split_once(':') {
            Some((prefix, _)) => prefix,
            None => "",
        };
        let expected = self
            .root_prefixes()
            .get(tag.namespace)
            .copied()
            .unwrap_or(tag.preferred_prefix);
        prefix == expected
    }

    fn descend<'p>(
        &self,
        root: roxmltree::Node<'a, 'input>,
        path: &'p TagPath,
    ) -> Option<(&'p Tag, roxmltree::Node<'a, 'input>)> {
        let (last, intermediate) = path.tags.split_last()?;
        let mut current = root;
        for tag in intermediate {
            current = current.children().find(|n| self.matches(*n, tag))?;
        }
        Some((last, current))
    }

    fn root_prefixes(&self) -> &HashMap<&'a str, &'a str> {
        self.root_prefixes.get_or_init(|| {
            let mut map = HashMap::new();
            for ns in self.doc.root_element().namespaces() {
                map.entry(ns.uri()).or_insert(ns.name().unwrap_or(""));
            }
            map
        })
    }
}

/// Identifies one node of a document across parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// The element carrying this ID (extended ID lookup).
    Id(String),
    /// The first element reached by this path from the document node.
    Path(TagPath),
    /// Any element with this tag, in document order.
    Descendant(Tag),
}

impl NodeSelector {
    /// Find the selected node in a parsed document.
    pub fn select<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
        extra_id_attrs: &[String],
    ) -> Option<roxmltree::Node<'a, 'input>> {
        match self {
            NodeSelector::Id(id) => crate::document::find_by_id(doc, id, extra_id_attrs),
            NodeSelector::Path(path) => TagPathNavigator::new(doc).resolve_from_document(path),
            NodeSelector::Descendant(tag) => {
                let nav = TagPathNavigator::new(doc);
                doc.descendants().find(|n| nav.matches(*n, tag))
            }
        }
    }

    /// Find every node the selector matches.
    pub fn select_all<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
        extra_id_attrs: &[String],
    ) -> Vec<roxmltree::Node<'a, 'input>> {
        match self {
            NodeSelector::Id(id) => doc
                .descendants()
                .filter(|n| n.is_element())
                .filter(|n| crate::document::element_id(*n, extra_id_attrs) == Some(id.as_str()))
                .collect(),
            NodeSelector::Path(path) => {
                TagPathNavigator::new(doc).resolve_all(doc.root(), path)
            }
            NodeSelector::Descendant(tag) => {
                let nav = TagPathNavigator::new(doc);
                doc.descendants().filter(|n| nav.matches(*n, tag)).collect()
            }
        }
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSelector::Id(id) => write!(f, "#{id}"),
            NodeSelector::Path(path) => write!(f, "/{path}"),
            NodeSelector::Descendant(tag) => write!(f, "//{tag}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;
    use tillid_core::ns;

    fn envelope(header: &str) -> String {
        format!(
            r#"<soap:Envelope xmlns:soap="{}" xmlns:wsse="{}" xmlns:saml="{}"><soap:Header>{header}</soap:Header><soap:Body/></soap:Envelope>"#,
            ns::SOAP,
            ns::WSSE,
            ns::SAML
        )
    }

    fn security_assertion() -> TagPath {
        TagPath::new(vec![
            tags::SOAP_ENVELOPE,
            tags::SOAP_HEADER,
            tags::WSSE_SECURITY,
            tags::SAML_ASSERTION,
        ])
    }

    #[test]
    fn test_resolve_namespaced() {
        let xml = envelope(
            r#"<wsse:Security><saml:Assertion id="IDCard"/><saml:Assertion id="Other"/></wsse:Security>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let nav = TagPathNavigator::new(&doc);
        let path = security_assertion();
        let first = nav.resolve_from_document(&path).unwrap();
        assert_eq!(first.attribute("id"), Some("IDCard"));
        let all = nav.resolve_all(doc.root(), &path);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let xml = envelope(
            r#"<wsse:Security><saml:Assertion id="A"/></wsse:Security><wsse:Security><saml:Assertion id="B"/></wsse:Security>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let path = security_assertion();
        for _ in 0..3 {
            let nav = TagPathNavigator::new(&doc);
            // only the first Security is descended into
            let all = nav.resolve_all(doc.root(), &path);
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].attribute("id"), Some("A"));
        }
    }

    #[test]
    fn test_intermediate_miss_is_empty() {
        let xml = envelope("");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let nav = TagPathNavigator::new(&doc);
        assert!(nav.resolve_from_document(&security_assertion()).is_none());
        assert!(nav.resolve_all(doc.root(), &security_assertion()).is_empty());
    }

    #[test]
    fn test_unqualified_element_matches_by_root_prefix() {
        // Header undeclares the default namespace, so only its prefix ("")
        // is left to compare with the root's binding for SOAP
        let xml = format!(
            r#"<Envelope xmlns="{}"><Header xmlns=""><Item/></Header></Envelope>"#,
            ns::SOAP
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let nav = TagPathNavigator::new(&doc);
        let header = doc.root_element().first_element_child().unwrap();
        assert_eq!(header.tag_name().namespace(), None);
        assert!(nav.matches(header, &tags::SOAP_HEADER));
        assert!(nav
            .resolve_from_document(&TagPath::new(vec![tags::SOAP_ENVELOPE, tags::SOAP_HEADER]))
            .is_some());
    }

    #[test]
    fn test_unqualified_element_against_prefixed_root() {
        let xml = format!(
            r#"<soap:Envelope xmlns:soap="{}"><Header/></soap:Envelope>"#,
            ns::SOAP
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let nav = TagPathNavigator::new(&doc);
        let header = doc.root_element().first_element_child().unwrap();
        assert!(!nav.matches(header, &tags::SOAP_HEADER));
    }

    #[test]
    fn test_undeclared_namespace_uses_preferred_prefix() {
        let doc = roxmltree::Document::parse("<r><Item/></r>").unwrap();
        let nav = TagPathNavigator::new(&doc);
        let item = doc.root_element().first_element_child().unwrap();
        assert!(nav.matches(item, &Tag::new("urn:local", "Item", "")));
        assert!(!nav.matches(item, &Tag::new("urn:local", "Item", "loc")));
    }

    #[test]
    fn test_wrong_namespace_does_not_match() {
        let xml = r#"<soap:Envelope xmlns:soap="urn:not-soap"><soap:Header/></soap:Envelope>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let nav = TagPathNavigator::new(&doc);
        let path = TagPath::new(vec![tags::SOAP_ENVELOPE]);
        assert!(nav.resolve_from_document(&path).is_none());
    }

    #[test]
    fn test_selector() {
        let xml = envelope(r#"<wsse:Security><saml:Assertion id="IDCard"/></wsse:Security>"#);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let by_id = NodeSelector::Id("IDCard".into());
        let by_path = NodeSelector::Path(security_assertion());
        assert_eq!(
            by_id.select(&doc, &[]).map(|n| n.id()),
            by_path.select(&doc, &[]).map(|n| n.id())
        );
        assert_eq!(by_id.to_string(), "#IDCard");
        assert_eq!(
            by_path.to_string(),
            "/soap:Envelope/soap:Header/wsse:Security/saml:Assertion"
        );
    }

    #[test]
    fn test_descendant_selector() {
        let xml = envelope(
            r#"<wsse:Security><saml:Assertion id="A"/></wsse:Security><wsse:Security><saml:Assertion id="B"/></wsse:Security>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let any = NodeSelector::Descendant(tags::SAML_ASSERTION);
        assert_eq!(any.select(&doc, &[]).unwrap().attribute("id"), Some("A"));
        assert_eq!(any.select_all(&doc, &[]).len(), 2);
        assert_eq!(any.to_string(), "//saml:Assertion");
    }
}
