#![forbid(unsafe_code)]

//! Owned XML document with extended ID lookup and in-place text edits.

use std::ops::Range;
use tillid_core::{ns, Error};

/// Attribute names checked by [`find_by_id`], in priority order.
///
/// Producers in the federation disagree on which ID attribute to use, so
/// all of them are accepted. The namespaced `wsu:Id` is checked last.
pub const DEFAULT_ID_ATTRS: [&str; 3] = ["Id", "ID", "id"];

/// An owned XML document.  Stores the text and per-document settings.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a temporary `roxmltree::Document` borrowing from the text.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    text: String,
    /// Additional ID attribute names (beyond `Id`, `ID`, `id`, `wsu:Id`).
    extra_id_attrs: Vec<String>,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    pub fn parse(text: String) -> Result<Self, Error> {
        roxmltree::Document::parse_with_options(&text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        Ok(Self {
            text,
            extra_id_attrs: Vec::new(),
        })
    }

    /// Parse and validate XML from bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?
            .to_owned();
        Self::parse(text)
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the document and return its text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Register an additional (un-namespaced) ID attribute name.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.extra_id_attrs.iter().any(|n| n == name) {
            self.extra_id_attrs.push(name.to_owned());
        }
    }

    /// Additional ID attribute names registered on this document.
    pub fn id_attrs(&self) -> &[String] {
        &self.extra_id_attrs
    }

    /// Parse the document and return a temporary `roxmltree::Document`.
    ///
    /// Parse once at the top of an operation and pass the result down.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        roxmltree::Document::parse_with_options(&self.text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))
    }

    /// Apply a set of non-overlapping text edits.
    ///
    /// The edited text must still be well-formed XML; otherwise the
    /// document is left unchanged and an error is returned.
    pub fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<(), Error> {
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        for pair in edits.windows(2) {
            if pair[1].range.end > pair[0].range.start {
                return Err(Error::XmlStructure("overlapping document edits".into()));
            }
        }
        let mut text = self.text.clone();
        for edit in &edits {
            if edit.range.end > text.len() || edit.range.start > edit.range.end {
                return Err(Error::XmlStructure("document edit out of range".into()));
            }
            text.replace_range(edit.range.clone(), &edit.replacement);
        }
        roxmltree::Document::parse_with_options(&text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(format!("edit produced malformed XML: {e}")))?;
        self.text = text;
        Ok(())
    }
}

/// A replacement of a byte range of the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
    /// Offset of the inserted content within `replacement`.
    pub content_offset: usize,
}

impl TextEdit {
    /// Byte position of the inserted content once this edit is applied alone.
    pub fn content_position(&self) -> usize {
        self.range.start + self.content_offset
    }

    /// Insert `content` immediately before `node`.
    pub fn insert_before(node: roxmltree::Node<'_, '_>, content: &str) -> Self {
        let pos = node.range().start;
        Self {
            range: pos..pos,
            replacement: content.to_owned(),
            content_offset: 0,
        }
    }

    /// Insert `content` as the last child of the element `node`.
    pub fn append_child(node: roxmltree::Node<'_, '_>, content: &str) -> Result<Self, Error> {
        let range = node.range();
        let text = &node.document().input_text()[range.clone()];
        if text.ends_with("/>") {
            // <a/> becomes <a>content</a>
            let qname = raw_qname(node);
            let start = range.end - 2;
            return Ok(Self {
                range: start..range.end,
                replacement: format!(">{content}</{qname}>"),
                content_offset: 1,
            });
        }
        let close = text
            .rfind("</")
            .ok_or_else(|| Error::XmlStructure(format!("no end tag for <{}>", raw_qname(node))))?;
        let pos = range.start + close;
        Ok(Self {
            range: pos..pos,
            replacement: content.to_owned(),
            content_offset: 0,
        })
    }

    /// Replace the whole element `node` with `content`.
    pub fn replace_node(node: roxmltree::Node<'_, '_>, content: &str) -> Self {
        Self {
            range: node.range(),
            replacement: content.to_owned(),
            content_offset: 0,
        }
    }
}

/// The raw, possibly prefixed, tag name of an element as written in the
/// source text (e.g. `ds:Signature`).
pub fn raw_qname<'a>(node: roxmltree::Node<'_, 'a>) -> &'a str {
    let text: &'a str = node.document().input_text();
    let start = node.range().start + 1;
    let rest = &text[start.min(text.len())..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// The prefix of an element's raw tag name ("" when unprefixed).
pub fn element_prefix<'a>(node: roxmltree::Node<'_, 'a>) -> &'a str {
    match raw_qname(node).split_once(':') {
        Some((prefix, _)) => prefix,
        None => "",
    }
}

/// Read the ID value an element carries under any recognised ID attribute.
pub fn element_id<'a>(node: roxmltree::Node<'a, '_>, extra: &[String]) -> Option<&'a str> {
    DEFAULT_ID_ATTRS
        .iter()
        .find_map(|name| node.attribute(*name))
        .or_else(|| node.attribute((ns::WSU, "Id")))
        .or_else(|| extra.iter().find_map(|name| node.attribute(name.as_str())))
}

/// Find an element by ID, checking `Id`, `ID`, `id`, `wsu:Id` and then any
/// extra names, in that priority order. Within one attribute name the
/// first element in document order wins.
pub fn find_by_id<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    id: &str,
    extra: &[String],
) -> Option<roxmltree::Node<'a, 'input>> {
    let elements = || doc.descendants().filter(|n| n.is_element());
    for name in DEFAULT_ID_ATTRS {
        if let Some(node) = elements().find(|n| n.attribute(name) == Some(id)) {
            return Some(node);
        }
    }
    if let Some(node) = elements().find(|n| n.attribute((ns::WSU, "Id")) == Some(id)) {
        return Some(node);
    }
    extra
        .iter()
        .find_map(|name| elements().find(|n| n.attribute(name.as_str()) == Some(id)))
}

/// Count the distinct elements that carry `id` under any recognised ID
/// attribute. More than one means the ID is ambiguous.
pub fn count_by_id(doc: &roxmltree::Document<'_>, id: &str, extra: &[String]) -> usize {
    doc.descendants()
        .filter(|n| n.is_element())
        .filter(|n| {
            DEFAULT_ID_ATTRS.iter().any(|name| n.attribute(*name) == Some(id))
                || n.attribute((ns::WSU, "Id")) == Some(id)
                || extra.iter().any(|name| n.attribute(name.as_str()) == Some(id))
        })
        .count()
}

/// Find the element whose start tag begins at byte `pos`.
pub fn element_at<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    pos: usize,
) -> Option<roxmltree::Node<'a, 'input>> {
    doc.descendants()
        .find(|n| n.is_element() && n.range().start == pos)
}

/// Find the first child element with the given namespace and local name.
pub fn find_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// Find all child elements with the given namespace and local name.
pub fn find_child_elements<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == local_name
                && n.tag_name().namespace().unwrap_or("") == ns_uri
        })
        .collect()
}

/// Find all descendant elements with the given namespace and local name.
pub fn find_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    node.descendants()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == local_name
                && n.tag_name().namespace().unwrap_or("") == ns_uri
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_attr(attr: &str) -> String {
        format!(
            r#"<root xmlns:wsu="{}"><a/><b {attr}="IDCard"><c/></b></root>"#,
            ns::WSU
        )
    }

    #[test]
    fn test_find_by_id_every_convention() {
        for attr in ["Id", "ID", "id", "wsu:Id"] {
            let doc = XmlDocument::parse(with_attr(attr)).unwrap();
            let parsed = doc.parse_doc().unwrap();
            let node = find_by_id(&parsed, "IDCard", &[]).expect(attr);
            assert_eq!(node.tag_name().name(), "b", "attribute {attr}");
            assert_eq!(count_by_id(&parsed, "IDCard", &[]), 1);
        }
    }

    #[test]
    fn test_find_by_id_priority() {
        let xml = r#"<root><x id="dup"/><y Id="dup"/></root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        assert_eq!(find_by_id(&doc, "dup", &[]).unwrap().tag_name().name(), "y");
        assert_eq!(count_by_id(&doc, "dup", &[]), 2);
    }

    #[test]
    fn test_find_by_id_extra_attr() {
        let xml = r#"<root><x AssertionID="a1"/></root>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        assert!(find_by_id(&doc, "a1", &[]).is_none());
        let extra = vec!["AssertionID".to_owned()];
        assert_eq!(find_by_id(&doc, "a1", &extra).unwrap().tag_name().name(), "x");
    }

    #[test]
    fn test_element_id() {
        let xml = format!(
            r#"<root xmlns:wsu="{}"><a wsu:Id="w" ID="upper"/><b AssertionID="a1"/><c/></root>"#,
            ns::WSU
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let ids: Vec<Option<&str>> = doc
            .root_element()
            .children()
            .map(|n| element_id(n, &["AssertionID".to_owned()]))
            .collect();
        assert_eq!(ids, [Some("upper"), Some("a1"), None]);
    }

    #[test]
    fn test_append_child_and_insert_before() {
        let mut doc = XmlDocument::parse(r#"<p:root xmlns:p="urn:p"><p:a/><b>t</b></p:root>"#.into())
            .unwrap();
        let edits = {
            let parsed = doc.parse_doc().unwrap();
            let root = parsed.root_element();
            let a = root.first_element_child().unwrap();
            let b = find_child_element(root, "", "b").unwrap();
            vec![
                TextEdit::append_child(a, "<x/>").unwrap(),
                TextEdit::insert_before(b, "<y/>"),
                TextEdit::append_child(root, "<z/>").unwrap(),
            ]
        };
        doc.apply_edits(edits).unwrap();
        assert_eq!(
            doc.text(),
            r#"<p:root xmlns:p="urn:p"><p:a><x/></p:a><y/><b>t</b><z/></p:root>"#
        );
    }

    #[test]
    fn test_malformed_edit_is_rejected() {
        let mut doc = XmlDocument::parse("<root><a/></root>".into()).unwrap();
        let edit = {
            let parsed = doc.parse_doc().unwrap();
            TextEdit::append_child(parsed.root_element(), "<broken>").unwrap()
        };
        assert!(doc.apply_edits(vec![edit]).is_err());
        assert_eq!(doc.text(), "<root><a/></root>");
    }

    #[test]
    fn test_raw_qname() {
        let doc = roxmltree::Document::parse(r#"<ds:Signature xmlns:ds="urn:x" a="1"/>"#).unwrap();
        let root = doc.root_element();
        assert_eq!(raw_qname(root), "ds:Signature");
        assert_eq!(element_prefix(root), "ds");
    }
}
