#![forbid(unsafe_code)]

//! Post-processing of generated signatures.
//!
//! Strips namespace declarations that repeat a binding already in scope
//! and whitespace-only text containing a line feed, both inside the
//! signature subtree only.

use std::ops::Range;

use roxmltree::Node;
use tillid_core::Error;
use tillid_xml::document::element_at;
use tillid_xml::{TextEdit, XmlDocument};

/// Tidy the `ds:Signature` whose start tag begins at byte `position`.
/// Returns the number of edits applied.
pub fn tidy_signature_at(doc: &mut XmlDocument, position: usize) -> Result<usize, Error> {
    let edits = {
        let parsed = doc.parse_doc()?;
        let signature = element_at(&parsed, position)
            .ok_or_else(|| Error::MissingElement("ds:Signature".into()))?;
        tidy_edits(signature)
    };
    let count = edits.len();
    if count > 0 {
        log::trace!("tidying signature: {count} edits");
        doc.apply_edits(edits)?;
    }
    Ok(count)
}

fn tidy_edits(signature: Node<'_, '_>) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    for node in signature.descendants() {
        if node.is_text() {
            let text = node.text().unwrap_or("");
            if text.contains('\n') && text.chars().all(char::is_whitespace) {
                edits.push(remove(node.range()));
            }
        } else if node.is_element() {
            let Some(parent) = node.parent_element() else {
                continue;
            };
            for decl in declarations(node) {
                let in_scope = parent.lookup_namespace_uri(decl.prefix).unwrap_or("");
                if in_scope == decl.uri {
                    edits.push(remove(decl.range));
                }
            }
        }
    }
    edits
}

fn remove(range: Range<usize>) -> TextEdit {
    TextEdit {
        range,
        replacement: String::new(),
        content_offset: 0,
    }
}

struct Declaration<'a> {
    prefix: Option<&'a str>,
    uri: &'a str,
    /// The declaration including its leading whitespace.
    range: Range<usize>,
}

/// Scan the start tag of `node` for namespace declarations.
fn declarations<'a>(node: Node<'_, 'a>) -> Vec<Declaration<'a>> {
    let text: &'a str = node.document().input_text();
    let bytes = text.as_bytes();
    let mut pos = node.range().start + 1;
    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' && bytes[pos] != b'/' {
        pos += 1;
    }

    let mut found = Vec::new();
    loop {
        let attr_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] == b'>' || bytes[pos] == b'/' {
            break;
        }
        let name_start = pos;
        while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = &text[name_start..pos];
        while pos < bytes.len() && (bytes[pos] == b'=' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        let Some(&quote) = bytes.get(pos) else {
            break;
        };
        let value_start = pos + 1;
        let Some(len) = text[value_start..].find(quote as char) else {
            break;
        };
        let value = &text[value_start..value_start + len];
        pos = value_start + len + 1;

        let prefix = if name == "xmlns" {
            None
        } else if let Some(p) = name.strip_prefix("xmlns:") {
            Some(p)
        } else {
            continue;
        };
        // values with references are compared after expansion by the
        // parser, which this scan does not do
        if value.contains('&') {
            continue;
        }
        found.push(Declaration {
            prefix,
            uri: value,
            range: attr_start..pos,
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillid_core::ns;

    fn doc(xml: &str) -> XmlDocument {
        XmlDocument::parse(xml.to_owned()).unwrap()
    }

    fn tidy(d: &mut XmlDocument) -> usize {
        let pos = d.text().find("<ds:Signature").unwrap();
        tidy_signature_at(d, pos).unwrap()
    }

    #[test]
    fn test_redundant_declaration_removed() {
        let xml = format!(
            r#"<r xmlns:ds="{ds}"><ds:Signature xmlns:ds="{ds}"><ds:SignedInfo xmlns:ds="{ds}" xmlns:x="urn:x"/></ds:Signature></r>"#,
            ds = ns::DSIG
        );
        let mut d = doc(&xml);
        let pos = xml.find("<ds:Signature").unwrap();
        assert_eq!(tidy_signature_at(&mut d, pos).unwrap(), 2);
        assert_eq!(
            d.text(),
            format!(
                r#"<r xmlns:ds="{ds}"><ds:Signature><ds:SignedInfo xmlns:x="urn:x"/></ds:Signature></r>"#,
                ds = ns::DSIG
            )
        );
        // idempotent
        assert_eq!(tidy_signature_at(&mut d, pos).unwrap(), 0);
    }

    #[test]
    fn test_rebinding_kept() {
        let xml = format!(
            r#"<r xmlns:ds="urn:other"><ds:Signature xmlns:ds="{ds}"/></r>"#,
            ds = ns::DSIG
        );
        let mut d = doc(&xml);
        assert_eq!(tidy(&mut d), 0);
        assert_eq!(d.text(), xml);
    }

    #[test]
    fn test_linefeed_text_removed() {
        let xml = format!(
            "<r>\n<ds:Signature xmlns:ds=\"{ds}\">\n  <ds:SignedInfo>\n</ds:SignedInfo> <ds:SignatureValue>AA==</ds:SignatureValue>\n</ds:Signature>\n</r>",
            ds = ns::DSIG
        );
        let mut d = doc(&xml);
        tidy(&mut d);
        assert_eq!(
            d.text(),
            format!(
                "<r>\n<ds:Signature xmlns:ds=\"{ds}\"><ds:SignedInfo></ds:SignedInfo> <ds:SignatureValue>AA==</ds:SignatureValue></ds:Signature>\n</r>",
                ds = ns::DSIG
            )
        );
    }

    #[test]
    fn test_default_namespace_undeclaration() {
        let xml = format!(
            r#"<r><ds:Signature xmlns:ds="{ds}"><a xmlns=""/></ds:Signature></r>"#,
            ds = ns::DSIG
        );
        let mut d = doc(&xml);
        assert_eq!(tidy(&mut d), 1);
        assert!(d.text().contains("<a/>"));
    }
}
