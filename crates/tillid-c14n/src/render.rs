#![forbid(unsafe_code)]

//! Namespace declarations and attributes in canonical order.

use std::cmp::Ordering;

use crate::escape;

/// A namespace declaration to be rendered on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl<'a> {
    /// "" for the default namespace.
    pub prefix: &'a str,
    pub uri: &'a str,
}

impl NsDecl<'_> {
    pub fn write(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        escape::push_attr(out, self.uri);
        out.push(b'"');
    }
}

// The default namespace sorts first, then by prefix.
impl Ord for NsDecl<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(other.prefix),
        }
    }
}

impl PartialOrd for NsDecl<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr<'a> {
    /// "" for no namespace.
    pub ns_uri: &'a str,
    pub prefix: &'a str,
    pub local_name: &'a str,
    pub value: &'a str,
}

impl Attr<'_> {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        if !self.prefix.is_empty() {
            out.extend_from_slice(self.prefix.as_bytes());
            out.push(b':');
        }
        out.extend_from_slice(self.local_name.as_bytes());
        out.extend_from_slice(b"=\"");
        escape::push_attr(out, self.value);
        out.push(b'"');
    }
}

// Unqualified attributes first by local name, then qualified ones by
// (namespace URI, local name).
impl Ord for Attr<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(other.local_name),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(other.ns_uri)
                .then(self.local_name.cmp(other.local_name)),
        }
    }
}

impl PartialOrd for Attr<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_order() {
        let wsu = Attr { ns_uri: "urn:wsu", prefix: "wsu", local_name: "Id", value: "x" };
        let a = Attr { ns_uri: "", prefix: "", local_name: "b", value: "1" };
        let b = Attr { ns_uri: "", prefix: "", local_name: "a", value: "2" };
        let mut attrs = vec![wsu.clone(), a.clone(), b.clone()];
        attrs.sort();
        assert_eq!(attrs, vec![b, a, wsu]);
    }

    #[test]
    fn test_ns_order_and_render() {
        let mut decls = vec![
            NsDecl { prefix: "wsu", uri: "urn:b" },
            NsDecl { prefix: "", uri: "urn:d" },
            NsDecl { prefix: "ds", uri: "urn:a" },
        ];
        decls.sort();
        let mut out = Vec::new();
        for d in &decls {
            d.write(&mut out);
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#" xmlns="urn:d" xmlns:ds="urn:a" xmlns:wsu="urn:b""#
        );
    }
}
