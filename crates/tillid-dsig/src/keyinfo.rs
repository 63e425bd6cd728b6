#![forbid(unsafe_code)]

//! `ds:KeyInfo` rendering and reading.
//!
//! A signature either embeds its certificate in `ds:X509Data` or names it
//! with a federation certificate reference in `ds:KeyName`.

use roxmltree::Node;
use tillid_core::{ns, Error};
use tillid_federation::FederationCertificateReference;
use tillid_keys::Certificate;
use tillid_xml::document::{find_child_elements, find_elements};
use tillid_xml::writer::XmlWriter;

/// What a `ds:KeyInfo` carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInfoContent {
    Certificate(Certificate),
    Reference(FederationCertificateReference),
}

impl KeyInfoContent {
    /// Render as a `ds:KeyInfo` element using prefix `ds`, which must be
    /// bound to the signature namespace where the element is placed.
    pub fn render(&self, ds: &str, id: Option<&str>) -> String {
        let key_info = format!("{ds}:{}", ns::node::KEY_INFO);
        let mut attrs = Vec::new();
        if let Some(id) = id {
            attrs.push((ns::attr::ID, id));
        }
        let mut w = XmlWriter::new();
        w.start_element(&key_info, &attrs);
        match self {
            KeyInfoContent::Certificate(cert) => {
                let x509_data = format!("{ds}:{}", ns::node::X509_DATA);
                w.start_element(&x509_data, &[]);
                w.text_element(&format!("{ds}:{}", ns::node::X509_CERTIFICATE), &[], &cert.to_base64());
                w.end_element(&x509_data);
            }
            KeyInfoContent::Reference(reference) => {
                w.text_element(&format!("{ds}:{}", ns::node::KEY_NAME), &[], &reference.to_string());
            }
        }
        w.end_element(&key_info);
        w.into_string()
    }

    /// Read a `ds:KeyInfo` element.
    ///
    /// One `ds:KeyName` means a federation reference. Several are
    /// ambiguous. Without a `ds:KeyName` exactly one `ds:X509Certificate`
    /// must be present.
    pub fn read(key_info: Node<'_, '_>) -> Result<Self, Error> {
        let names = find_child_elements(key_info, ns::DSIG, ns::node::KEY_NAME);
        match names.len() {
            0 => {}
            1 => {
                let text = names[0].text().map(str::trim).unwrap_or("");
                return Ok(KeyInfoContent::Reference(text.parse()?));
            }
            n => return Err(Error::AmbiguousKeyName(n)),
        }

        let certs = find_elements(key_info, ns::DSIG, ns::node::X509_CERTIFICATE);
        match certs.as_slice() {
            [] => Err(Error::MissingElement("ds:X509Certificate".into())),
            [cert] => {
                let text = cert.text().unwrap_or("");
                Ok(KeyInfoContent::Certificate(Certificate::from_base64(text)?))
            }
            many => Err(Error::DuplicateElement(
                "ds:X509Certificate".into(),
                many.len(),
            )),
        }
    }
}
