#![forbid(unsafe_code)]

//! Per-call settings for signature operations.

/// Settings for one signing or validation call.
///
/// Nothing here is registered globally; two calls with different contexts
/// may run concurrently on different documents.
#[derive(Debug, Clone, Default)]
pub struct DsigContext {
    /// Additional ID attribute names, checked after `Id`, `ID`, `id` and
    /// `wsu:Id`.
    pub id_attrs: Vec<String>,
    /// Log pre-digest and pre-signature data at debug level.
    pub debug: bool,
}

impl DsigContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ID attribute name to check during processing.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.id_attrs.iter().any(|n| n == name) {
            self.id_attrs.push(name.to_owned());
        }
    }

    /// The context's ID attribute names merged with those registered on
    /// a document.
    pub fn id_attrs_for(&self, doc: &tillid_xml::XmlDocument) -> Vec<String> {
        let mut names = self.id_attrs.clone();
        for name in doc.id_attrs() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub(crate) fn trace_bytes(&self, what: &str, bytes: &[u8]) {
        if self.debug {
            log::debug!("{what}:\n{}", String::from_utf8_lossy(bytes));
        }
    }
}
