#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use roxmltree::Node;
use tillid_core::{algorithm, Error};
use tillid_xml::NodeSet;

/// Data flowing through the transform pipeline.
///
/// XML data borrows from a document parsed once per signature operation.
pub enum TransformData<'a, 'input> {
    /// A node set, rendered starting at `start`.
    Xml {
        start: Node<'a, 'input>,
        node_set: NodeSet,
    },
    /// Raw octets.
    Binary(Vec<u8>),
}

impl<'a, 'input> TransformData<'a, 'input> {
    /// The subtree rooted at `start`, without comments.
    pub fn subtree(start: Node<'a, 'input>) -> Self {
        TransformData::Xml {
            start,
            node_set: NodeSet::tree_without_comments(start),
        }
    }

    /// Convert to octets, canonicalizing XML with exclusive C14N.
    pub fn into_binary(self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { start, node_set } => {
                tillid_c14n::canonicalize_subtree(start, Some(&node_set), &[])
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send + Sync {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error>;
}

/// A pipeline of transforms executed in sequence.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order and return the final octets.
    pub fn execute<'a, 'input>(&self, input: TransformData<'a, 'input>) -> Result<Vec<u8>, Error> {
        let mut data = input;
        for transform in &self.transforms {
            log::trace!("applying transform {}", transform.uri());
            data = transform.execute(data)?;
        }
        data.into_binary()
    }

    /// Algorithm URIs of the transforms, in order.
    pub fn uris(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.uri()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Exclusive C14N 1.0 without comments.
#[derive(Debug, Clone, Default)]
pub struct ExcC14nTransform {
    inclusive_prefixes: Vec<String>,
}

impl ExcC14nTransform {
    pub fn new(inclusive_prefixes: Vec<String>) -> Self {
        Self { inclusive_prefixes }
    }
}

impl Transform for ExcC14nTransform {
    fn uri(&self) -> &str {
        algorithm::EXC_C14N
    }

    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        match input {
            TransformData::Xml { start, node_set } => {
                let bytes = tillid_c14n::canonicalize_subtree(
                    start,
                    Some(&node_set),
                    &self.inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Transform(format!("invalid UTF-8: {e}")))?;
                let bytes = tillid_c14n::canonicalize(text, None, &self.inclusive_prefixes)?;
                Ok(TransformData::Binary(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_c14n() {
        let doc = roxmltree::Document::parse(r#"<r xmlns:x="urn:x"><a  b='1'><!--c--></a></r>"#)
            .unwrap();
        let a = doc.root_element().first_element_child().unwrap();
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Box::new(ExcC14nTransform::default()));
        assert_eq!(pipeline.uris(), vec![algorithm::EXC_C14N]);
        let out = pipeline.execute(TransformData::subtree(a)).unwrap();
        assert_eq!(out, br#"<a b="1"></a>"#);
    }

    #[test]
    fn test_empty_pipeline_canonicalizes() {
        let doc = roxmltree::Document::parse("<r><a/></r>").unwrap();
        let pipeline = TransformPipeline::new();
        assert!(pipeline.is_empty());
        let out = pipeline.execute(TransformData::subtree(doc.root_element())).unwrap();
        assert_eq!(out, b"<r><a></a></r>");
    }

    #[test]
    fn test_c14n_of_binary_input() {
        let t = ExcC14nTransform::default();
        let out = t
            .execute(TransformData::Binary(b"<a y='2' x='1'/>".to_vec()))
            .unwrap()
            .into_binary()
            .unwrap();
        assert_eq!(out, br#"<a x="1" y="2"></a>"#);
    }
}
