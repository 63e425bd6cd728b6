#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<Signature>` element being processed from the node set.

use roxmltree::NodeId;
use tillid_core::{algorithm, Error};

use crate::pipeline::{Transform, TransformData};

/// Removes the signature element and its descendants from the node set.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    /// Create for the `<Signature>` element with the given node ID.
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        match input {
            TransformData::Xml { start, mut node_set } => {
                let signature = start.document().get_node(self.signature).ok_or_else(|| {
                    Error::Transform("enveloped signature is not part of the document".into())
                })?;
                node_set.remove_subtree(signature);
                Ok(TransformData::Xml { start, node_set })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}
