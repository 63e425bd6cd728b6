#![forbid(unsafe_code)]

//! Transform pipeline for signature references.
//!
//! Each reference dereferences a same-document URI into a node set and
//! runs it through an ordered chain of transforms ending in canonical
//! bytes. The chains in use are exclusive C14N alone, enveloped-signature
//! followed by exclusive C14N, and the WS-Security STR-Transform.

pub mod enveloped;
pub mod pipeline;
pub mod str_transform;
pub mod uri;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{ExcC14nTransform, Transform, TransformData, TransformPipeline};
pub use str_transform::StrTransform;
