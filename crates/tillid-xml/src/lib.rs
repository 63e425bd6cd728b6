#![forbid(unsafe_code)]

//! XML document abstraction for the Tillid trust engine.
//!
//! Documents are owned text parsed on demand with `roxmltree`. On top of
//! that this crate provides declarative tag-path navigation, the extended
//! element-by-ID lookup used by signing and validation, node sets for
//! canonicalization, text splicing for in-place edits, and a small writer
//! for building new elements.

pub mod document;
pub mod nodeset;
pub mod tagpath;
pub mod tags;
pub mod writer;
pub mod xpath;

pub use document::{TextEdit, XmlDocument};
pub use nodeset::NodeSet;
pub use tagpath::{NodeSelector, Tag, TagPath, TagPathNavigator};

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree does not expand external entities, so allowing a DTD is safe.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
