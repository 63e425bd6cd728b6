#![forbid(unsafe_code)]

//! XML Digital Signature support for DGWS, OIOSAML and Liberty ID-WSF.
//!
//! [`sign::sign`] adds a `ds:Signature` over a configured list of element
//! references; [`verify::Validator`] checks such signatures, resolving the
//! signing certificate either from the signature itself or through a
//! federation lookup, and [`liberty::LibertyValidator`] checks that a
//! Liberty message signature covers every element the profile requires.

pub mod context;
pub mod idcard;
pub mod keyinfo;
pub mod liberty;
pub mod reference;
pub mod sign;
pub mod signature;
pub mod tidy;
pub mod verify;

pub use context::DsigContext;
pub use idcard::IdCardValidator;
pub use keyinfo::KeyInfoContent;
pub use liberty::LibertyValidator;
pub use reference::{ReferenceKind, SignatureConfiguration, SignatureReference};
pub use sign::{compute_signed_info_digest_bytes, inject_signature, sign};
pub use verify::{InvalidKind, TrustPolicy, Validator, VerifyResult};
