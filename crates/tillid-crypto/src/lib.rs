#![forbid(unsafe_code)]

//! Cryptographic algorithms for the Tillid trust engine.
//!
//! Only what the DGWS profiles sign with: SHA-1 and SHA-256 digests and
//! RSA PKCS#1 v1.5 signatures over them.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
