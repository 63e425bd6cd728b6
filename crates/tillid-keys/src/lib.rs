#![forbid(unsafe_code)]

//! Key material for the Tillid trust engine.
//!
//! Loads RSA keys and X.509 certificates from PEM or DER, exposes signing
//! through the [`SignatureProvider`] capability so hardware-backed signers
//! can stand in for an in-memory key, and keeps a [`CredentialVault`] of
//! trusted certificates.

pub mod certificate;
pub mod loader;
pub mod provider;
pub mod vault;

pub use certificate::Certificate;
pub use provider::{KeyMaterial, SignatureProvider};
pub use vault::{CredentialVault, TrustStore};
