#![forbid(unsafe_code)]

//! Federation trust for the Tillid trust engine.
//!
//! Signatures may name their certificate by reference instead of embedding
//! it. The reference is resolved through a per-OCES-generation remote
//! [`CertificateStore`], validated against the serial it names, and cached
//! in a shared [`CertificateCache`]. A [`Federation`] decides which
//! certificates it vouches for.

pub mod cache;
pub mod federation;
pub mod reference;
pub mod resolver;
pub mod store;

pub use cache::{CacheEntry, CertificateCache, CertificateCategory, MemoryCertificateCache};
pub use federation::{Federation, OcesFederation};
pub use reference::{FederationCertificateReference, OcesVersion};
pub use resolver::{CertificateResolver, FederationCertificateResolver};
pub use store::{CertificateStore, DirectoryCertificateStore, StaticCertificateStore};
