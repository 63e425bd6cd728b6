#![forbid(unsafe_code)]

/// Errors produced by the Tillid trust engine.
///
/// Every variant belongs to one of the categories in [`ErrorKind`], so
/// callers can log structural problems differently from cryptographic or
/// trust failures while still rejecting the message in all cases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("expected exactly one {0}, found {1}")]
    DuplicateElement(String, usize),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("ambiguous KeyInfo: {0} KeyName elements")]
    AmbiguousKeyName(usize),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("required element not covered by signature: {0}")]
    NotCovered(String),

    #[error("security token reference mismatch: {0}")]
    TokenReferenceMismatch(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("certificate not trusted: {0}")]
    Untrusted(String),

    #[error("federation reference not supported: {0}")]
    NotSupported(String),

    #[error("certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("certificate lookup failed: {0}")]
    LookupFailed(String),

    #[error("certificate serial mismatch: reference names {expected}, store returned {actual}")]
    SerialMismatch { expected: String, actual: String },

    #[error("certificate subject mismatch: reference names {expected}, store returned {actual}")]
    SubjectMismatch { expected: String, actual: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// The coarse failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Signature element missing or duplicated, ambiguous key naming,
    /// malformed references, required element not covered.
    Structural,
    /// Digest or signature value mismatch, unusable key or certificate.
    Crypto,
    /// The certificate is not recognised by the trust authority.
    Trust,
    /// Remote certificate lookup failed or returned the wrong certificate.
    Lookup,
    /// The caller supplied an unusable configuration.
    Config,
    Other,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::XmlParse(_)
            | Error::XmlStructure(_)
            | Error::MissingElement(_)
            | Error::DuplicateElement(..)
            | Error::MissingAttribute(_)
            | Error::AmbiguousKeyName(_)
            | Error::InvalidUri(_)
            | Error::NotCovered(_)
            | Error::TokenReferenceMismatch(_) => ErrorKind::Structural,
            Error::UnsupportedAlgorithm(_)
            | Error::Canonicalization(_)
            | Error::Transform(_)
            | Error::DigestMismatch(_)
            | Error::SignatureInvalid(_)
            | Error::Crypto(_)
            | Error::Key(_)
            | Error::Certificate(_)
            | Error::Base64(_) => ErrorKind::Crypto,
            Error::Untrusted(_) => ErrorKind::Trust,
            Error::NotSupported(_)
            | Error::CertificateNotFound(_)
            | Error::LookupFailed(_)
            | Error::SerialMismatch { .. }
            | Error::SubjectMismatch { .. } => ErrorKind::Lookup,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) | Error::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
