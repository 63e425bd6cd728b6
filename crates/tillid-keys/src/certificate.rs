#![forbid(unsafe_code)]

//! Parsed X.509 certificates.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use spki::DecodePublicKey;
use tillid_core::Error;

/// `serialNumber` attribute type (X.520), used by OCES for the subject's
/// CVR/FID or CPR/UID identifier.
const SUBJECT_SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");

/// An immutable, cheaply cloneable X.509 certificate with an RSA key.
///
/// Two certificates are equal when their DER encodings are equal.
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

struct Inner {
    der: Vec<u8>,
    /// Serial number without leading zero bytes.
    serial: Vec<u8>,
    subject: String,
    subject_serial_number: Option<String>,
    public_key: rsa::RsaPublicKey,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(data: &[u8]) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(data)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;

        let spki_der = tbs
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        let public_key = rsa::RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| Error::Certificate(format!("certificate key is not RSA: {e}")))?;

        let raw_serial = tbs.serial_number.as_bytes();
        let first = raw_serial
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(raw_serial.len().saturating_sub(1));
        let serial = raw_serial[first..].to_vec();

        let subject_serial_number = tbs
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == SUBJECT_SERIAL_NUMBER)
            .and_then(|atv| std::str::from_utf8(atv.value.value()).ok())
            .map(str::to_owned);

        Ok(Self {
            inner: Arc::new(Inner {
                der: data.to_vec(),
                serial,
                subject: tbs.subject.to_string(),
                subject_serial_number,
                public_key,
            }),
        })
    }

    /// Parse a PEM-encoded certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let pem_str = std::str::from_utf8(pem_data)
            .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;
        let (label, der_bytes) = pem_rfc7468::decode_vec(pem_str.trim().as_bytes())
            .map_err(|e| Error::Certificate(format!("failed to decode certificate PEM: {e}")))?;
        if label != "CERTIFICATE" {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        Self::from_der(&der_bytes)
    }

    /// Parse the base64 content of a `ds:X509Certificate` element.
    pub fn from_base64(text: &str) -> Result<Self, Error> {
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let der = base64::engine::general_purpose::STANDARD
            .decode(clean)
            .map_err(|e| Error::Base64(format!("X509Certificate: {e}")))?;
        Self::from_der(&der)
    }

    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    /// The DER encoding as base64, for `ds:X509Certificate`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.inner.der)
    }

    /// Serial number bytes without leading zeros.
    pub fn serial(&self) -> &[u8] {
        &self.inner.serial
    }

    /// Serial number as lower-case hex without leading zero bytes.
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.inner.serial)
    }

    /// The subject distinguished name in RFC 4514 form.
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    /// The subject's `serialNumber` attribute (e.g. `CVR:30808460-FID:94731315`).
    pub fn subject_serial_number(&self) -> Option<&str> {
        self.inner.subject_serial_number.as_deref()
    }

    pub fn public_key(&self) -> &rsa::RsaPublicKey {
        &self.inner.public_key
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.der == other.inner.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.inner.subject)
            .field("serial", &self.serial_hex())
            .finish()
    }
}
