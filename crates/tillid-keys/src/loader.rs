#![forbid(unsafe_code)]

//! Key and certificate loading from PEM and DER.

use std::path::Path;

use tillid_core::Error;

use crate::certificate::Certificate;

/// Load an RSA private key from PEM data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_pem(pem_data: &[u8]) -> Result<rsa::RsaPrivateKey, Error> {
    use pkcs8::DecodePrivateKey;
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_pem(pem_str) {
        return Ok(pk);
    }

    use pkcs1::DecodeRsaPrivateKey;
    rsa::RsaPrivateKey::from_pkcs1_pem(pem_str)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key PEM: {e}")))
}

/// Load an RSA private key from DER data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_der(data: &[u8]) -> Result<rsa::RsaPrivateKey, Error> {
    use pkcs8::DecodePrivateKey;
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(data) {
        return Ok(pk);
    }

    use pkcs1::DecodeRsaPrivateKey;
    rsa::RsaPrivateKey::from_pkcs1_der(data)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key DER: {e}")))
}

fn is_pem(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"-----BEGIN")
}

/// Load a certificate, detecting PEM or DER.
pub fn load_certificate(data: &[u8]) -> Result<Certificate, Error> {
    if is_pem(data) {
        Certificate::from_pem(data)
    } else {
        Certificate::from_der(data)
    }
}

/// Load an RSA private key from a file, detecting PEM or DER.
pub fn load_private_key_file(path: &Path) -> Result<rsa::RsaPrivateKey, Error> {
    let data = std::fs::read(path)?;
    let key = if is_pem(&data) {
        load_rsa_private_pem(&data)
    } else {
        load_rsa_private_der(&data)
    };
    key.map_err(|e| Error::Key(format!("{}: {e}", path.display())))
}

/// Load a certificate from a file, detecting PEM or DER.
pub fn load_certificate_file(path: &Path) -> Result<Certificate, Error> {
    let data = std::fs::read(path)?;
    load_certificate(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_PEM: &str = include_str!("../../../test-data/keys/signer-key.pem");
    const CERT_PEM: &str = include_str!("../../../test-data/keys/signer-cert.pem");

    #[test]
    fn test_load_pkcs1_and_pkcs8() {
        use pkcs8::EncodePrivateKey;
        let key = load_rsa_private_pem(KEY_PEM.as_bytes()).unwrap();
        let pkcs8 = key.to_pkcs8_pem(pkcs8::LineEnding::LF).unwrap();
        let again = load_rsa_private_pem(pkcs8.as_bytes()).unwrap();
        assert_eq!(key, again);
        let der = key.to_pkcs8_der().unwrap();
        assert_eq!(load_rsa_private_der(der.as_bytes()).unwrap(), key);
    }

    #[test]
    fn test_load_certificate_pem_and_der() {
        let pem = load_certificate(CERT_PEM.as_bytes()).unwrap();
        let der = load_certificate(pem.der()).unwrap();
        assert_eq!(pem, der);
    }

    #[test]
    fn test_garbage_key() {
        assert!(matches!(
            load_rsa_private_pem(b"not a key"),
            Err(Error::Key(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_certificate_file(Path::new("/nonexistent/tillid.pem")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
