#![forbid(unsafe_code)]

//! Federation certificate references (`OCES2,<subject serial>,<serial hex>`).

use std::fmt;
use std::str::FromStr;

use tillid_core::Error;
use tillid_keys::Certificate;

/// OCES certificate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OcesVersion {
    Oces1,
    #[default]
    Oces2,
    Oces3,
}

impl fmt::Display for OcesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OcesVersion::Oces1 => "OCES1",
            OcesVersion::Oces2 => "OCES2",
            OcesVersion::Oces3 => "OCES3",
        })
    }
}

impl FromStr for OcesVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OCES1" => Ok(OcesVersion::Oces1),
            "OCES2" => Ok(OcesVersion::Oces2),
            "OCES3" => Ok(OcesVersion::Oces3),
            other => Err(Error::NotSupported(format!("OCES version {other}"))),
        }
    }
}

/// Names a certificate in the federation by OCES generation, subject
/// serial number and certificate serial.
///
/// The string form is `<version>,<subject serial>,<serial hex>`. The
/// subject may itself contain commas; it is everything between the first
/// and the last comma.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FederationCertificateReference {
    oces_version: OcesVersion,
    subject_serial_number: String,
    certificate_serial_number: String,
}

impl FederationCertificateReference {
    /// Build a reference. The serial is normalized to lower-case hex
    /// without leading zero bytes.
    pub fn new(
        oces_version: OcesVersion,
        subject_serial_number: impl Into<String>,
        certificate_serial_hex: &str,
    ) -> Result<Self, Error> {
        let subject_serial_number = subject_serial_number.into();
        if subject_serial_number.trim().is_empty() {
            return Err(Error::XmlStructure(
                "federation reference without subject serial number".into(),
            ));
        }
        Ok(Self {
            oces_version,
            subject_serial_number,
            certificate_serial_number: normalize_serial(certificate_serial_hex)?,
        })
    }

    /// The reference naming `certificate`.
    pub fn for_certificate(oces_version: OcesVersion, certificate: &Certificate) -> Result<Self, Error> {
        let subject = certificate.subject_serial_number().ok_or_else(|| {
            Error::Certificate(format!(
                "certificate {} has no subject serial number",
                certificate.subject()
            ))
        })?;
        Self::new(oces_version, subject, &certificate.serial_hex())
    }

    pub fn oces_version(&self) -> OcesVersion {
        self.oces_version
    }

    pub fn subject_serial_number(&self) -> &str {
        &self.subject_serial_number
    }

    /// Lower-case hex without leading zero bytes.
    pub fn certificate_serial_number(&self) -> &str {
        &self.certificate_serial_number
    }

    /// Check that `certificate` is the one this reference names.
    pub fn matches(&self, certificate: &Certificate) -> bool {
        certificate.serial_hex() == self.certificate_serial_number
            && certificate.subject_serial_number() == Some(self.subject_serial_number.as_str())
    }
}

fn normalize_serial(hex: &str) -> Result<String, Error> {
    let hex = hex.trim().to_ascii_lowercase();
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::XmlStructure(format!(
            "invalid certificate serial in federation reference: {hex}"
        )));
    }
    let padded = if hex.len() % 2 == 1 { format!("0{hex}") } else { hex };
    let trimmed = padded.trim_start_matches("00");
    Ok(if trimmed.is_empty() { "00".to_owned() } else { trimmed.to_owned() })
}

impl fmt::Display for FederationCertificateReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.oces_version, self.subject_serial_number, self.certificate_serial_number
        )
    }
}

impl FromStr for FederationCertificateReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (version, rest) = s.split_once(',').ok_or_else(|| {
            Error::XmlStructure(format!("malformed federation certificate reference: {s}"))
        })?;
        let (subject, serial) = rest.rsplit_once(',').ok_or_else(|| {
            Error::XmlStructure(format!("malformed federation certificate reference: {s}"))
        })?;
        Self::new(version.parse()?, subject, serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let r: FederationCertificateReference = "OCES2,CVR:30808460-FID:94731315,4c0a2b1f"
            .parse()
            .unwrap();
        assert_eq!(r.oces_version(), OcesVersion::Oces2);
        assert_eq!(r.subject_serial_number(), "CVR:30808460-FID:94731315");
        assert_eq!(r.certificate_serial_number(), "4c0a2b1f");
        assert_eq!(r.to_string(), "OCES2,CVR:30808460-FID:94731315,4c0a2b1f");
    }

    #[test]
    fn test_subject_with_commas_round_trips() {
        let r = FederationCertificateReference::new(OcesVersion::Oces3, "CN=a,O=b, c", "ff").unwrap();
        let s = r.to_string();
        assert_eq!(s, "OCES3,CN=a,O=b, c,ff");
        assert_eq!(s.parse::<FederationCertificateReference>().unwrap(), r);
    }

    #[test]
    fn test_serial_normalization() {
        let r = FederationCertificateReference::new(OcesVersion::Oces2, "x", "004C0A2B1F").unwrap();
        assert_eq!(r.certificate_serial_number(), "4c0a2b1f");
        let r = FederationCertificateReference::new(OcesVersion::Oces2, "x", "abc").unwrap();
        assert_eq!(r.certificate_serial_number(), "0abc");
    }

    #[test]
    fn test_malformed() {
        assert!("OCES2".parse::<FederationCertificateReference>().is_err());
        assert!("OCES2,4c0a".parse::<FederationCertificateReference>().is_err());
        assert!("OCES2,subj,xyz".parse::<FederationCertificateReference>().is_err());
        assert!(matches!(
            "OCES9,subj,01".parse::<FederationCertificateReference>(),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_for_certificate() {
        let cert = Certificate::from_pem(
            include_bytes!("../../../test-data/keys/signer-cert.pem"),
        )
        .unwrap();
        let r = FederationCertificateReference::for_certificate(OcesVersion::Oces2, &cert).unwrap();
        assert_eq!(r.to_string(), "OCES2,CVR:30808460-FID:94731315,4c0a2b1f");
        assert!(r.matches(&cert));
    }
}
