#![forbid(unsafe_code)]

//! DGWS ID card validation.

use tillid_core::Error;
use tillid_xml::document::{element_id, find_child_element};
use tillid_xml::{tags, NodeSelector, TagPath, TagPathNavigator, XmlDocument};

use crate::signature::{ParsedSignature, ParsedTransform};
use crate::verify::{TrustPolicy, Validator, VerifyResult};

/// Validates the enveloped signature of the ID card
/// (`wsse:Security/saml:Assertion`) in a DGWS SOAP header.
#[derive(Clone, Default)]
pub struct IdCardValidator {
    validator: Validator,
}

impl IdCardValidator {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Where the ID card sits in a DGWS message.
    pub fn assertion_path() -> TagPath {
        TagPath::new(vec![
            tags::SOAP_ENVELOPE,
            tags::SOAP_HEADER,
            tags::WSSE_SECURITY,
            tags::SAML_ASSERTION,
        ])
    }

    pub fn signature_path() -> TagPath {
        Self::assertion_path().then(tags::DS_SIGNATURE)
    }

    /// Verify the ID card signature. It must reference the assertion
    /// itself with the enveloped-signature transform.
    pub fn verify(&self, doc: &XmlDocument, policy: &TrustPolicy) -> Result<VerifyResult, Error> {
        {
            let parsed = doc.parse_doc()?;
            let id_attrs = self.validator.context().id_attrs_for(doc);
            let path = Self::assertion_path();
            let assertion = TagPathNavigator::new(&parsed)
                .resolve_from_document(&path)
                .ok_or_else(|| Error::MissingElement(path.to_string()))?;
            let id = element_id(assertion, &id_attrs)
                .ok_or_else(|| Error::MissingAttribute(format!("id on {path}")))?;
            let signature_node = find_child_element(
                assertion,
                tags::DS_SIGNATURE.namespace,
                tags::DS_SIGNATURE.local_name,
            )
            .ok_or_else(|| Error::MissingElement(tags::DS_SIGNATURE.to_string()))?;
            let signature = ParsedSignature::read(signature_node)?;
            let covers_card = signature.references.iter().any(|r| {
                r.uri.strip_prefix('#') == Some(id)
                    && r.transforms.contains(&ParsedTransform::Enveloped)
            });
            if !covers_card {
                return Err(Error::NotCovered(format!("ID card {id}")));
            }
            log::debug!("validating ID card {id}");
        }
        self.validator
            .verify(doc, &NodeSelector::Path(Self::signature_path()), policy)
    }

    pub fn validate(&self, doc: &XmlDocument, policy: &TrustPolicy) -> Result<bool, Error> {
        Ok(self.verify(doc, policy)?.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{SignatureConfiguration, SignatureReference};
    use crate::sign::sign;
    use std::sync::Arc;
    use tillid_core::ns;
    use tillid_keys::{Certificate, CredentialVault, KeyMaterial};

    const KEY_PEM: &[u8] = include_bytes!("../../../test-data/keys/signer-key.pem");
    const CERT_PEM: &[u8] = include_bytes!("../../../test-data/keys/signer-cert.pem");

    fn message() -> XmlDocument {
        XmlDocument::parse(format!(
            r#"<soap:Envelope xmlns:soap="{soap}" xmlns:wsse="{wsse}" xmlns:saml="{saml}"><soap:Header><wsse:Security><saml:Assertion id="IDCard"><saml:Issuer>TEST</saml:Issuer></saml:Assertion></wsse:Security></soap:Header><soap:Body/></soap:Envelope>"#,
            soap = ns::SOAP,
            wsse = ns::WSSE,
            saml = ns::SAML,
        ))
        .unwrap()
    }

    fn policy() -> TrustPolicy {
        let mut vault = CredentialVault::new();
        vault.add_trusted_certificate(Certificate::from_pem(CERT_PEM).unwrap());
        TrustPolicy::TrustStore(Arc::new(vault))
    }

    fn sign_with(doc: &mut XmlDocument, reference: SignatureReference) {
        let km = KeyMaterial::from_pem(KEY_PEM, CERT_PEM).unwrap();
        let config = SignatureConfiguration::new(vec![reference]).with_parent("IDCard");
        sign(&km, doc, &config).unwrap();
    }

    #[test]
    fn test_signed_id_card() {
        let mut doc = message();
        sign_with(&mut doc, SignatureReference::enveloped("IDCard"));
        assert!(IdCardValidator::default().validate(&doc, &policy()).unwrap());
    }

    #[test]
    fn test_unsigned_id_card() {
        let err = IdCardValidator::default().verify(&message(), &policy()).unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }

    #[test]
    fn test_signature_over_other_element() {
        let mut doc = XmlDocument::parse(message().text().replace(
            "<saml:Issuer>",
            r#"<saml:Issuer Id="issuer">"#,
        ))
        .unwrap();
        sign_with(&mut doc, SignatureReference::not_enveloped("issuer"));
        let err = IdCardValidator::default().verify(&doc, &policy()).unwrap_err();
        assert!(matches!(err, Error::NotCovered(_)));
    }
}
