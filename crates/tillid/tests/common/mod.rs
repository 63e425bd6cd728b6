// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use tillid::core::ns;
use tillid::dsig::TrustPolicy;
use tillid::keys::{Certificate, CredentialVault, KeyMaterial};
use tillid::xml::XmlDocument;

pub const SIGNER_KEY: &[u8] = include_bytes!("../../../../test-data/keys/signer-key.pem");
pub const SIGNER_CERT: &[u8] = include_bytes!("../../../../test-data/keys/signer-cert.pem");
pub const SIGNER_RENEWED: &[u8] = include_bytes!("../../../../test-data/keys/signer-cert-renewed.pem");
pub const OTHER_KEY: &[u8] = include_bytes!("../../../../test-data/keys/other-key.pem");
pub const OTHER_CERT: &[u8] = include_bytes!("../../../../test-data/keys/other-cert.pem");

pub fn signer() -> KeyMaterial {
    KeyMaterial::from_pem(SIGNER_KEY, SIGNER_CERT).unwrap()
}

pub fn certificate(pem: &[u8]) -> Certificate {
    Certificate::from_pem(pem).unwrap()
}

pub fn trusting(pems: &[&[u8]]) -> TrustPolicy {
    let mut vault = CredentialVault::new();
    for pem in pems {
        vault.add_trusted_certificate(certificate(pem));
    }
    TrustPolicy::TrustStore(Arc::new(vault))
}

/// A DGWS request carrying an unsigned ID card.
pub fn dgws_request() -> XmlDocument {
    XmlDocument::parse(format!(
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="{soap}" xmlns:wsse="{wsse}" xmlns:wsu="{wsu}" xmlns:saml="{saml}" xmlns:medcom="{medcom}">"#,
            r#"<soapenv:Header><wsse:Security><wsu:Timestamp><wsu:Created>2026-10-19T08:00:00Z</wsu:Created></wsu:Timestamp>"#,
            r#"<saml:Assertion IssueInstant="2026-10-19T07:55:00Z" Version="2.0" id="IDCard">"#,
            r#"<saml:Issuer>TESTSTS</saml:Issuer>"#,
            r#"<saml:Subject><saml:NameID Format="medcom:cprnumber">2512484916</saml:NameID></saml:Subject>"#,
            r#"<saml:AttributeStatement id="IDCardData"><saml:Attribute Name="sosi:IDCardVersion"><saml:AttributeValue>1.0.1</saml:AttributeValue></saml:Attribute></saml:AttributeStatement>"#,
            r#"</saml:Assertion></wsse:Security>"#,
            r#"<medcom:Header><medcom:SecurityLevel>4</medcom:SecurityLevel></medcom:Header></soapenv:Header>"#,
            r#"<soapenv:Body><medcom:FlowStatusRequest/></soapenv:Body></soapenv:Envelope>"#,
        ),
        soap = ns::SOAP,
        wsse = ns::WSSE,
        wsu = ns::WSU,
        saml = ns::SAML,
        medcom = ns::MEDCOM,
    ))
    .unwrap()
}
