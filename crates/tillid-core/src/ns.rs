#![forbid(unsafe_code)]

//! XML namespace constants used across the engine.

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Exclusive C14N namespace (InclusiveNamespaces)
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// SOAP 1.1 envelope namespace
pub const SOAP: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// WS-Security secext 1.0 namespace
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security secext 1.1 namespace (TokenType attribute)
pub const WSSE11: &str = "http://docs.oasis-open.org/wss/oasis-wss-wssecurity-secext-1.1.xsd";

/// WS-Security utility namespace (`wsu:Id`, `wsu:Timestamp`)
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// WS-Addressing 1.0 namespace
pub const WSA: &str = "http://www.w3.org/2005/08/addressing";

/// Liberty ID-WSF SOAP binding framework namespace
pub const LIBERTY_SBF: &str = "urn:liberty:sb";

/// Liberty ID-WSF SOAP binding profile namespace
pub const LIBERTY_SBF_PROFILE: &str = "urn:liberty:sb:profile";

/// SAML 2.0 assertion namespace
pub const SAML: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// DGWS / MedCom header namespace
pub const MEDCOM: &str = "http://www.medcom.dk/dgws/2006/04/dgws-1.0.xsd";

// ── Preferred prefixes ───────────────────────────────────────────────

pub mod prefix {
    pub const DSIG: &str = "ds";
    pub const SOAP: &str = "soap";
    pub const WSSE: &str = "wsse";
    pub const WSSE11: &str = "wsse11";
    pub const WSU: &str = "wsu";
    pub const WSA: &str = "wsa";
    pub const LIBERTY_SBF: &str = "sbf";
    pub const SAML: &str = "saml";
    pub const MEDCOM: &str = "medcom";
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const INCLUSIVE_NAMESPACES: &str = "InclusiveNamespaces";

    // KeyInfo elements
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_NAME: &str = "KeyName";
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";

    // WS-Security elements
    pub const SECURITY: &str = "Security";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";
    pub const KEY_IDENTIFIER: &str = "KeyIdentifier";
    pub const TRANSFORMATION_PARAMETERS: &str = "TransformationParameters";
    pub const TIMESTAMP: &str = "Timestamp";

    // SOAP / addressing / Liberty elements
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";
    pub const MESSAGE_ID: &str = "MessageID";
    pub const ACTION: &str = "Action";
    pub const TO: &str = "To";
    pub const RELATES_TO: &str = "RelatesTo";
    pub const FRAMEWORK: &str = "Framework";

    // SAML elements
    pub const ASSERTION: &str = "Assertion";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const ALGORITHM: &str = "Algorithm";
    pub const PREFIX_LIST: &str = "PrefixList";
    pub const VALUE_TYPE: &str = "ValueType";
    pub const TOKEN_TYPE: &str = "TokenType";
}

// ── WS-Security token profile URIs ───────────────────────────────────

/// `ValueType` of a `KeyIdentifier` naming a SAML 2.0 assertion ID.
pub const SAML_ID_VALUE_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLID";

/// `TokenType` of a SAML 2.0 token.
pub const SAML2_TOKEN_TYPE: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV2.0";
