#![forbid(unsafe_code)]

//! Tag constants for the schemas used in DGWS / Liberty messages.

use crate::tagpath::Tag;
use tillid_core::ns::{self, node, prefix};

// ── XML-DSig ─────────────────────────────────────────────────────────

pub const DS_SIGNATURE: Tag = Tag::new(ns::DSIG, node::SIGNATURE, prefix::DSIG);
pub const DS_SIGNED_INFO: Tag = Tag::new(ns::DSIG, node::SIGNED_INFO, prefix::DSIG);
pub const DS_SIGNATURE_VALUE: Tag = Tag::new(ns::DSIG, node::SIGNATURE_VALUE, prefix::DSIG);
pub const DS_KEY_INFO: Tag = Tag::new(ns::DSIG, node::KEY_INFO, prefix::DSIG);
pub const DS_KEY_NAME: Tag = Tag::new(ns::DSIG, node::KEY_NAME, prefix::DSIG);
pub const DS_X509_DATA: Tag = Tag::new(ns::DSIG, node::X509_DATA, prefix::DSIG);
pub const DS_X509_CERTIFICATE: Tag = Tag::new(ns::DSIG, node::X509_CERTIFICATE, prefix::DSIG);

// ── SOAP ─────────────────────────────────────────────────────────────

pub const SOAP_ENVELOPE: Tag = Tag::new(ns::SOAP, node::ENVELOPE, prefix::SOAP);
pub const SOAP_HEADER: Tag = Tag::new(ns::SOAP, node::HEADER, prefix::SOAP);
pub const SOAP_BODY: Tag = Tag::new(ns::SOAP, node::BODY, prefix::SOAP);

// ── WS-Security ──────────────────────────────────────────────────────

pub const WSSE_SECURITY: Tag = Tag::new(ns::WSSE, node::SECURITY, prefix::WSSE);
pub const WSSE_SECURITY_TOKEN_REFERENCE: Tag =
    Tag::new(ns::WSSE, node::SECURITY_TOKEN_REFERENCE, prefix::WSSE);
pub const WSSE_KEY_IDENTIFIER: Tag = Tag::new(ns::WSSE, node::KEY_IDENTIFIER, prefix::WSSE);
pub const WSSE_TRANSFORMATION_PARAMETERS: Tag =
    Tag::new(ns::WSSE, node::TRANSFORMATION_PARAMETERS, prefix::WSSE);
pub const WSU_TIMESTAMP: Tag = Tag::new(ns::WSU, node::TIMESTAMP, prefix::WSU);

// ── WS-Addressing ────────────────────────────────────────────────────

pub const WSA_MESSAGE_ID: Tag = Tag::new(ns::WSA, node::MESSAGE_ID, prefix::WSA);
pub const WSA_ACTION: Tag = Tag::new(ns::WSA, node::ACTION, prefix::WSA);
pub const WSA_TO: Tag = Tag::new(ns::WSA, node::TO, prefix::WSA);
pub const WSA_RELATES_TO: Tag = Tag::new(ns::WSA, node::RELATES_TO, prefix::WSA);

// ── Liberty / SAML / DGWS ────────────────────────────────────────────

pub const SBF_FRAMEWORK: Tag = Tag::new(ns::LIBERTY_SBF, node::FRAMEWORK, prefix::LIBERTY_SBF);
pub const SAML_ASSERTION: Tag = Tag::new(ns::SAML, node::ASSERTION, prefix::SAML);
pub const MEDCOM_HEADER: Tag = Tag::new(ns::MEDCOM, node::HEADER, prefix::MEDCOM);
