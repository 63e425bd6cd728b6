#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Signing happens in two halves so the private key can live elsewhere:
//! [`compute_signed_info_digest_bytes`] inserts a signature with its
//! references digested and returns the canonical `SignedInfo` bytes, and
//! [`inject_signature`] completes it with the signature value and
//! `KeyInfo`. [`sign`] runs both against a [`SignatureProvider`].

use base64::Engine;
use roxmltree::Node;
use tillid_core::{algorithm, ns, Error};
use tillid_federation::FederationCertificateReference;
use tillid_keys::{Certificate, SignatureProvider};
use tillid_xml::document::{count_by_id, element_at, element_prefix, find_by_id, find_elements};
use tillid_xml::writer::XmlWriter;
use tillid_xml::{xpath, TextEdit, XmlDocument};

use crate::context::DsigContext;
use crate::keyinfo::KeyInfoContent;
use crate::reference::{ReferenceKind, SignatureConfiguration};
use crate::signature::ParsedSignature;
use crate::tidy;
use crate::verify::{self, VerifyResult};

/// Sign `doc` in place.
///
/// On error the document is left as it was.
pub fn sign(
    provider: &dyn SignatureProvider,
    doc: &mut XmlDocument,
    config: &SignatureConfiguration,
) -> Result<(), Error> {
    let mut work = doc.clone();
    let signed_info = prepare(&mut work, config, provider.signature_method())?;
    let value = provider.sign(&signed_info)?;
    let value = base64::engine::general_purpose::STANDARD.encode(value);
    inject_signature(&mut work, &value, config, provider.certificate(), false)?;
    *doc = work;
    log::info!(
        "signed {} reference(s) with {}",
        config.references.len(),
        provider.certificate().subject()
    );
    Ok(())
}

/// Insert an unsigned `ds:Signature` for `config` and return the canonical
/// `SignedInfo` bytes an external signer must sign with RSA-SHA1.
///
/// The document keeps the half-built signature; complete it with
/// [`inject_signature`].
pub fn compute_signed_info_digest_bytes(
    doc: &mut XmlDocument,
    config: &SignatureConfiguration,
) -> Result<Vec<u8>, Error> {
    let mut work = doc.clone();
    let bytes = prepare(&mut work, config, algorithm::RSA_SHA1)?;
    *doc = work;
    Ok(bytes)
}

/// Complete the signature inserted by [`compute_signed_info_digest_bytes`]
/// with a base64 signature value and a `KeyInfo` for `certificate`.
///
/// With `validate` set, the completed signature is verified against
/// `certificate` and the document is left untouched if it does not hold.
pub fn inject_signature(
    doc: &mut XmlDocument,
    signature_value: &str,
    config: &SignatureConfiguration,
    certificate: &Certificate,
    validate: bool,
) -> Result<(), Error> {
    let key_info = if config.add_certificate_as_reference {
        KeyInfoContent::Reference(FederationCertificateReference::for_certificate(
            config.reference_version,
            certificate,
        )?)
    } else {
        KeyInfoContent::Certificate(certificate.clone())
    };

    let mut work = doc.clone();
    let position = {
        let parsed = work.parse_doc()?;
        let signature = pending_signature(&parsed)?;
        let value_node = ParsedSignature::read(signature)?.signature_value;
        let prefix = element_prefix(value_node);
        let name = qualified(prefix, ns::node::SIGNATURE_VALUE);

        let mut w = XmlWriter::new();
        w.text_element(&name, &[], signature_value.trim());
        let mut content = w.into_string();
        content.push_str(&key_info.render(prefix, config.key_info_id.as_deref()));

        let position = signature.range().start;
        let edit = TextEdit::replace_node(value_node, &content);
        drop(parsed);
        work.apply_edits(vec![edit])?;
        position
    };
    tidy::tidy_signature_at(&mut work, position)?;

    if validate {
        let ctx = context_for(config);
        let parsed = work.parse_doc()?;
        let signature = element_at(&parsed, position)
            .ok_or_else(|| Error::MissingElement("ds:Signature".into()))?;
        let id_attrs = ctx.id_attrs_for(&work);
        let result = verify::check_signature(&ctx, &ParsedSignature::read(signature)?, certificate, &id_attrs)?;
        if let VerifyResult::Invalid { reason, .. } = result {
            return Err(Error::SignatureInvalid(format!("injected signature: {reason}")));
        }
    }

    *doc = work;
    Ok(())
}

pub(crate) fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_owned()
    } else {
        format!("{prefix}:{local}")
    }
}

fn context_for(config: &SignatureConfiguration) -> DsigContext {
    let mut ctx = DsigContext::new();
    if let Some(name) = &config.id_attribute_name {
        ctx.add_id_attr(name);
    }
    ctx
}

/// The only `ds:Signature` whose `SignatureValue` is still empty.
fn pending_signature<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Result<Node<'a, 'input>, Error> {
    let pending: Vec<_> = find_elements(doc.root(), ns::DSIG, ns::node::SIGNATURE)
        .into_iter()
        .filter(|sig| {
            find_elements(*sig, ns::DSIG, ns::node::SIGNATURE_VALUE)
                .first()
                .is_some_and(|v| v.text().map_or(true, |t| t.trim().is_empty()))
        })
        .collect();
    match pending.as_slice() {
        [] => Err(Error::MissingElement("unsigned ds:Signature".into())),
        [sig] => Ok(*sig),
        many => Err(Error::DuplicateElement("unsigned ds:Signature".into(), many.len())),
    }
}

fn resolve_id<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    id: &str,
    id_attrs: &[String],
    what: &str,
) -> Result<Node<'a, 'input>, Error> {
    match count_by_id(doc, id, id_attrs) {
        0 => Err(Error::Config(format!("{what} {id} not found"))),
        1 => find_by_id(doc, id, id_attrs)
            .ok_or_else(|| Error::Config(format!("{what} {id} not found"))),
        n => Err(Error::DuplicateElement(format!("element with ID {id}"), n)),
    }
}

/// Where the signature goes: appended to `parent`, or before `sibling`.
struct Placement<'a, 'input> {
    parent: Node<'a, 'input>,
    sibling: Option<Node<'a, 'input>>,
}

fn placement<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    config: &SignatureConfiguration,
    id_attrs: &[String],
) -> Result<Placement<'a, 'input>, Error> {
    let parent = match &config.signature_parent_id {
        Some(id) => Some(resolve_id(doc, id, id_attrs, "signature parent")?),
        None => None,
    };
    let sibling = match &config.signature_sibling {
        Some(selector) => Some(
            selector
                .select(doc, id_attrs)
                .ok_or_else(|| Error::Config(format!("signature sibling {selector} not found")))?,
        ),
        None => None,
    };
    match (parent, sibling) {
        (_, Some(sibling)) => {
            let sibling_parent = sibling
                .parent_element()
                .ok_or_else(|| Error::Config("signature sibling is the document element".into()))?;
            if parent.is_some_and(|p| p != sibling_parent) {
                return Err(Error::Config(format!(
                    "signature sibling {} is not a child of the signature parent",
                    sibling.tag_name().name()
                )));
            }
            Ok(Placement {
                parent: sibling_parent,
                sibling: Some(sibling),
            })
        }
        (Some(parent), None) => Ok(Placement {
            parent,
            sibling: None,
        }),
        (None, None) => Ok(Placement {
            parent: doc.root_element(),
            sibling: None,
        }),
    }
}

/// Render the signature with empty digest and signature values.
fn render_skeleton(kinds: &[(String, ReferenceKind)], signature_method: &str) -> String {
    let ds = ns::prefix::DSIG;
    let signature = qualified(ds, ns::node::SIGNATURE);
    let signed_info = qualified(ds, ns::node::SIGNED_INFO);
    let reference = qualified(ds, ns::node::REFERENCE);
    let digest_value = qualified(ds, ns::node::DIGEST_VALUE);
    let xmlns = format!("xmlns:{ds}");

    let mut w = XmlWriter::new();
    w.start_element(&signature, &[(xmlns.as_str(), ns::DSIG)]);
    w.start_element(&signed_info, &[]);
    w.empty_element(
        &qualified(ds, ns::node::CANONICALIZATION_METHOD),
        &[(ns::attr::ALGORITHM, algorithm::EXC_C14N)],
    );
    w.empty_element(
        &qualified(ds, ns::node::SIGNATURE_METHOD),
        &[(ns::attr::ALGORITHM, signature_method)],
    );
    for (uri, kind) in kinds {
        w.start_element(&reference, &[(ns::attr::URI, uri.as_str())]);
        kind.write_transforms(&mut w, ds);
        w.empty_element(
            &qualified(ds, ns::node::DIGEST_METHOD),
            &[(ns::attr::ALGORITHM, algorithm::SHA1)],
        );
        w.start_element(&digest_value, &[]);
        w.end_element(&digest_value);
        w.end_element(&reference);
    }
    w.end_element(&signed_info);
    let value = qualified(ds, ns::node::SIGNATURE_VALUE);
    w.start_element(&value, &[]);
    w.end_element(&value);
    w.end_element(&signature);
    w.into_string()
}

/// Insert the signature, fill in its digests and return the canonical
/// `SignedInfo`.
fn prepare(
    doc: &mut XmlDocument,
    config: &SignatureConfiguration,
    signature_method: &str,
) -> Result<Vec<u8>, Error> {
    config.validate()?;
    tillid_crypto::sign::from_uri(signature_method)?;
    let ctx = context_for(config);
    if let Some(name) = &config.id_attribute_name {
        doc.add_id_attr(name);
    }
    let id_attrs = ctx.id_attrs_for(doc);

    // 1. Insert the skeleton
    let edit = {
        let parsed = doc.parse_doc()?;
        let place = placement(&parsed, config, &id_attrs)?;
        let mut kinds = Vec::with_capacity(config.references.len());
        for reference in &config.references {
            let target = resolve_id(&parsed, &reference.element_id, &id_attrs, "element")?;
            let kind = if reference.kind == ReferenceKind::DirectNotEnveloped
                && xpath::is_ancestor_or_self(target, place.parent)
            {
                log::debug!(
                    "{} contains the signature, signing it enveloped",
                    reference.uri()
                );
                ReferenceKind::DirectEnveloped
            } else {
                reference.kind
            };
            kinds.push((reference.uri(), kind));
        }
        let skeleton = render_skeleton(&kinds, signature_method);
        match place.sibling {
            Some(sibling) => TextEdit::insert_before(sibling, &skeleton),
            None => TextEdit::append_child(place.parent, &skeleton)?,
        }
    };
    let position = edit.content_position();
    doc.apply_edits(vec![edit])?;
    tidy::tidy_signature_at(doc, position)?;

    // 2. Digest the references
    let edits = {
        let parsed = doc.parse_doc()?;
        let node = element_at(&parsed, position)
            .ok_or_else(|| Error::MissingElement("ds:Signature".into()))?;
        let signature = ParsedSignature::read(node)?;
        let mut edits = Vec::with_capacity(signature.references.len());
        for reference in &signature.references {
            let digest = reference.compute_digest(node.id(), &ctx, &id_attrs)?;
            let name = qualified(element_prefix(reference.digest_value), ns::node::DIGEST_VALUE);
            let mut w = XmlWriter::new();
            w.text_element(&name, &[], &base64::engine::general_purpose::STANDARD.encode(digest));
            edits.push(TextEdit::replace_node(reference.digest_value, &w.into_string()));
        }
        edits
    };
    doc.apply_edits(edits)?;

    // 3. Canonicalize SignedInfo
    let parsed = doc.parse_doc()?;
    let node = element_at(&parsed, position)
        .ok_or_else(|| Error::MissingElement("ds:Signature".into()))?;
    let bytes = ParsedSignature::read(node)?.canonical_signed_info()?;
    ctx.trace_bytes("pre-signature data", &bytes);
    Ok(bytes)
}
