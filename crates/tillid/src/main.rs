#![forbid(unsafe_code)]

//! Tillid CLI: sign and verify DGWS, OIOSAML and Liberty ID-WSF messages.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tillid_core::Error;
use tillid_dsig::{
    IdCardValidator, LibertyValidator, ReferenceKind, SignatureConfiguration, SignatureReference,
    TrustPolicy, Validator, VerifyResult,
};
use tillid_federation::{
    cache, DirectoryCertificateStore, FederationCertificateReference, FederationCertificateResolver,
    MemoryCertificateCache, OcesFederation, OcesVersion,
};
use tillid_keys::{loader, CredentialVault, KeyMaterial};
use tillid_xml::{tags, NodeSelector, XmlDocument};

#[derive(Parser)]
#[command(
    name = "tillid",
    about = "Tillid — signing and validation for DGWS, OIOSAML and Liberty ID-WSF",
    version
)]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign elements of an XML document
    Sign {
        /// Input XML file
        file: PathBuf,

        /// Private key (PEM or DER)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Certificate of the key (PEM or DER)
        #[arg(long)]
        cert: PathBuf,

        /// Element to sign as [direct|enveloped|str:]ID, in signing order
        #[arg(short = 'r', long = "ref", required = true)]
        references: Vec<String>,

        /// ID of the element the signature is appended to
        #[arg(long)]
        parent: Option<String>,

        /// Publish the certificate as a federation reference of this OCES
        /// generation instead of embedding it
        #[arg(long = "key-name")]
        key_name: Option<OcesVersion>,

        /// Id attribute for ds:KeyInfo
        #[arg(long = "key-info-id")]
        key_info_id: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Register an additional ID attribute name
        #[arg(long = "id-attr")]
        id_attr: Option<String>,
    },

    /// Verify a signature
    Verify {
        /// Input XML file
        file: PathBuf,

        /// Verify the signature with this ID instead of the only one present
        #[arg(long, conflicts_with_all = ["id_card", "liberty"])]
        signature: Option<String>,

        /// Verify the DGWS ID card in the SOAP header
        #[arg(long = "id-card", conflicts_with = "liberty")]
        id_card: bool,

        /// Verify the Liberty message signature, including coverage
        #[arg(long)]
        liberty: bool,

        /// Trusted certificate file or directory of certificates
        #[arg(long)]
        trusted: Vec<PathBuf>,

        /// Directory of published federation certificates
        #[arg(long = "federation-dir")]
        federation_dir: Option<PathBuf>,

        /// OCES generation of the federation directory
        #[arg(long, default_value = "OCES2")]
        oces: OcesVersion,

        /// Only check the cryptography
        #[arg(long = "no-trust")]
        no_trust: bool,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,
    },

    /// Print the federation reference (ds:KeyName) of a certificate
    KeyName {
        /// Certificate (PEM or DER)
        cert: PathBuf,

        /// OCES generation
        #[arg(long, default_value = "OCES2")]
        oces: OcesVersion,
    },

    /// List supported algorithms and profiles
    Info,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Sign {
            file,
            key,
            cert,
            references,
            parent,
            key_name,
            key_info_id,
            output,
            id_attr,
        } => cmd_sign(
            file,
            key,
            cert,
            references,
            parent,
            key_name,
            key_info_id,
            output,
            id_attr,
        ),

        Commands::Verify {
            file,
            signature,
            id_card,
            liberty,
            trusted,
            federation_dir,
            oces,
            no_trust,
            id_attr,
        } => cmd_verify(VerifyArgs {
            file,
            signature,
            id_card,
            liberty,
            trusted,
            federation_dir,
            oces,
            no_trust,
            id_attr,
        }),

        Commands::KeyName { cert, oces } => cmd_key_name(cert, oces),

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Parse `[direct|enveloped|str:]ID`.
fn parse_reference(arg: &str) -> Result<SignatureReference, Error> {
    let (kind, id) = match arg.split_once(':') {
        Some(("direct", id)) => (ReferenceKind::DirectNotEnveloped, id),
        Some(("enveloped", id)) => (ReferenceKind::DirectEnveloped, id),
        Some(("str", id)) => (ReferenceKind::SecurityTokenReference, id),
        Some((kind, _)) => {
            return Err(Error::Config(format!(
                "unknown reference kind {kind} (expected direct, enveloped or str)"
            )))
        }
        None => (ReferenceKind::DirectNotEnveloped, arg),
    };
    Ok(SignatureReference::new(id, kind))
}

#[allow(clippy::too_many_arguments)]
fn cmd_sign(
    file: PathBuf,
    key: PathBuf,
    cert: PathBuf,
    references: Vec<String>,
    parent: Option<String>,
    key_name: Option<OcesVersion>,
    key_info_id: Option<String>,
    output: Option<PathBuf>,
    id_attr: Option<String>,
) -> Result<(), Error> {
    let mut doc = read_document(&file)?;
    let km = KeyMaterial::from_files(&key, &cert)?;

    let references = references
        .iter()
        .map(|r| parse_reference(r))
        .collect::<Result<Vec<_>, _>>()?;
    let mut config = SignatureConfiguration::new(references);
    if let Some(parent) = parent {
        config = config.with_parent(parent);
    }
    if let Some(version) = key_name {
        config = config.with_certificate_reference(version);
    }
    if let Some(id) = key_info_id {
        config = config.with_key_info_id(id);
    }
    if let Some(name) = id_attr {
        config = config.with_id_attribute(name);
    }

    log::debug!("signing {}", file.display());
    tillid_dsig::sign(&km, &mut doc, &config)?;
    write_output(output, doc.text().as_bytes())
}

struct VerifyArgs {
    file: PathBuf,
    signature: Option<String>,
    id_card: bool,
    liberty: bool,
    trusted: Vec<PathBuf>,
    federation_dir: Option<PathBuf>,
    oces: OcesVersion,
    no_trust: bool,
    id_attr: Vec<String>,
}

fn cmd_verify(args: VerifyArgs) -> Result<(), Error> {
    let doc = read_document(&args.file)?;

    let mut validator = Validator::new().check_trust(!args.no_trust);
    for attr in &args.id_attr {
        validator = validator.with_id_attr(attr);
    }

    let federation = match &args.federation_dir {
        Some(dir) => {
            cache::init_global(Arc::new(MemoryCertificateCache::new()))?;
            let resolver = Arc::new(
                FederationCertificateResolver::new(cache::global()?)
                    .with_store(args.oces, Arc::new(DirectoryCertificateStore::new(dir))),
            );
            validator = validator.with_resolver(resolver.clone());
            let federation: Arc<dyn tillid_federation::Federation> =
                Arc::new(OcesFederation::new("OCES", args.oces, resolver));
            Some(federation)
        }
        None => None,
    };
    let trust_store = if args.trusted.is_empty() {
        None
    } else {
        let mut vault = CredentialVault::new();
        for path in &args.trusted {
            load_trusted(&mut vault, path)?;
        }
        let store: Arc<dyn tillid_keys::TrustStore> = Arc::new(vault);
        Some(store)
    };
    let policy = TrustPolicy::from_parts(federation, trust_store)?;

    log::debug!("verifying {}", args.file.display());
    let result = if args.id_card {
        IdCardValidator::new(validator).verify(&doc, &policy)?
    } else if args.liberty {
        validator
            .with_completeness(LibertyValidator::new())
            .verify(&doc, &LibertyValidator::signature_selector(), &policy)?
    } else {
        let selector = match args.signature {
            Some(id) => NodeSelector::Id(id),
            None => NodeSelector::Descendant(tags::DS_SIGNATURE),
        };
        validator.verify(&doc, &selector, &policy)?
    };

    match result {
        VerifyResult::Valid => {
            println!("OK");
            Ok(())
        }
        VerifyResult::Invalid { kind, reason } => {
            eprintln!("INVALID ({kind:?}): {reason}");
            process::exit(1);
        }
    }
}

fn cmd_key_name(cert: PathBuf, oces: OcesVersion) -> Result<(), Error> {
    let cert = loader::load_certificate_file(&cert)?;
    println!("{}", FederationCertificateReference::for_certificate(oces, &cert)?);
    Ok(())
}

fn cmd_info() -> Result<(), Error> {
    println!("Tillid — DGWS / OIOSAML / Liberty ID-WSF trust engine");
    println!();
    println!("Supported digest algorithms:");
    println!("  SHA-1 (signing), SHA-256 (verification)");
    println!();
    println!("Supported signature algorithms:");
    println!("  RSA PKCS#1 v1.5 (SHA-1, SHA-256)");
    println!();
    println!("Supported canonicalization:");
    println!("  Exclusive C14N 1.0");
    println!();
    println!("Supported transforms:");
    println!("  Enveloped signature, Exclusive C14N, WS-Security STR-Transform");
    println!();
    println!("Key information:");
    println!("  X509Data/X509Certificate, KeyName (OCES1, OCES2, OCES3 federation reference)");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn read_document(path: &Path) -> Result<XmlDocument, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("{}: {e}", path.display())))?;
    XmlDocument::parse(text)
}

fn load_trusted(vault: &mut CredentialVault, path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        let count = vault.load_trusted_dir(path)?;
        log::debug!("loaded {count} trusted certificates from {}", path.display());
    } else {
        vault.add_trusted_certificate(loader::load_certificate_file(path)?);
    }
    Ok(())
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| Error::Other(format!("{}: {e}", p.display()))),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(data)
                .map_err(|e| Error::Other(format!("stdout: {e}")))
        }
    }
}
