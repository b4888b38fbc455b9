//! pearid: run the PearID protocol over JSON documents.
//!
//! Documents are nested element trees (`tag`, `id`, `classes`, `attributes`,
//! `text`, `children`). Processed documents are written to stdout unless
//! `--output` is given; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pearid_core::{
    encrypt_field, verify_document, ContentTree, CycleOutcome, Document, FileKeyStore,
    FixedPrompt, KeyStore, KeyUpdate, NodeId, PayloadExtractor, ProtocolConfig, TrustGate,
};
use pearid_crypto::CryptoService;

#[derive(Parser)]
#[command(name = "pearid")]
#[command(author, version, about = "Sign, verify and seal PearID documents")]
#[command(propagate_version = true)]
struct Cli {
    /// Key store file
    #[arg(long, global = true, env = "PEARID_KEY_STORE", default_value = "pearid-keys.json")]
    key_store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Assume {
    Yes,
    No,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical payload of every assertion region
    Extract {
        /// Document JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run one consent/sign/decrypt cycle with the stored identity
    Process {
        /// Document JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the processed document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Answer to the disclosure question
        #[arg(long, value_enum, default_value = "no")]
        assume: Assume,
    },

    /// Check every region's signature against a public key
    Verify {
        /// Document JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Public key PEM file (default: the stored public key)
        #[arg(short, long)]
        public_key: Option<PathBuf>,
    },

    /// Encrypt one field in place, marking it encrypted
    Seal {
        /// Document JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Element id of the field
        #[arg(long)]
        id: String,

        /// Public key PEM file (default: the stored public key)
        #[arg(short, long)]
        public_key: Option<PathBuf>,

        /// Where to write the sealed document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Store a PEM key pair as the active identity
    Import {
        /// Public key PEM file
        #[arg(long)]
        public_key: Option<PathBuf>,

        /// Private key PEM file
        #[arg(long)]
        private_key: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ExtractedRegion {
    region: NodeId,
    uuid: Option<String>,
    payload: Option<String>,
    error: Option<String>,
}

fn init_tracing() {
    // LOG_FORMAT - "json" or "text" (default: "text")
    // RUST_LOG   - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pearid=info,pearid_core=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    Document::from_json(&json).with_context(|| format!("Invalid document {}", path.display()))
}

fn write_document(doc: &Document, output: Option<&Path>) -> Result<()> {
    let json = doc.to_json_pretty()?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn public_key(store: &FileKeyStore, path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read public key {}", path.display())),
        None => {
            let pair = store.get().await?;
            anyhow::ensure!(
                !pair.public_key.trim().is_empty(),
                "No public key in {}",
                store.path().display()
            );
            Ok(pair.public_key.clone())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ProtocolConfig::from_env()?;
    let crypto = Arc::new(CryptoService::from_env());
    let store = FileKeyStore::new(&cli.key_store);

    match cli.command {
        Commands::Extract { input } => {
            let doc = load_document(&input)?;
            let extractor = PayloadExtractor::from_config(&config);
            let regions: Vec<ExtractedRegion> = extractor
                .extract_all(&doc)
                .into_iter()
                .map(|(region, result)| match result {
                    Ok(r) => ExtractedRegion {
                        region,
                        uuid: r.uuid().map(str::to_string),
                        payload: Some(r.payload.into_string()),
                        error: None,
                    },
                    Err(e) => ExtractedRegion {
                        region,
                        uuid: None,
                        payload: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();
            print_json(&regions)?;
        }

        Commands::Process {
            input,
            output,
            assume,
        } => {
            let mut doc = load_document(&input)?;
            let prompt = Arc::new(FixedPrompt::new(matches!(assume, Assume::Yes)));
            let mut gate = TrustGate::new(crypto, Arc::new(store), prompt, config);

            match gate.run_cycle(&mut doc).await {
                CycleOutcome::Completed(report) => {
                    info!(
                        signed = report.signed_count(),
                        regions = report.regions.len(),
                        "Document processed"
                    );
                    for failed in report.failed_regions() {
                        eprintln!(
                            "Region {}: {}",
                            failed.root,
                            failed.error.as_deref().unwrap_or_default()
                        );
                    }
                }
                CycleOutcome::Denied { .. } => info!("Identity not disclosed"),
                CycleOutcome::NoIdentity => info!("Document has no identity element"),
                CycleOutcome::Aborted(reason) => anyhow::bail!("Cycle aborted: {}", reason),
            }
            write_document(&doc, output.as_deref())?;
        }

        Commands::Verify { input, public_key: key_path } => {
            let doc = load_document(&input)?;
            let key = public_key(&store, key_path.as_deref()).await?;
            let reports = verify_document(&crypto, &doc, &config, &key)?;
            print_json(&reports)?;
        }

        Commands::Seal {
            input,
            id,
            public_key: key_path,
            output,
        } => {
            let mut doc = load_document(&input)?;
            let node = doc
                .element_by_id(&id)
                .with_context(|| format!("No element with id {:?}", id))?;
            let key = public_key(&store, key_path.as_deref()).await?;
            let key = crypto.import_encryption_key(&key)?;
            encrypt_field(&crypto, &key, &mut doc, node, &config)?;
            write_document(&doc, output.as_deref())?;
        }

        Commands::Import {
            public_key,
            private_key,
        } => {
            anyhow::ensure!(
                public_key.is_some() || private_key.is_some(),
                "Nothing to import: pass --public-key and/or --private-key"
            );
            let read = |path: Option<PathBuf>| -> Result<Option<String>> {
                path.map(|p| {
                    std::fs::read_to_string(&p)
                        .with_context(|| format!("Failed to read {}", p.display()))
                })
                .transpose()
            };
            let update = KeyUpdate {
                public_key: read(public_key)?,
                private_key: read(private_key)?,
            };
            if let Some(pem) = &update.private_key {
                crypto.import_signing_key(pem)?;
            }
            if let Some(pem) = &update.public_key {
                crypto.import_verifying_key(pem)?;
            }
            store.set(update).await?;
            println!("Keys stored in {}", store.path().display());
        }
    }

    Ok(())
}
