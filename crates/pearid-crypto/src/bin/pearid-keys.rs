//! pearid-keys: Command-line tool for PearID key and crypto operations.
//!
//! Generates RSA key pairs as PEM files and performs one-off signing,
//! verification, encryption and decryption with them.

use clap::{Parser, Subcommand};
use pearid_crypto::{CryptoConfig, CryptoService, KeyFingerprint};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pearid-keys")]
#[command(author, version, about = "Key management and crypto for PearID")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new RSA key pair
    Keygen {
        /// Output directory for keys (default: current directory)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Modulus size in bits
        #[arg(short, long, env = "PEARID_RSA_BITS", default_value_t = 4096)]
        bits: usize,
    },

    /// Show the fingerprint of a public key
    Fingerprint {
        /// Path to public key PEM file
        #[arg(short, long)]
        public_key: PathBuf,
    },

    /// Sign a payload file
    Sign {
        /// File holding the exact payload bytes to sign
        #[arg(short, long)]
        input: PathBuf,

        /// Path to private key PEM file
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Verify a base64 signature over a payload file
    Verify {
        /// File holding the exact payload bytes
        #[arg(short, long)]
        input: PathBuf,

        /// Base64 signature text
        #[arg(short, long)]
        signature: String,

        /// Path to public key PEM file
        #[arg(short, long)]
        public_key: PathBuf,
    },

    /// Encrypt a short text for a public key
    Encrypt {
        /// Text to encrypt
        #[arg(short, long)]
        text: String,

        /// Path to public key PEM file
        #[arg(short, long)]
        public_key: PathBuf,

        /// Bind a random IV as OAEP label and print it alongside
        #[arg(long)]
        labeled: bool,
    },

    /// Decrypt base64 ciphertext with a private key
    Decrypt {
        /// Base64 ciphertext
        #[arg(short, long)]
        ciphertext: String,

        /// Path to private key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// IV printed by `encrypt --labeled`
        #[arg(long)]
        iv: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Keygen { output, bits } => cmd_keygen(&output, bits)?,
        Commands::Fingerprint { public_key } => cmd_fingerprint(&public_key)?,
        Commands::Sign { input, key } => cmd_sign(&input, &key)?,
        Commands::Verify {
            input,
            signature,
            public_key,
        } => cmd_verify(&input, &signature, &public_key)?,
        Commands::Encrypt {
            text,
            public_key,
            labeled,
        } => cmd_encrypt(&text, &public_key, labeled)?,
        Commands::Decrypt {
            ciphertext,
            key,
            iv,
        } => cmd_decrypt(&ciphertext, &key, iv.as_deref())?,
    }

    Ok(())
}

fn cmd_keygen(output_dir: &Path, bits: usize) -> Result<(), Box<dyn std::error::Error>> {
    let svc = CryptoService::new(CryptoConfig::from_env().with_modulus_bits(bits));
    let pair = svc.generate_key_pair()?;
    let fingerprint = KeyFingerprint::of_public_pem(&pair.public_key)?;

    std::fs::create_dir_all(output_dir)?;
    let private_path = output_dir.join("private.pem");
    let public_path = output_dir.join("public.pem");

    std::fs::write(&public_path, &pair.public_key)?;
    std::fs::write(&private_path, &pair.private_key)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&private_path, std::fs::Permissions::from_mode(0o600))?;
    }

    let output = serde_json::json!({
        "fingerprint": fingerprint.to_string(),
        "bits": bits,
        "private_key_path": private_path.to_string_lossy(),
        "public_key_path": public_path.to_string_lossy(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_fingerprint(public_key_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pem = std::fs::read_to_string(public_key_path)?;
    // Import first so a malformed key is reported instead of fingerprinted
    let svc = CryptoService::from_env();
    let handle = svc.import_verifying_key(&pem)?;

    let output = serde_json::json!({
        "fingerprint": KeyFingerprint::of_public_pem(&pem)?.to_string(),
        "bits": handle.modulus_bits(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_sign(input_path: &Path, key_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let payload = std::fs::read_to_string(input_path)?;
    let private_pem = std::fs::read_to_string(key_path)?;

    let svc = CryptoService::from_env();
    let signature = svc.sign(&payload, &private_pem)?;

    let output = serde_json::json!({
        "input": input_path.to_string_lossy(),
        "input_size": payload.len(),
        "signature": signature,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_verify(
    input_path: &Path,
    signature: &str,
    public_key_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = std::fs::read_to_string(input_path)?;
    let public_pem = std::fs::read_to_string(public_key_path)?;

    let svc = CryptoService::from_env();
    let valid = svc.verify(&payload, signature, &public_pem)?;

    let output = serde_json::json!({
        "input": input_path.to_string_lossy(),
        "signer": KeyFingerprint::of_public_pem(&public_pem)?.to_string(),
        "valid": valid,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    if !valid {
        return Err("Signature does not match payload".into());
    }

    Ok(())
}

fn cmd_encrypt(
    text: &str,
    public_key_path: &Path,
    labeled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let public_pem = std::fs::read_to_string(public_key_path)?;
    let svc = CryptoService::from_env();

    let output = if labeled {
        let sealed = svc.encrypt_labeled(text, &public_pem)?;
        serde_json::json!({
            "ciphertext": sealed.ciphertext,
            "iv": sealed.iv,
        })
    } else {
        serde_json::json!({
            "ciphertext": svc.encrypt(text, &public_pem)?,
        })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn cmd_decrypt(
    ciphertext: &str,
    key_path: &Path,
    iv: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let private_pem = std::fs::read_to_string(key_path)?;
    let svc = CryptoService::from_env();

    let plaintext = match iv {
        Some(iv) => svc.decrypt_labeled(ciphertext, iv, &private_pem)?,
        None => svc.decrypt(ciphertext, &private_pem)?,
    };

    let output = serde_json::json!({
        "plaintext": plaintext,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
