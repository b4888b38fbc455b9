//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Malformed base64 or PEM text.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Key material could not be imported for the requested algorithm.
    #[error("Key import failed: {0}")]
    KeyImport(String),

    /// Key could not be serialized back to PEM.
    #[error("Key export failed: {0}")]
    KeyExport(String),

    /// Key pair generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed - wrong key, corrupted ciphertext or tampered label.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid key fingerprint.
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
