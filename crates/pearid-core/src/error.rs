//! Error types for PearID document processing.

use pearid_crypto::CryptoError;
use thiserror::Error;

use crate::tree::NodeId;

/// Result type alias using PearID's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PearID operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Codec, key import or primitive failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Assertion region has no `uuid` value field
    #[error("Invalid region {region}: missing name=\"uuid\" value field")]
    MissingUuid { region: NodeId },

    /// Field is not in a state that allows the requested transition
    #[error("Field state error: {0}")]
    FieldState(String),

    /// Key store access failed
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Runner task or channel failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
