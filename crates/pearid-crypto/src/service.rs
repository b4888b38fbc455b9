//! The crypto service value.
//!
//! Key import/export, signing and encryption are all methods on
//! [`CryptoService`]; see `keys`, `sign` and `encrypt` for the operations.

use crate::config::CryptoConfig;

/// Holds the fixed algorithm parameters. Construct once and share by
/// reference (or `Arc`) with every component that signs or encrypts.
#[derive(Debug, Clone, Default)]
pub struct CryptoService {
    config: CryptoConfig,
}

impl CryptoService {
    /// Create a service with explicit parameters.
    pub fn new(config: CryptoConfig) -> Self {
        Self { config }
    }

    /// Create a service configured from the environment.
    pub fn from_env() -> Self {
        Self::new(CryptoConfig::from_env())
    }

    /// The parameters in use.
    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }
}
