//! Fixed algorithm parameters shared by every key, signature and ciphertext.

/// RSA modulus size for newly generated key pairs.
pub const DEFAULT_MODULUS_BITS: usize = 4096;

/// RSA public exponent (F4).
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65_537;

/// RSA-PSS salt length in bytes (256 bit).
pub const DEFAULT_PSS_SALT_LEN: usize = 32;

/// Length of the random IV used as OAEP label by the labelled variant.
pub const LABEL_IV_LEN: usize = 12;

/// Algorithm configuration.
///
/// Both schemes hash with SHA-256. The signature scheme is RSA-PSS, the
/// encryption scheme is RSA-OAEP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoConfig {
    /// Modulus size in bits for generated keys.
    pub modulus_bits: usize,
    /// Public exponent for generated keys.
    pub public_exponent: u64,
    /// PSS salt length in bytes.
    pub pss_salt_len: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            modulus_bits: DEFAULT_MODULUS_BITS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            pss_salt_len: DEFAULT_PSS_SALT_LEN,
        }
    }
}

impl CryptoConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PEARID_RSA_BITS` | `4096` | Modulus size for generated keys |
    /// | `PEARID_PSS_SALT_LEN` | `32` | RSA-PSS salt length in bytes |
    pub fn from_env() -> Self {
        let modulus_bits = std::env::var("PEARID_RSA_BITS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MODULUS_BITS);

        let pss_salt_len = std::env::var("PEARID_PSS_SALT_LEN")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PSS_SALT_LEN);

        Self {
            modulus_bits,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            pss_salt_len,
        }
    }

    /// Set the modulus size for generated keys.
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.modulus_bits = bits;
        self
    }

    /// Set the PSS salt length.
    pub fn with_pss_salt_len(mut self, len: usize) -> Self {
        self.pss_salt_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CryptoConfig::default();
        assert_eq!(config.modulus_bits, 4096);
        assert_eq!(config.public_exponent, 65_537);
        assert_eq!(config.pss_salt_len, 32);
    }

    #[test]
    fn test_builders() {
        let config = CryptoConfig::default()
            .with_modulus_bits(2048)
            .with_pss_salt_len(20);
        assert_eq!(config.modulus_bits, 2048);
        assert_eq!(config.pss_salt_len, 20);
    }
}
