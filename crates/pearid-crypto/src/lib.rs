//! # pearid-crypto
//!
//! Cryptographic layer of the PearID identity-assertion protocol.
//!
//! A single [`CryptoService`] value carries the fixed algorithm parameters
//! and exposes every operation the protocol needs: PEM key import/export,
//! key-pair generation, signing and field encryption.
//!
//! ## Cryptographic Primitives
//!
//! - **Signatures**: RSA-PSS, SHA-256, 32-byte salt
//! - **Encryption**: RSA-OAEP, SHA-256 (optionally labelled with a random IV)
//! - **Key format**: SPKI / PKCS#8 DER, base64, PEM framed at 64 columns
//! - **Fingerprints**: BLAKE3 over SPKI with Base58Check encoding
//!
//! ## Examples
//!
//! ### Sign and Verify
//!
//! ```rust,no_run
//! use pearid_crypto::{CryptoConfig, CryptoService};
//!
//! let svc = CryptoService::new(CryptoConfig::default());
//! let pair = svc.generate_key_pair().unwrap();
//!
//! let payload = r#"[["uuid","a-unique-id"]]"#;
//! let signature = svc.sign(payload, &pair.private_key).unwrap();
//! assert!(svc.verify(payload, &signature, &pair.public_key).unwrap());
//! ```
//!
//! ### Encrypt a Field
//!
//! ```rust,no_run
//! use pearid_crypto::CryptoService;
//!
//! let svc = CryptoService::default();
//! let pair = svc.generate_key_pair().unwrap();
//!
//! let sealed = svc.encrypt("date of birth", &pair.public_key).unwrap();
//! assert_eq!(svc.decrypt(&sealed, &pair.private_key).unwrap(), "date of birth");
//! ```

pub mod config;
pub mod encrypt;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod keys;
pub mod service;
pub mod sign;

// Re-export commonly used types
pub use config::CryptoConfig;
pub use encrypt::LabeledCiphertext;
pub use error::{CryptoError, CryptoResult};
pub use fingerprint::KeyFingerprint;
pub use format::{base64_decode, base64_encode, frame_pem, normalize_pem, unframe_pem, PemLabel};
pub use keys::{
    DecryptionKeyHandle, EncryptionKeyHandle, KeyPair, SigningKeyHandle, VerifyingKeyHandle,
};
pub use service::CryptoService;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::OnceLock;

    use crate::{CryptoConfig, CryptoService, KeyPair};

    /// Service with a test-sized modulus.
    pub(crate) fn service() -> &'static CryptoService {
        static SERVICE: OnceLock<CryptoService> = OnceLock::new();
        SERVICE.get_or_init(|| CryptoService::new(CryptoConfig::default().with_modulus_bits(2048)))
    }

    /// One key pair shared by every unit test in the crate.
    pub(crate) fn key_pair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| service().generate_key_pair().expect("key generation"))
    }
}
