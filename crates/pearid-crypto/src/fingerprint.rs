//! Short, checksummed identifiers for public keys.
//!
//! PEM public keys are several hundred characters long. Logs and CLI output
//! refer to identities by fingerprint instead.
//!
//! # Format
//!
//! ```text
//! pid:<base58(version || hash || checksum)>
//!
//! - Version: 1 byte (0x01)
//! - Hash: first 20 bytes of BLAKE3(SPKI DER)
//! - Checksum: first 4 bytes of BLAKE3(version || hash)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{CryptoError, CryptoResult};
use crate::format::pem_to_der;

const FINGERPRINT_VERSION: u8 = 0x01;

const FINGERPRINT_PREFIX: &str = "pid:";

const HASH_LENGTH: usize = 20;

const CHECKSUM_LENGTH: usize = 4;

/// Fingerprint of an SPKI public key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyFingerprint(String);

fn checksum(version: u8, hash: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[version]);
    hasher.update(hash);
    let digest = hasher.finalize();

    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest.as_bytes()[..CHECKSUM_LENGTH]);
    out
}

impl KeyFingerprint {
    /// Fingerprint raw SPKI DER bytes.
    pub fn from_spki_der(der: &[u8]) -> Self {
        let digest = blake3::hash(der);
        let hash = &digest.as_bytes()[..HASH_LENGTH];

        let mut payload = Vec::with_capacity(1 + HASH_LENGTH + CHECKSUM_LENGTH);
        payload.push(FINGERPRINT_VERSION);
        payload.extend_from_slice(hash);
        payload.extend_from_slice(&checksum(FINGERPRINT_VERSION, hash));

        Self(format!(
            "{}{}",
            FINGERPRINT_PREFIX,
            bs58::encode(&payload).into_string()
        ))
    }

    /// Fingerprint a `PUBLIC KEY` PEM document.
    pub fn of_public_pem(pem: &str) -> CryptoResult<Self> {
        pem_to_der(pem).map(|der| Self::from_spki_der(&der))
    }

    /// Parse and validate a fingerprint string.
    pub fn parse(s: &str) -> CryptoResult<Self> {
        let encoded = s.strip_prefix(FINGERPRINT_PREFIX).ok_or_else(|| {
            CryptoError::InvalidFingerprint(format!(
                "Fingerprint must start with '{}'",
                FINGERPRINT_PREFIX
            ))
        })?;

        let payload = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::InvalidFingerprint(format!("Invalid Base58: {}", e)))?;

        let expected_len = 1 + HASH_LENGTH + CHECKSUM_LENGTH;
        if payload.len() != expected_len {
            return Err(CryptoError::InvalidFingerprint(format!(
                "Invalid length: expected {}, got {}",
                expected_len,
                payload.len()
            )));
        }

        let version = payload[0];
        if version != FINGERPRINT_VERSION {
            return Err(CryptoError::InvalidFingerprint(format!(
                "Unsupported version: {}",
                version
            )));
        }

        let hash = &payload[1..1 + HASH_LENGTH];
        if payload[1 + HASH_LENGTH..] != checksum(version, hash) {
            return Err(CryptoError::InvalidFingerprint(
                "Invalid checksum - fingerprint may be mistyped".to_string(),
            ));
        }

        Ok(Self(s.to_string()))
    }

    /// The fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyFingerprint({})", self.0)
    }
}

impl FromStr for KeyFingerprint {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for KeyFingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for KeyFingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
