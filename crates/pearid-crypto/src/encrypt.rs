//! RSA-OAEP encryption and decryption of single field texts.
//!
//! Two shapes are offered:
//!
//! 1. **Plain** - `encrypt`/`decrypt`: base64 ciphertext only.
//! 2. **Labelled** - `encrypt_labeled`/`decrypt_labeled`: a random 96-bit IV
//!    is bound to the ciphertext as the OAEP label and travels next to it as
//!    its own base64 field. Decrypting with a different IV fails.
//!
//!    The label is the base64 text of the IV, not the raw IV bytes. This is
//!    deliberately not wire compatible with peers that label with raw bytes:
//!    their ciphertexts fail to open here and ours fail to open there.
//!
//! Plaintext size is bounded by the modulus: `k - 2 * 32 - 2` bytes of UTF-8
//! for a `k`-byte modulus (446 bytes at 4096 bits).

use rand::RngCore;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::LABEL_IV_LEN;
use crate::error::{CryptoError, CryptoResult};
use crate::format::{base64_decode, base64_encode};
use crate::keys::{DecryptionKeyHandle, EncryptionKeyHandle};
use crate::service::CryptoService;

/// Ciphertext with the IV it was labelled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledCiphertext {
    /// Base64 RSA-OAEP ciphertext.
    pub ciphertext: String,
    /// Base64 IV used as the OAEP label.
    pub iv: String,
}

fn oaep(label: Option<&str>) -> Oaep {
    match label {
        Some(label) => Oaep::new_with_label::<Sha256, _>(label),
        None => Oaep::new::<Sha256>(),
    }
}

fn seal(key: &EncryptionKeyHandle, plaintext: &str, label: Option<&str>) -> CryptoResult<String> {
    let mut rng = rand::thread_rng();
    let ciphertext = key
        .0
        .encrypt(&mut rng, oaep(label), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(base64_encode(&ciphertext))
}

fn open(key: &DecryptionKeyHandle, ciphertext: &str, label: Option<&str>) -> CryptoResult<String> {
    let raw = base64_decode(ciphertext.trim())
        .map_err(|e| CryptoError::Decryption(format!("Corrupted ciphertext: {}", e)))?;
    let plaintext = key
        .0
        .decrypt(oaep(label), &raw)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("Plaintext is not valid UTF-8".to_string()))
}

impl CryptoService {
    /// Encrypt UTF-8 text for a PEM public key.
    pub fn encrypt(&self, plaintext: &str, public_pem: &str) -> CryptoResult<String> {
        let key = self.import_encryption_key(public_pem)?;
        self.encrypt_with(&key, plaintext)
    }

    /// Encrypt with an already imported key.
    pub fn encrypt_with(&self, key: &EncryptionKeyHandle, plaintext: &str) -> CryptoResult<String> {
        seal(key, plaintext, None)
    }

    /// Decrypt base64 ciphertext with a PEM private key.
    pub fn decrypt(&self, ciphertext: &str, private_pem: &str) -> CryptoResult<String> {
        let key = self.import_decryption_key(private_pem)?;
        self.decrypt_with(&key, ciphertext)
    }

    /// Decrypt with an already imported key.
    pub fn decrypt_with(&self, key: &DecryptionKeyHandle, ciphertext: &str) -> CryptoResult<String> {
        open(key, ciphertext, None)
    }

    /// Encrypt with a fresh random IV bound as the OAEP label.
    pub fn encrypt_labeled(
        &self,
        plaintext: &str,
        public_pem: &str,
    ) -> CryptoResult<LabeledCiphertext> {
        let key = self.import_encryption_key(public_pem)?;

        let mut iv = [0u8; LABEL_IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let iv = base64_encode(&iv);

        let ciphertext = seal(&key, plaintext, Some(&iv))?;
        Ok(LabeledCiphertext { ciphertext, iv })
    }

    /// Decrypt a labelled ciphertext; the IV must be the one it was sealed with.
    pub fn decrypt_labeled(
        &self,
        ciphertext: &str,
        iv: &str,
        private_pem: &str,
    ) -> CryptoResult<String> {
        let iv = iv.trim();
        let raw_iv = base64_decode(iv)
            .map_err(|e| CryptoError::Decryption(format!("Corrupted IV: {}", e)))?;
        if raw_iv.len() != LABEL_IV_LEN {
            return Err(CryptoError::Decryption(format!(
                "IV must be {} bytes, got {}",
                LABEL_IV_LEN,
                raw_iv.len()
            )));
        }
        let key = self.import_decryption_key(private_pem)?;
        open(&key, ciphertext, Some(iv))
    }
}
