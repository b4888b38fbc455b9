//! Encrypted field handling.
//!
//! A field marked encrypted moves once, either to decrypted (plaintext shown)
//! or to error (the failure text shown). Neither state reverts.

use pearid_crypto::{CryptoService, DecryptionKeyHandle, EncryptionKeyHandle};
use tracing::{debug, warn};

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::tree::{ContentTree, NodeId};

/// Marker state of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Encrypted,
    Decrypted,
    Error,
}

/// Current marker of `node`, `None` for an unmarked node.
pub fn field_state(
    tree: &dyn ContentTree,
    node: NodeId,
    config: &ProtocolConfig,
) -> Option<FieldState> {
    let vocab = &config.vocabulary;
    if tree.has_class(node, &vocab.encrypted_class) {
        Some(FieldState::Encrypted)
    } else if tree.has_class(node, &vocab.decrypted_class) {
        Some(FieldState::Decrypted)
    } else if tree.has_class(node, &vocab.error_class) {
        Some(FieldState::Error)
    } else {
        None
    }
}

/// Open one encrypted field in place. Never fails: a decryption error is
/// turned into the error state and logged. Returns the resulting state, or
/// `None` when the node is not marked encrypted and was left alone.
pub fn decrypt_field(
    crypto: &CryptoService,
    key: &DecryptionKeyHandle,
    tree: &mut dyn ContentTree,
    node: NodeId,
    config: &ProtocolConfig,
) -> Option<FieldState> {
    let vocab = &config.vocabulary;
    if !tree.has_class(node, &vocab.encrypted_class) {
        debug!(node = %node, "Field is not marked encrypted, skipping");
        return None;
    }

    let ciphertext = tree.text(node);
    match crypto.decrypt_with(key, ciphertext.trim()) {
        Ok(plaintext) => {
            tree.set_text(node, &plaintext);
            tree.replace_class(node, &vocab.encrypted_class, &vocab.decrypted_class);
            debug!(node = %node, "Field decrypted");
            Some(FieldState::Decrypted)
        }
        Err(e) => {
            warn!(node = %node, error = %e, "Field decryption failed");
            tree.set_text(node, &config.decryption_error_text);
            tree.replace_class(node, &vocab.encrypted_class, &vocab.error_class);
            Some(FieldState::Error)
        }
    }
}

/// Decrypt every field currently marked encrypted, in document order.
pub fn decrypt_all(
    crypto: &CryptoService,
    key: &DecryptionKeyHandle,
    tree: &mut dyn ContentTree,
    config: &ProtocolConfig,
) -> Vec<(NodeId, FieldState)> {
    tree.elements_by_class(&config.vocabulary.encrypted_class)
        .into_iter()
        .filter_map(|node| {
            decrypt_field(crypto, key, &mut *tree, node, config).map(|state| (node, state))
        })
        .collect()
}

/// Seal an unmarked field: replace its text with ciphertext and mark it
/// encrypted. Fields that already carry a marker are refused.
pub fn encrypt_field(
    crypto: &CryptoService,
    key: &EncryptionKeyHandle,
    tree: &mut dyn ContentTree,
    node: NodeId,
    config: &ProtocolConfig,
) -> Result<()> {
    if let Some(state) = field_state(tree, node, config) {
        return Err(Error::FieldState(format!(
            "field {node} is already {state:?}"
        )));
    }

    let ciphertext = crypto.encrypt_with(key, &tree.text(node))?;
    tree.set_text(node, &ciphertext);
    tree.add_class(node, &config.vocabulary.encrypted_class);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element};
    use crate::test_support::{crypto, key_pair};

    fn setup() -> (DecryptionKeyHandle, EncryptionKeyHandle) {
        let dk = crypto().import_decryption_key(&key_pair().private_key).unwrap();
        let ek = dk.encryption_key();
        (dk, ek)
    }

    #[test]
    fn test_encrypt_then_decrypt_field() {
        let config = ProtocolConfig::pearid();
        let (dk, ek) = setup();
        let mut doc = Document::new(Element::new("span").with_text("secret value"));
        let node = doc.root();

        encrypt_field(crypto(), &ek, &mut doc, node, &config).unwrap();
        assert_eq!(field_state(&doc, node, &config), Some(FieldState::Encrypted));
        assert_ne!(doc.text(node), "secret value");

        let state = decrypt_field(crypto(), &dk, &mut doc, node, &config);
        assert_eq!(state, Some(FieldState::Decrypted));
        assert_eq!(doc.text(node), "secret value");
        assert!(doc.has_class(node, "pearid-decrypted"));
        assert!(!doc.has_class(node, "pearid-encrypted"));
    }

    #[test]
    fn test_corrupt_field_becomes_error() {
        let config = ProtocolConfig::pearid();
        let (dk, _) = setup();
        let mut doc = Document::new(
            Element::new("span")
                .with_class("pearid-encrypted")
                .with_text("bm90IGEgY2lwaGVydGV4dA=="),
        );
        let node = doc.root();

        let state = decrypt_field(crypto(), &dk, &mut doc, node, &config);
        assert_eq!(state, Some(FieldState::Error));
        assert_eq!(doc.text(node), "decryption failed");
        assert!(doc.has_class(node, "pearid-error"));
    }

    #[test]
    fn test_terminal_states_refuse_encryption() {
        let config = ProtocolConfig::pearid();
        let (_, ek) = setup();
        let mut doc = Document::new(
            Element::new("div")
                .with_child(Element::new("span").with_class("pearid-decrypted"))
                .with_child(Element::new("span").with_class("pearid-error")),
        );
        for node in [NodeId(1), NodeId(2)] {
            let err = encrypt_field(crypto(), &ek, &mut doc, node, &config).unwrap_err();
            assert!(matches!(err, Error::FieldState(_)));
        }
    }

    #[test]
    fn test_decrypt_skips_unmarked() {
        let config = ProtocolConfig::pearid();
        let (dk, _) = setup();
        let mut doc = Document::new(
            Element::new("div")
                .with_child(Element::new("span").with_class("pearid-decrypted").with_text("x"))
                .with_child(Element::new("span").with_text("plain")),
        );
        for node in [NodeId(1), NodeId(2)] {
            assert_eq!(decrypt_field(crypto(), &dk, &mut doc, node, &config), None);
        }
        assert_eq!(doc.text(NodeId(1)), "x");
        assert_eq!(doc.text(NodeId(2)), "plain");
        assert!(!doc.has_class(NodeId(2), "pearid-error"));
    }
}
