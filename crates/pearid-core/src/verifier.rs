//! Signature verification of a signed document.

use pearid_crypto::CryptoService;
use serde::Serialize;
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::extract::{read_slot, PayloadExtractor};
use crate::tree::{ContentTree, NodeId};

/// Verdict for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum RegionVerification {
    /// The stored signature matches the re-extracted payload.
    Valid,
    /// A signature is present but does not match.
    Invalid,
    /// No signature slot, or an empty one.
    Unsigned,
    /// The region or its signature text could not be processed.
    Malformed(String),
}

/// Verification result for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub region: NodeId,
    pub uuid: Option<String>,
    pub payload: Option<String>,
    pub verdict: RegionVerification,
}

/// Re-extract every region and check its stored signature against
/// `public_pem`. Fails only when the public key cannot be imported.
pub fn verify_document(
    crypto: &CryptoService,
    tree: &dyn ContentTree,
    config: &ProtocolConfig,
    public_pem: &str,
) -> Result<Vec<VerificationReport>> {
    let key = crypto.import_verifying_key(public_pem)?;
    let extractor = PayloadExtractor::from_config(config);

    let reports = extractor
        .extract_all(tree)
        .into_iter()
        .map(|(root, result)| match result {
            Err(e) => VerificationReport {
                region: root,
                uuid: None,
                payload: None,
                verdict: RegionVerification::Malformed(e.to_string()),
            },
            Ok(region) => {
                let signature = region
                    .signature_slot
                    .and_then(|slot| read_slot(tree, slot, config.slot_target));
                let verdict = match signature {
                    None => RegionVerification::Unsigned,
                    Some(sig) => match crypto.verify_with(&key, region.payload.as_bytes(), &sig) {
                        Ok(true) => RegionVerification::Valid,
                        Ok(false) => RegionVerification::Invalid,
                        Err(e) => RegionVerification::Malformed(e.to_string()),
                    },
                };
                debug!(region = %root, verdict = ?verdict, "Region verified");
                VerificationReport {
                    region: root,
                    uuid: region.uuid().map(str::to_string),
                    payload: Some(region.payload.into_string()),
                    verdict,
                }
            }
        })
        .collect();
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element};
    use crate::extract::write_slot;
    use crate::test_support::{crypto, key_pair};

    fn signed_form(text: &str) -> Document {
        let mut doc = Document::new(
            Element::new("form")
                .with_class("pearid-form")
                .with_child(
                    Element::new("input")
                        .with_class("pearid-value")
                        .with_attr("name", "uuid")
                        .with_attr("value", text),
                )
                .with_child(Element::new("input").with_class("pearid-signature")),
        );
        let sig = crypto()
            .sign(&format!(r#"[["uuid","{text}"]]"#), &key_pair().private_key)
            .unwrap();
        write_slot(&mut doc, NodeId(2), config().slot_target, &sig);
        doc
    }

    fn config() -> ProtocolConfig {
        ProtocolConfig::pearid()
    }

    #[test]
    fn test_valid_signature() {
        let doc = signed_form("a-unique-id");
        let reports = verify_document(crypto(), &doc, &config(), &key_pair().public_key).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].verdict, RegionVerification::Valid);
        assert_eq!(reports[0].uuid.as_deref(), Some("a-unique-id"));
    }

    #[test]
    fn test_tampered_value_is_invalid() {
        let mut doc = signed_form("a-unique-id");
        doc.set_attribute(NodeId(1), "value", "another-id");
        let reports = verify_document(crypto(), &doc, &config(), &key_pair().public_key).unwrap();
        assert_eq!(reports[0].verdict, RegionVerification::Invalid);
    }

    #[test]
    fn test_unsigned_and_malformed() {
        let mut doc = signed_form("u");
        doc.set_attribute(NodeId(2), "value", "");
        let reports = verify_document(crypto(), &doc, &config(), &key_pair().public_key).unwrap();
        assert_eq!(reports[0].verdict, RegionVerification::Unsigned);

        doc.set_attribute(NodeId(2), "value", "***");
        let reports = verify_document(crypto(), &doc, &config(), &key_pair().public_key).unwrap();
        assert!(matches!(reports[0].verdict, RegionVerification::Malformed(_)));
    }

    #[test]
    fn test_bad_public_key_fails() {
        let doc = signed_form("u");
        assert!(verify_document(crypto(), &doc, &config(), "not a key").is_err());
    }
}
