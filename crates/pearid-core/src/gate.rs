//! The trust gate: consent check, region signing and field decryption for one
//! document.
//!
//! Each cycle moves `Idle → Checking → {Granted, Denied} → Idle`:
//!
//! 1. Read the displayed identity. A missing identity element ends the cycle
//!    as [`CycleOutcome::NoIdentity`]; the no-id sentinel ends it as
//!    [`CycleOutcome::Denied`] without asking.
//! 2. Take one snapshot of the stored key pair.
//! 3. If the displayed identity differs from the stored public key, ask. A
//!    decline writes the sentinel and ends the cycle.
//! 4. Sign every valid region with the snapshot's private key and open every
//!    field marked encrypted.
//!
//! With consent gating disabled steps 1 and 3 are skipped and the identity
//! element is never touched.

use std::sync::Arc;

use pearid_crypto::{CryptoService, DecryptionKeyHandle, KeyFingerprint, SigningKeyHandle};
use tracing::{debug, info, instrument, warn};

use crate::config::ProtocolConfig;
use crate::consent::{ConsentPrompt, IdentityConsent};
use crate::defaults::CONSENT_MESSAGE;
use crate::extract::{write_slot, PayloadExtractor};
use crate::fields::{decrypt_all, FieldState};
use crate::keystore::KeyStore;
use crate::tree::{ContentTree, NodeId};

/// Where the gate is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Checking,
    Granted,
    Denied,
}

/// Result of signing one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutcome {
    pub root: NodeId,
    pub uuid: Option<String>,
    /// A signature was written into the region's signature slot.
    pub signed: bool,
    /// Extraction or signing failure for this region only.
    pub error: Option<String>,
}

/// Everything a completed cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub identity: Option<KeyFingerprint>,
    /// The user was asked during this cycle.
    pub prompted: bool,
    pub regions: Vec<RegionOutcome>,
    pub fields: Vec<(NodeId, FieldState)>,
}

impl CycleReport {
    pub fn signed_count(&self) -> usize {
        self.regions.iter().filter(|r| r.signed).count()
    }

    pub fn failed_regions(&self) -> impl Iterator<Item = &RegionOutcome> {
        self.regions.iter().filter(|r| r.error.is_some())
    }

    pub fn fields_in(&self, state: FieldState) -> usize {
        self.fields.iter().filter(|(_, s)| *s == state).count()
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Consent granted (or not required); regions signed, fields opened.
    Completed(CycleReport),
    /// Disclosure refused, now or in an earlier cycle. Nothing was signed.
    Denied { prompted: bool },
    /// The document has no readable identity element.
    NoIdentity,
    /// Keys could not be loaded; nothing was signed.
    Aborted(String),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Consent-gated signing for one document session.
pub struct TrustGate {
    crypto: Arc<CryptoService>,
    store: Arc<dyn KeyStore>,
    prompt: Arc<dyn ConsentPrompt>,
    config: ProtocolConfig,
    extractor: PayloadExtractor,
    consent: IdentityConsent,
    state: GateState,
}

impl TrustGate {
    pub fn new(
        crypto: Arc<CryptoService>,
        store: Arc<dyn KeyStore>,
        prompt: Arc<dyn ConsentPrompt>,
        config: ProtocolConfig,
    ) -> Self {
        let extractor = PayloadExtractor::from_config(&config);
        Self {
            crypto,
            store,
            prompt,
            config,
            extractor,
            consent: IdentityConsent::Unset,
            state: GateState::Idle,
        }
    }

    /// Consent recorded for this session.
    pub fn consent(&self) -> IdentityConsent {
        self.consent
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn extractor(&self) -> &PayloadExtractor {
        &self.extractor
    }

    /// Nodes whose change should start a new cycle: the identity element and
    /// the value nodes of every valid region.
    pub fn watched_nodes(&self, tree: &dyn ContentTree) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        if self.config.consent_gating {
            if let Some(id) = tree.element_by_id(&self.config.vocabulary.identity_id) {
                nodes.push(id);
            }
        }
        for (_, result) in self.extractor.extract_all(tree) {
            if let Ok(region) = result {
                nodes.extend(region.value_nodes);
            }
        }
        nodes
    }

    fn transition(&mut self, to: GateState) {
        debug!(from = ?self.state, to = ?to, "Gate state");
        self.state = to;
    }

    /// Run one full cycle against `tree`.
    #[instrument(skip_all, fields(variant = %self.config.variant))]
    pub async fn run_cycle<T>(&mut self, tree: &mut T) -> CycleOutcome
    where
        T: ContentTree + Send,
    {
        self.transition(GateState::Checking);
        let outcome = self.check_and_apply(tree).await;
        self.transition(GateState::Idle);

        match &outcome {
            CycleOutcome::Completed(report) => info!(
                signed = report.signed_count(),
                regions = report.regions.len(),
                decrypted = report.fields_in(FieldState::Decrypted),
                field_errors = report.fields_in(FieldState::Error),
                "Cycle completed"
            ),
            CycleOutcome::Denied { prompted } => info!(prompted, "Cycle denied"),
            CycleOutcome::NoIdentity => debug!("No identity element, nothing to do"),
            CycleOutcome::Aborted(reason) => warn!(reason = %reason, "Cycle aborted"),
        }
        outcome
    }

    async fn check_and_apply<T>(&mut self, tree: &mut T) -> CycleOutcome
    where
        T: ContentTree + Send,
    {
        let identity = if self.config.consent_gating {
            let Some(node) = tree.element_by_id(&self.config.vocabulary.identity_id) else {
                return CycleOutcome::NoIdentity;
            };
            let Some(displayed) = tree.attribute(node, "value") else {
                return CycleOutcome::NoIdentity;
            };
            if displayed.trim() == self.config.no_id {
                self.consent = IdentityConsent::Denied;
                self.transition(GateState::Denied);
                return CycleOutcome::Denied { prompted: false };
            }
            Some((node, displayed))
        } else {
            None
        };

        let keys = match self.store.get().await {
            Ok(keys) => keys,
            Err(e) => return CycleOutcome::Aborted(format!("key store: {e}")),
        };
        if keys.private_key.trim().is_empty() {
            return CycleOutcome::Aborted("no private key configured".to_string());
        }
        let fingerprint = KeyFingerprint::of_public_pem(&keys.public_key).ok();

        let mut prompted = false;
        if let Some((node, displayed)) = identity {
            if displayed.trim() == keys.public_key.trim() {
                debug!(identity = ?fingerprint, "Displayed identity matches stored key");
            } else {
                prompted = true;
                if self.prompt.confirm(CONSENT_MESSAGE).await {
                    tree.set_attribute(node, "value", &keys.public_key);
                    info!(identity = ?fingerprint, "Identity disclosed");
                } else {
                    tree.set_attribute(node, "value", &self.config.no_id);
                    self.consent = IdentityConsent::Denied;
                    self.transition(GateState::Denied);
                    return CycleOutcome::Denied { prompted };
                }
            }
            self.consent = IdentityConsent::Granted;
        }
        self.transition(GateState::Granted);

        let signing = match self.crypto.import_signing_key(&keys.private_key) {
            Ok(key) => key,
            Err(e) => return CycleOutcome::Aborted(e.to_string()),
        };
        let decryption = if self.config.decrypt_fields {
            match self.crypto.import_decryption_key(&keys.private_key) {
                Ok(key) => Some(key),
                Err(e) => return CycleOutcome::Aborted(e.to_string()),
            }
        } else {
            None
        };

        let regions = self.sign_regions(tree, &signing);
        let fields = match &decryption {
            Some(key) => self.open_fields(tree, key),
            None => Vec::new(),
        };

        CycleOutcome::Completed(CycleReport {
            identity: fingerprint,
            prompted,
            regions,
            fields,
        })
    }

    fn sign_regions(
        &self,
        tree: &mut dyn ContentTree,
        key: &SigningKeyHandle,
    ) -> Vec<RegionOutcome> {
        let target = self.config.slot_target;
        let mut outcomes = Vec::new();

        for (root, result) in self.extractor.extract_all(&*tree) {
            let region = match result {
                Ok(region) => region,
                Err(e) => {
                    outcomes.push(RegionOutcome {
                        root,
                        uuid: None,
                        signed: false,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            if let Some(slot) = region.payload_slot {
                write_slot(tree, slot, target, region.payload.as_str());
            }

            let mut outcome = RegionOutcome {
                root,
                uuid: region.uuid().map(str::to_string),
                signed: false,
                error: None,
            };
            if let Some(slot) = region.signature_slot {
                match self.crypto.sign_with(key, region.payload.as_bytes()) {
                    Ok(signature) => {
                        write_slot(tree, slot, target, &signature);
                        outcome.signed = true;
                    }
                    Err(e) => {
                        warn!(region = %root, error = %e, "Signing failed");
                        outcome.error = Some(e.to_string());
                    }
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    fn open_fields(
        &self,
        tree: &mut dyn ContentTree,
        key: &DecryptionKeyHandle,
    ) -> Vec<(NodeId, FieldState)> {
        decrypt_all(&self.crypto, key, tree, &self.config)
    }
}
