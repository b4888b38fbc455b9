//! # pearid-core
//!
//! Document side of the PearID identity-assertion protocol.
//!
//! A document carries assertion regions (`pearid-form`) made of named value
//! fields, a payload slot and a signature slot, plus an identity element
//! (`id="pearid"`) that displays the disclosed public key. This crate:
//!
//! - extracts a deterministic canonical payload from each region
//! - gates identity disclosure on user consent
//! - signs every region with the active identity and opens encrypted fields
//! - re-runs that cycle, one at a time, whenever a watched field changes
//! - verifies previously signed documents
//!
//! The host document is abstracted behind [`ContentTree`]; [`Document`] is
//! the in-memory implementation used by the CLI and tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pearid_core::{
//!     Document, Element, FixedPrompt, MemoryKeyStore, ProtocolConfig, TrustGate,
//! };
//! use pearid_crypto::CryptoService;
//!
//! # async fn run() -> pearid_core::Result<()> {
//! let crypto = Arc::new(CryptoService::default());
//! let pair = crypto.generate_key_pair()?;
//!
//! let mut doc = Document::new(
//!     Element::new("form")
//!         .with_class("pearid-form")
//!         .with_child(
//!             Element::new("input")
//!                 .with_class("pearid-value")
//!                 .with_attr("name", "uuid")
//!                 .with_attr("value", "a-unique-id"),
//!         )
//!         .with_child(Element::new("input").with_class("pearid-signature")),
//! );
//!
//! let mut gate = TrustGate::new(
//!     crypto,
//!     Arc::new(MemoryKeyStore::with_pair(pair)),
//!     Arc::new(FixedPrompt::accept()),
//!     ProtocolConfig::itsame(),
//! );
//! let outcome = gate.run_cycle(&mut doc).await;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod consent;
pub mod defaults;
pub mod document;
pub mod error;
pub mod extract;
pub mod fields;
pub mod gate;
pub mod keystore;
pub mod runner;
pub mod tree;
pub mod verifier;

// Re-export commonly used types
pub use classify::{ClassClassifier, Classify, NodeKind};
pub use config::{ProtocolConfig, SlotTarget, Variant, Vocabulary};
pub use consent::{ConsentPrompt, FixedPrompt, IdentityConsent};
pub use document::{Document, Element};
pub use error::{Error, Result};
pub use extract::{canonicalize, AssertionRegion, CanonicalPayload, FieldEntry, PayloadExtractor};
pub use fields::{decrypt_all, decrypt_field, encrypt_field, field_state, FieldState};
pub use gate::{CycleOutcome, CycleReport, GateState, RegionOutcome, TrustGate};
pub use keystore::{FileKeyStore, KeyStore, KeyUpdate, MemoryKeyStore};
pub use runner::{GateEvent, GateHandle, GateRunner};
pub use tree::{ContentTree, NodeId};
pub use verifier::{verify_document, RegionVerification, VerificationReport};
