//! Protocol configuration.
//!
//! The two deployed flavours of the protocol differ only in data: which class
//! vocabulary marks the document, whether disclosure is consent-gated, whether
//! encrypted fields are opened, and where slot values are written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::{DECRYPTION_FAILED, ITSAME_PREFIX, NO_ID, PEARID_PREFIX};
use crate::error::{Error, Result};

/// Protocol flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Consent-gated signing plus field decryption.
    #[default]
    PearId,
    /// Ungated signing only.
    Itsame,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::PearId => PEARID_PREFIX,
            Variant::Itsame => ITSAME_PREFIX,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            PEARID_PREFIX => Ok(Variant::PearId),
            ITSAME_PREFIX => Ok(Variant::Itsame),
            other => Err(Error::Config(format!("unknown variant: {other}"))),
        }
    }
}

/// Where payload and signature slots receive their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotTarget {
    /// The `value` attribute (form controls).
    Value,
    /// The displayed text.
    Text,
}

/// Class names and identifiers used to recognise protocol nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub form_class: String,
    pub value_class: String,
    pub payload_class: String,
    pub signature_class: String,
    pub encrypted_class: String,
    pub decrypted_class: String,
    pub error_class: String,
    /// Element id of the displayed identity.
    pub identity_id: String,
}

impl Vocabulary {
    /// Derive every name from one prefix (`pearid` → `pearid-form`, …).
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            form_class: format!("{prefix}-form"),
            value_class: format!("{prefix}-value"),
            payload_class: format!("{prefix}-payload"),
            signature_class: format!("{prefix}-signature"),
            encrypted_class: format!("{prefix}-encrypted"),
            decrypted_class: format!("{prefix}-decrypted"),
            error_class: format!("{prefix}-error"),
            identity_id: prefix.to_string(),
        }
    }
}

/// Full protocol configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub variant: Variant,
    pub vocabulary: Vocabulary,
    /// Ask before disclosing the identity to a document.
    pub consent_gating: bool,
    /// Open fields marked encrypted during each cycle.
    pub decrypt_fields: bool,
    pub slot_target: SlotTarget,
    /// Displayed identity after the user declines.
    pub no_id: String,
    /// Text shown in place of a field that failed to decrypt.
    pub decryption_error_text: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::pearid()
    }
}

impl ProtocolConfig {
    /// Consent-gated flavour.
    pub fn pearid() -> Self {
        Self {
            variant: Variant::PearId,
            vocabulary: Vocabulary::with_prefix(PEARID_PREFIX),
            consent_gating: true,
            decrypt_fields: true,
            slot_target: SlotTarget::Value,
            no_id: NO_ID.to_string(),
            decryption_error_text: DECRYPTION_FAILED.to_string(),
        }
    }

    /// Signing-only flavour.
    pub fn itsame() -> Self {
        Self {
            variant: Variant::Itsame,
            vocabulary: Vocabulary::with_prefix(ITSAME_PREFIX),
            consent_gating: false,
            decrypt_fields: false,
            slot_target: SlotTarget::Text,
            no_id: NO_ID.to_string(),
            decryption_error_text: DECRYPTION_FAILED.to_string(),
        }
    }

    /// Preset for a variant.
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::PearId => Self::pearid(),
            Variant::Itsame => Self::itsame(),
        }
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PEARID_VARIANT` | `pearid` | `pearid` or `itsame` |
    /// | `PEARID_CLASS_PREFIX` | variant name | Prefix of every class name |
    pub fn from_env() -> Result<Self> {
        let variant = match std::env::var("PEARID_VARIANT") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => Variant::default(),
        };
        let mut config = Self::for_variant(variant);

        if let Ok(prefix) = std::env::var("PEARID_CLASS_PREFIX") {
            let prefix = prefix.trim();
            if !prefix.is_empty() {
                config.vocabulary = Vocabulary::with_prefix(prefix);
            }
        }
        Ok(config)
    }

    /// Replace the class vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Enable or disable consent gating.
    pub fn with_consent_gating(mut self, enabled: bool) -> Self {
        self.consent_gating = enabled;
        self
    }

    /// Enable or disable field decryption.
    pub fn with_decrypt_fields(mut self, enabled: bool) -> Self {
        self.decrypt_fields = enabled;
        self
    }

    pub fn with_slot_target(mut self, target: SlotTarget) -> Self {
        self.slot_target = target;
        self
    }
}
