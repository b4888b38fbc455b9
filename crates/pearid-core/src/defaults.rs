//! Centralized default constants for PearID document processing.

// =============================================================================
// VOCABULARY
// =============================================================================

/// Class prefix of the consent-gated variant.
pub const PEARID_PREFIX: &str = "pearid";

/// Class prefix of the ungated signing-only variant.
pub const ITSAME_PREFIX: &str = "itsame";

/// Field name every assertion region must carry.
pub const UUID_FIELD: &str = "uuid";

// =============================================================================
// IDENTITY
// =============================================================================

/// Displayed identity value after the user declines disclosure.
pub const NO_ID: &str = "noid";

/// Question put to the user before disclosing the identity to a page.
pub const CONSENT_MESSAGE: &str = "PearID: okay to share your identity with webpage?";

// =============================================================================
// FIELDS
// =============================================================================

/// Text shown in place of a field that failed to decrypt.
pub const DECRYPTION_FAILED: &str = "decryption failed";

// =============================================================================
// RUNNER
// =============================================================================

/// Capacity of the gate event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
