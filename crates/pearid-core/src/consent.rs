//! Identity-disclosure consent.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Consent for the current document session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityConsent {
    #[default]
    Unset,
    /// The document displays the stored public key.
    Granted,
    /// The document displays the no-id sentinel.
    Denied,
}

/// Asks the user whether the identity may be disclosed.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    /// Returns true when the user accepts.
    async fn confirm(&self, message: &str) -> bool;
}

/// Prompt with a fixed answer. Counts how often it was asked.
#[derive(Debug)]
pub struct FixedPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl FixedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn accept() -> Self {
        Self::new(true)
    }

    pub fn decline() -> Self {
        Self::new(false)
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentPrompt for FixedPrompt {
    async fn confirm(&self, _message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
