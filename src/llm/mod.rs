//! Completion client for the upstream text-generation service
//!
//! The pipeline only ever needs "send one prompt, get the reply text back",
//! so the seam is a single-method trait. [`PerplexityClient`] is the real
//! implementation; tests substitute scripted doubles.

mod perplexity;

pub use perplexity::{PerplexityClient, DEFAULT_API_URL, DEFAULT_MODEL, TEMPERATURE};

use async_trait::async_trait;
use thiserror::Error;

/// Failures from a single completion call. None of them are retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The service answered with a non-success status (or the call timed out)
    #[error("Perplexity error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request never completed (DNS, connection reset, TLS, ...)
    #[error("Failed to reach completion service: {0}")]
    Transport(String),

    /// A success response without the expected reply text
    #[error("Unexpected completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Status code reported for a call that hit the per-call timeout
    pub const TIMEOUT_STATUS: u16 = 504;

    pub fn timeout(secs: u64) -> Self {
        Self::Upstream {
            status: Self::TIMEOUT_STATUS,
            body: format!("upstream request timed out after {}s", secs),
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one instruction and return the raw reply text
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
