//! Generative-endpoint integration.
//!
//! The model is a black box: a prompt (optionally with an attached media data
//! URI and a response schema) goes in, JSON matching the declared shape comes
//! out, or the call fails. [`flows`] holds the typed marketplace flows built
//! on that contract; [`client::GenAiClient`] is the hosted implementation and
//! tests script a [`Generator`] directly.

pub mod client;
mod error;
pub mod flows;
mod types;

pub use client::GenAiClient;
pub use error::{ApiErrorResponse, GenAiError};
pub use flows::AiFlows;
pub use types::{DecorSuggestions, IdentityVerdict, ListingCopy};

use async_trait::async_trait;
use serde_json::Value;

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The prompt text, with any structured inputs already interpolated.
    pub prompt: String,
    /// Optional attached media as a data URI (`data:<mime>;base64,...`).
    pub media: Option<String>,
    /// JSON schema the model's output must match. Without one the output is
    /// a plain `{"text": ...}` object.
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    /// A text-only request with a response schema.
    #[must_use]
    pub fn structured(prompt: impl Into<String>, response_schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            media: None,
            response_schema: Some(response_schema),
        }
    }

    /// Attach a media data URI.
    #[must_use]
    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// The generative endpoint contract.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one generation and return the structured output.
    ///
    /// # Errors
    ///
    /// Returns [`GenAiError`] when the endpoint is unreachable, rejects the
    /// request, or produces no parseable output.
    async fn generate(&self, request: GenerateRequest) -> Result<Value, GenAiError>;
}
