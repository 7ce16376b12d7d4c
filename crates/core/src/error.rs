//! Application-wide error taxonomy.
//!
//! Every user-triggered flow surfaces one of these variants at its boundary;
//! callers render them as user-visible messages. Nothing in the workspace is
//! allowed to crash on a failed flow.

use thiserror::Error;

/// Errors surfaced by marketplace flows.
#[derive(Debug, Error)]
pub enum MarketError {
    /// A referenced document is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A precondition was violated (empty cart at checkout, unauthenticated
    /// mutation, invalid status progression).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed caller input (out-of-range rating, empty form field).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The document store or the generative endpoint failed.
    #[error("remote failure: {0}")]
    RemoteFailure(String),

    /// The actor's role does not permit the attempted action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl MarketError {
    /// Shorthand for a [`MarketError::NotFound`] over an entity/id pair.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}

/// Result type alias for marketplace flows.
pub type MarketResult<T> = std::result::Result<T, MarketError>;
