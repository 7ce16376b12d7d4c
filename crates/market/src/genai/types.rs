//! Typed outputs of the marketplace generation flows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Generated listing copy for a product draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingCopy {
    /// Concise product title, under ten words.
    pub title: String,
    /// Selling text highlighting the craft and its cultural significance.
    pub story: String,
    /// Suggested price in rupees.
    pub price: Decimal,
    /// Three to five tags for search and discovery.
    pub tags: Vec<String>,
}

/// Outcome of the artisan identity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityVerdict {
    pub verified: bool,
    /// Why the check passed or failed, in user-facing language.
    pub reason: String,
}

impl IdentityVerdict {
    /// A failed verdict with a reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: reason.into(),
        }
    }
}

/// Decoration ideas for a buyer's room photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorSuggestions {
    pub suggestions: Vec<String>,
}
