//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A review document (`products/{id}/reviews`, keyed by the reviewer's UID).
///
/// Keying by reviewer enforces at most one review per (user, product);
/// resubmitting overwrites the previous document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Reviewer UID; also the document key.
    pub user_id: UserId,
    pub user_name: String,
    /// Star rating, 1 through 5.
    pub rating: u32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}
