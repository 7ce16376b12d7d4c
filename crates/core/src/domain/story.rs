//! Artisan craft stories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, StoryId, UserId};

/// A craft story document (`stories` collection).
///
/// Produced by the transcription flow: the raw voice transcript is kept
/// alongside the refined text so the artisan can re-run refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub artisan_id: UserId,
    pub product_id: ProductId,
    pub raw_transcript: String,
    pub final_story: String,
    pub created_at: DateTime<Utc>,
}
