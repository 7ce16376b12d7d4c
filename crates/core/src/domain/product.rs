//! Product listing document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ProductStatus, UserId};

/// A product document (`products` collection).
///
/// Listings start as a bare draft (image + raw description) and are filled in
/// by the generated copy before publishing. Earlier listings were written by
/// hand, so the manual `title`/`price` fields survive as fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// The artisan who owns this listing.
    pub artisan_id: UserId,
    pub image_url: String,
    #[serde(default)]
    pub image_hint: String,
    /// The owner's raw text (or transcribed voice) description.
    #[serde(default)]
    pub description_input: String,
    #[serde(default)]
    pub ai_title: String,
    #[serde(default)]
    pub ai_story: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_price: Option<Decimal>,
    #[serde(default)]
    pub ai_tags: Vec<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Manual title from pre-generation listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Manual price from pre-generation listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Denormalized review aggregate, kept in sync by the review flow.
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub average_rating: f64,
}

impl Product {
    /// Price used everywhere a single number is needed: the generated price,
    /// falling back to the manual price, else zero.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.ai_price.or(self.price).unwrap_or(Decimal::ZERO)
    }

    /// Title used for display and order snapshots.
    #[must_use]
    pub fn effective_title(&self) -> &str {
        if !self.ai_title.is_empty() {
            &self.ai_title
        } else if let Some(title) = self.title.as_deref()
            && !title.is_empty()
        {
            title
        } else {
            "Untitled"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bare_product() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "artisanId": "a1",
            "imageUrl": "https://img.example/p1.jpg",
            "status": "draft",
            "createdAt": "2026-01-10T08:00:00Z",
            "updatedAt": "2026-01-10T08:00:00Z",
        }))
        .expect("deserialize")
    }

    #[test]
    fn test_effective_price_prefers_generated() {
        let mut product = bare_product();
        assert_eq!(product.effective_price(), Decimal::ZERO);

        product.price = Some(dec!(150));
        assert_eq!(product.effective_price(), dec!(150));

        product.ai_price = Some(dec!(250));
        assert_eq!(product.effective_price(), dec!(250));
    }

    #[test]
    fn test_effective_title_fallback_chain() {
        let mut product = bare_product();
        assert_eq!(product.effective_title(), "Untitled");

        product.title = Some("Clay pot".to_owned());
        assert_eq!(product.effective_title(), "Clay pot");

        product.ai_title = "Hand-thrown terracotta pot".to_owned();
        assert_eq!(product.effective_title(), "Hand-thrown terracotta pot");
    }
}
