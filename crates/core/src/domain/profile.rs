//! User profile document and its embedded cart entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Role, UserId, VerificationStatus};

/// A single entry in a user's stored cart.
///
/// Entries are unique per product; quantity is always at least 1. Entries
/// that would drop to zero are removed rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartEntry {
    /// Create a cart entry.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// GPS coordinates captured during identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A user profile document (`users` collection, keyed by the auth UID).
///
/// Created at profile setup, mutated by profile edits, cart operations and
/// verification attempts. Never hard-deleted in normal flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque identity from the auth provider.
    pub uid: UserId,
    /// Display name shown on reviews and notifications.
    pub name: String,
    pub email: Option<String>,
    pub city: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    /// Embedded cart, overwritten wholesale on every cart mutation.
    #[serde(default)]
    pub cart: Vec<CartEntry>,
    #[serde(default)]
    pub purchased_product_ids: Vec<ProductId>,
    #[serde(default)]
    pub profile_image: String,
    /// Coordinates from the most recent verification attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_coords: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "uid": "u1",
            "name": "Meera",
            "email": "meera@example.com",
            "city": "Jaipur",
            "role": "artisan",
        }))
        .expect("deserialize");

        assert_eq!(profile.role, Role::Artisan);
        assert_eq!(profile.verification_status, VerificationStatus::Pending);
        assert!(profile.cart.is_empty());
        assert!(profile.purchased_product_ids.is_empty());
    }
}
