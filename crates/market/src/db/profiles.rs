//! User profile repository.

use artvaani_core::{GeoPoint, MarketError, MarketResult, UserId, UserProfile, VerificationStatus};

use crate::store::{DocumentStore, DocumentWatcher, FieldWrites, Query};

use super::collections;

/// Repository for user profile documents.
pub struct ProfileRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Fetch a profile by auth UID.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn get(&self, uid: &UserId) -> MarketResult<Option<UserProfile>> {
        match self.store.get(collections::USERS, uid.as_str()).await? {
            Some(doc) => Ok(Some(doc.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Fetch a profile, failing with `NotFound` when absent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile document exists for `uid`.
    pub async fn require(&self, uid: &UserId) -> MarketResult<UserProfile> {
        self.get(uid)
            .await?
            .ok_or_else(|| MarketError::not_found("profile", uid))
    }

    /// Create or overwrite the full profile document (profile setup and
    /// profile edits both write the whole form back).
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn save(&self, profile: &UserProfile) -> MarketResult<()> {
        let fields = FieldWrites::from_object(
            serde_json::to_value(profile)
                .map_err(|e| MarketError::InvalidInput(format!("unserializable profile: {e}")))?,
        );
        self.store
            .set(collections::USERS, profile.uid.as_str(), fields, false)
            .await?;
        Ok(())
    }

    /// Update the verification status alone.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile document exists for `uid`.
    pub async fn set_verification_status(
        &self,
        uid: &UserId,
        status: VerificationStatus,
    ) -> MarketResult<()> {
        self.store
            .update(
                collections::USERS,
                uid.as_str(),
                FieldWrites::new().set("verificationStatus", status),
            )
            .await?;
        Ok(())
    }

    /// Record the outcome of a verification attempt: status, the coordinates
    /// the attempt was made from, and a store-clocked timestamp.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile document exists for `uid`.
    pub async fn record_verification(
        &self,
        uid: &UserId,
        status: VerificationStatus,
        coords: GeoPoint,
    ) -> MarketResult<()> {
        self.store
            .update(
                collections::USERS,
                uid.as_str(),
                FieldWrites::new()
                    .set("verificationStatus", status)
                    .set("lastKnownCoords", coords)
                    .server_timestamp("lastVerifiedAt"),
            )
            .await?;
        Ok(())
    }

    /// Live view of one profile document.
    pub async fn watch(&self, uid: &UserId) -> DocumentWatcher {
        self.store
            .subscribe(
                collections::USERS,
                Query::new().where_eq("uid", uid.as_str()),
            )
            .await
    }
}
