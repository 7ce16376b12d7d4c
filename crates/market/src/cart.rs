//! Per-user shopping cart.
//!
//! The source of truth is the `cart` array on the user's profile document.
//! Every mutation rewrites that whole array (last writer wins; concurrent
//! sessions of one user can lose updates, which is accepted) and refreshes an
//! in-memory view with each entry resolved against the product catalog.
//! Without a signed-in user, mutations are silent no-ops: anonymous carts are
//! not supported.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use artvaani_core::{CartEntry, MarketResult, Product, ProductId, UserId, UserProfile};

use crate::auth::AuthProvider;
use crate::db::collections;
use crate::store::{DocumentStore, FieldWrites, Query};

/// A cart entry resolved against the catalog.
#[derive(Debug, Clone)]
pub struct ResolvedCartItem {
    pub product: Product,
    pub quantity: u32,
}

impl ResolvedCartItem {
    /// The price this line contributes per unit.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.product.effective_price()
    }

    /// Line total (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price() * Decimal::from(self.quantity)
    }
}

/// The resolved in-memory cart view.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCart {
    pub items: Vec<ResolvedCartItem>,
}

impl ResolvedCart {
    /// Sum of quantities across all entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(ResolvedCartItem::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct CartManagerInner {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    resolved: watch::Sender<ResolvedCart>,
}

/// Owns the signed-in user's cart.
///
/// Cheap to clone; clones share the same resolved view.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

impl CartManager {
    /// Create a cart manager over a store and auth provider.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        let (resolved, _) = watch::channel(ResolvedCart::default());
        Self {
            inner: Arc::new(CartManagerInner {
                store,
                auth,
                resolved,
            }),
        }
    }

    /// The current resolved view.
    #[must_use]
    pub fn snapshot(&self) -> ResolvedCart {
        self.inner.resolved.borrow().clone()
    }

    /// Subscribe to resolved-view changes. The receiver holds the current
    /// view immediately.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ResolvedCart> {
        self.inner.resolved.subscribe()
    }

    /// Sum of quantities in the current view.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.resolved.borrow().item_count()
    }

    /// Total price of the current view.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.inner.resolved.borrow().total_price()
    }

    /// Add `quantity` units of a product: increments the existing entry or
    /// appends a new one. Zero quantity is a no-op, so a stored entry can
    /// never drop to zero through this path.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if persisting the entry list fails.
    #[instrument(skip(self, product), fields(product_id = %product.id, quantity))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> MarketResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        let product_id = product.id.clone();
        self.mutate(move |mut entries| {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.product_id == product_id) {
                entry.quantity += quantity;
            } else {
                entries.push(CartEntry::new(product_id, quantity));
            }
            entries
        })
        .await
    }

    /// Remove the entry for a product; no error if absent.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if persisting the entry list fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> MarketResult<()> {
        let product_id = product_id.clone();
        self.mutate(move |mut entries| {
            entries.retain(|entry| entry.product_id != product_id);
            entries
        })
        .await
    }

    /// Overwrite the stored quantity for a product. Zero removes the entry.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if persisting the entry list fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> MarketResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id).await;
        }
        let product_id = product_id.clone();
        self.mutate(move |mut entries| {
            for entry in &mut entries {
                if entry.product_id == product_id {
                    entry.quantity = quantity;
                }
            }
            entries
        })
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if persisting the entry list fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> MarketResult<()> {
        self.mutate(|_| Vec::new()).await
    }

    /// Re-pull the stored entries and republish the resolved view.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn refresh(&self) -> MarketResult<()> {
        let Some(user) = self.inner.auth.current_user() else {
            self.inner.resolved.send_replace(ResolvedCart::default());
            return Ok(());
        };
        let entries = self.stored_entries(&user.uid).await?;
        self.publish_resolved(&entries).await
    }

    /// Mirror the remote profile document into the resolved view.
    ///
    /// Spawns a task that follows auth-state changes, holds a live query on
    /// the signed-in user's profile document, and republishes the resolved
    /// view whenever either changes. The task ends when the auth provider or
    /// the store goes away.
    pub fn start_mirror(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut auth_rx = inner.auth.watch();
            loop {
                let user = auth_rx.borrow_and_update().clone();
                match user {
                    None => {
                        inner.resolved.send_replace(ResolvedCart::default());
                        if auth_rx.changed().await.is_err() {
                            return;
                        }
                    }
                    Some(user) => {
                        let mut watcher = inner
                            .store
                            .subscribe(
                                collections::USERS,
                                Query::new().where_eq("uid", user.uid.as_str()),
                            )
                            .await;
                        loop {
                            tokio::select! {
                                changed = auth_rx.changed() => {
                                    if changed.is_err() {
                                        return;
                                    }
                                    // Signed-in user changed; resubscribe.
                                    break;
                                }
                                docs = watcher.next() => {
                                    let Some(docs) = docs else { return; };
                                    let entries = docs
                                        .first()
                                        .and_then(|doc| doc.deserialize::<UserProfile>().ok())
                                        .map(|profile| profile.cart)
                                        .unwrap_or_default();
                                    match resolve(inner.store.as_ref(), &entries).await {
                                        Ok(cart) => {
                                            inner.resolved.send_replace(cart);
                                        }
                                        Err(error) => {
                                            tracing::warn!(%error, "cart mirror failed to resolve entries");
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    /// Apply a pure edit to the stored entry list, persist it, and refresh
    /// the resolved view. Silent no-op without a signed-in user.
    async fn mutate(
        &self,
        apply: impl FnOnce(Vec<CartEntry>) -> Vec<CartEntry>,
    ) -> MarketResult<()> {
        let Some(user) = self.inner.auth.current_user() else {
            tracing::debug!("cart mutation ignored: no signed-in user");
            return Ok(());
        };

        let entries = self.stored_entries(&user.uid).await?;
        let entries = apply(entries);

        self.inner
            .store
            .set(
                collections::USERS,
                user.uid.as_str(),
                FieldWrites::new().set("cart", &entries),
                true,
            )
            .await?;

        self.publish_resolved(&entries).await
    }

    async fn stored_entries(&self, uid: &UserId) -> MarketResult<Vec<CartEntry>> {
        let entries = match self
            .inner
            .store
            .get(collections::USERS, uid.as_str())
            .await?
        {
            Some(doc) => doc.deserialize::<UserProfile>()?.cart,
            None => Vec::new(),
        };
        Ok(entries)
    }

    async fn publish_resolved(&self, entries: &[CartEntry]) -> MarketResult<()> {
        let cart = resolve(self.inner.store.as_ref(), entries).await?;
        self.inner.resolved.send_replace(cart);
        Ok(())
    }
}

/// Resolve stored entries against the catalog. Entries whose product has
/// disappeared are skipped.
async fn resolve(store: &dyn DocumentStore, entries: &[CartEntry]) -> MarketResult<ResolvedCart> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let doc = store
            .get(collections::PRODUCTS, entry.product_id.as_str())
            .await?;
        if let Some(doc) = doc {
            items.push(ResolvedCartItem {
                product: doc.deserialize()?,
                quantity: entry.quantity,
            });
        }
    }
    Ok(ResolvedCart { items })
}
