//! Checkout: one resolved cart in, one atomic batch out.
//!
//! The batch carries the order document, the purchased-product-ids union onto
//! the buyer's profile, and one notification per line item. Owners are
//! resolved before the batch is assembled; a failed lookup aborts the whole
//! checkout, so an order can never commit with part of its notification
//! fan-out missing.

use std::sync::Arc;

use tracing::instrument;

use artvaani_core::{
    MarketError, MarketResult, NotificationId, NotificationStatus, OrderId, OrderItem, OrderStatus,
};

use crate::auth::AuthProvider;
use crate::cart::CartManager;
use crate::db::{ProductRepository, ProfileRepository, collections};
use crate::store::{DocumentStore, FieldWrites, WriteBatch};

/// Places orders from the current cart.
pub struct CheckoutOrchestrator {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    cart: CartManager,
}

impl CheckoutOrchestrator {
    /// Create a checkout orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        cart: CartManager,
    ) -> Self {
        Self { store, auth, cart }
    }

    /// Convert the resolved cart into an order.
    ///
    /// All-or-nothing: if the batch fails to commit, no order exists and the
    /// cart is left intact, so retrying is safe. On success the cart is
    /// cleared and the new order's id returned.
    ///
    /// # Errors
    ///
    /// - `InvalidState` when nobody is signed in or the cart is empty
    /// - `NotFound` when a cart line's product or the buyer profile is gone
    /// - `RemoteFailure` when the batch commit fails
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> MarketResult<OrderId> {
        let Some(user) = self.auth.current_user() else {
            return Err(MarketError::InvalidState(
                "checkout requires a signed-in user".to_owned(),
            ));
        };

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(MarketError::InvalidState("cart is empty".to_owned()));
        }

        let profile = ProfileRepository::new(self.store.as_ref())
            .require(&user.uid)
            .await?;

        // Resolve every line's owner up front. Any failure here aborts the
        // checkout before a single write is staged.
        let products = ProductRepository::new(self.store.as_ref());
        let mut owners = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = products.require(&item.product.id).await?;
            owners.push(product.artisan_id);
        }

        let order_id = OrderId::generate();
        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product.id.clone(),
                title: item.product.effective_title().to_owned(),
                price: item.price(),
                quantity: item.quantity,
            })
            .collect();

        let purchased: Vec<&str> = cart
            .items
            .iter()
            .map(|item| item.product.id.as_str())
            .collect();

        let mut batch = WriteBatch::new()
            .set(
                collections::ORDERS,
                order_id.as_str(),
                FieldWrites::new()
                    .set("userId", &user.uid)
                    .set("items", &items)
                    .set("totalAmount", cart.total_price())
                    .set("status", OrderStatus::Processing)
                    .server_timestamp("orderDate"),
                false,
            )
            .update(
                collections::USERS,
                user.uid.as_str(),
                FieldWrites::new().array_union("purchasedProductIds", purchased),
            );

        for (item, owner) in cart.items.iter().zip(&owners) {
            batch = batch.set(
                collections::NOTIFICATIONS,
                NotificationId::generate().as_str(),
                FieldWrites::new()
                    .set("artisanId", owner)
                    .set("orderId", &order_id)
                    .set("productName", item.product.effective_title())
                    .set("quantity", item.quantity)
                    .set("buyerName", &profile.name)
                    .set("status", NotificationStatus::Unread)
                    .server_timestamp("timestamp"),
                false,
            );
        }

        self.store.commit(batch).await?;
        self.cart.clear().await?;

        Ok(order_id)
    }
}
