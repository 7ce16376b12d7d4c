//! Application state shared across flows.
//!
//! The store, auth provider, and generator are constructed once and passed
//! down explicitly, so tests substitute in-memory fakes without touching any
//! global.

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::cart::CartManager;
use crate::checkout::CheckoutOrchestrator;
use crate::config::MarketConfig;
use crate::genai::Generator;
use crate::store::DocumentStore;

/// Application state shared across all flows.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shared store, auth, and generator handles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    generator: Arc<dyn Generator>,
    cart: CartManager,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: MarketConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let cart = CartManager::new(Arc::clone(&store), Arc::clone(&auth));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                generator,
                cart,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a cloneable handle to the document store.
    #[must_use]
    pub fn store_handle(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.inner.store)
    }

    /// Get a reference to the auth provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// Get a reference to the generator.
    #[must_use]
    pub fn generator(&self) -> &dyn Generator {
        self.inner.generator.as_ref()
    }

    /// The signed-in user's cart.
    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    /// Build a checkout orchestrator over this state.
    #[must_use]
    pub fn checkout(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.auth),
            self.inner.cart.clone(),
        )
    }
}
