//! Integration test harness for ArtVaani.
//!
//! Everything runs in-process: the in-memory store stands in for the hosted
//! backend, `SessionAuth` drives sign-in, and a scripted generator stands in
//! for the generative endpoint. [`TestContext::new`] wires them into an
//! `AppState` exactly the way an embedder would.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use artvaani_core::{ProductId, Role, UserId, UserProfile};
use artvaani_market::AppState;
use artvaani_market::auth::{AuthUser, SessionAuth};
use artvaani_market::config::{GenAiConfig, MarketConfig};
use artvaani_market::db::{NewProductDraft, ProductRepository, ProfileRepository};
use artvaani_market::genai::{GenAiError, GenerateRequest, Generator, ListingCopy};
use artvaani_market::store::memory::MemoryStore;
use artvaani_market::store::{
    DocumentStore, DocumentWatcher, Query, StoreError, Transaction, VersionedDocument, WriteBatch,
};

/// A generator driven by a queue of canned responses.
///
/// Each `generate` call pops the next scripted response; an empty queue
/// fails, which doubles as the "endpoint down" script.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Value, String>>>,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_ok(&self, value: Value) {
        self.lock().push_back(Ok(value));
    }

    /// Queue a failure.
    pub fn push_err(&self, message: &str) {
        self.lock().push_back(Err(message.to_owned()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Value, String>>> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<Value, GenAiError> {
        match self.lock().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(GenAiError::Api {
                status: 503,
                message,
            }),
            None => Err(GenAiError::MissingOutput),
        }
    }
}

/// A store wrapper that injects commit failures on demand.
///
/// Reads and subscriptions pass through untouched, so a failed flow can be
/// inspected afterwards through the same handle.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_commits: AtomicBool,
}

impl FlakyStore {
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_commits: AtomicBool::new(false),
        }
    }

    /// Make every subsequent commit fail.
    pub fn fail_next_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<VersionedDocument>, StoreError> {
        self.inner.get_versioned(collection, id).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<artvaani_market::store::Document>, StoreError> {
        self.inner.query(collection, query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_owned()));
        }
        self.inner.commit(batch).await
    }

    async fn commit_transaction(&self, tx: Transaction) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_owned()));
        }
        self.inner.commit_transaction(tx).await
    }

    async fn subscribe(&self, collection: &str, query: Query) -> DocumentWatcher {
        self.inner.subscribe(collection, query).await
    }
}

/// One wired-up application instance over in-memory collaborators.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<FlakyStore>,
    pub auth: Arc<SessionAuth>,
    pub generator: Arc<ScriptedGenerator>,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        let auth = Arc::new(SessionAuth::new());
        let generator = Arc::new(ScriptedGenerator::new());
        let state = AppState::new(
            test_config(),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            Arc::clone(&auth) as Arc<dyn artvaani_market::auth::AuthProvider>,
            Arc::clone(&generator) as Arc<dyn Generator>,
        );
        Self {
            state,
            store,
            auth,
            generator,
        }
    }

    /// Sign in a user and create their profile document.
    pub async fn sign_in(&self, uid: &str, name: &str, city: &str, role: Role) -> UserId {
        let uid = UserId::new(uid);
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "uid": uid,
            "name": name,
            "email": format!("{name}@example.com").to_lowercase(),
            "city": city,
            "role": role,
        }))
        .expect("profile fixture");

        ProfileRepository::new(self.state.store())
            .save(&profile)
            .await
            .expect("save profile");

        self.auth.sign_in(AuthUser {
            uid: uid.clone(),
            display_name: name.to_owned(),
            email: profile.email.clone(),
        });
        uid
    }

    /// Create and publish a product through the real draft/listing path.
    pub async fn publish_product(
        &self,
        artisan: &str,
        title: &str,
        price: rust_decimal::Decimal,
        tags: &[&str],
    ) -> ProductId {
        let products = ProductRepository::new(self.state.store());
        let id = products
            .create_draft(NewProductDraft {
                artisan_id: UserId::new(artisan),
                image_url: "data:image/png;base64,eA==".to_owned(),
                image_hint: title.to_lowercase(),
                description_input: format!("a handmade {title}"),
            })
            .await
            .expect("create draft");

        products
            .save_listing(
                &id,
                &ListingCopy {
                    title: title.to_owned(),
                    story: format!("The story of {title}."),
                    price,
                    tags: tags.iter().map(|&t| t.to_owned()).collect(),
                },
                artvaani_core::ProductStatus::Published,
            )
            .await
            .expect("publish listing");
        id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Config fixture: nothing in the tests talks to the real endpoint.
fn test_config() -> MarketConfig {
    MarketConfig {
        genai: GenAiConfig {
            api_key: secrecy_key(),
            model: "scripted".to_owned(),
            base_url: "http://localhost:0".to_owned(),
        },
    }
}

fn secrecy_key() -> secrecy::SecretString {
    secrecy::SecretString::from("k9Qz3vX8wL1mN5bT7rY2uJ4hF6gD0sAp")
}
