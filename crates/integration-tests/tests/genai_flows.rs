//! Generation flows wired against the scripted generator.

use rust_decimal_macros::dec;
use serde_json::json;

use artvaani_core::{GeoPoint, MarketError, ProductStatus, Role, UserId, VerificationStatus};
use artvaani_integration_tests::TestContext;
use artvaani_market::db::{
    NewProductDraft, NewStory, ProductRepository, ProfileRepository, StoryRepository,
};
use artvaani_market::genai::AiFlows;

const PHOTO: &str = "data:image/png;base64,eA==";

#[tokio::test]
async fn test_generated_copy_publishes_a_draft() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;

    let products = ProductRepository::new(ctx.state.store());
    let id = products
        .create_draft(NewProductDraft {
            artisan_id: UserId::new("meera"),
            image_url: PHOTO.to_owned(),
            image_hint: "clay pot".to_owned(),
            description_input: "terracotta pot, hand thrown".to_owned(),
        })
        .await
        .expect("draft");

    ctx.generator.push_ok(json!({
        "title": "Hand-thrown Terracotta Pot",
        "story": "Shaped on a kick wheel in Jaipur.",
        "price": 450,
        "tags": ["pottery", "terracotta", "handmade"],
    }));

    let draft = products.require(&id).await.expect("draft");
    let copy = AiFlows::new(ctx.state.generator())
        .generate_product_listing(&draft.image_url, &draft.description_input)
        .await;
    products
        .save_listing(&id, &copy, ProductStatus::Published)
        .await
        .expect("publish");

    let published = products.require(&id).await.expect("product");
    assert_eq!(published.status, ProductStatus::Published);
    assert_eq!(published.ai_title, "Hand-thrown Terracotta Pot");
    assert_eq!(published.effective_price(), dec!(450));
    assert_eq!(published.ai_tags.len(), 3);
}

#[tokio::test]
async fn test_listing_flow_degrades_but_draft_stays_editable() {
    let ctx = TestContext::new();
    // No scripted response queued: the endpoint is "down".
    let copy = AiFlows::new(ctx.state.generator())
        .generate_product_listing(PHOTO, "a clay pot")
        .await;
    assert!(copy.title.contains("AI Generation Failed"));
    assert_eq!(copy.price, dec!(100));
}

#[tokio::test]
async fn test_transcription_and_refinement_chain() {
    let ctx = TestContext::new();
    let flows = AiFlows::new(ctx.state.generator());

    ctx.generator
        .push_ok(json!({"transcription": "my grandmother taught me this weave"}));
    let transcript = flows
        .transcribe_audio("data:audio/webm;base64,eA==")
        .await
        .expect("transcribe");
    assert_eq!(transcript, "my grandmother taught me this weave");

    ctx.generator
        .push_ok(json!({"refinedStory": "My grandmother taught me this weave."}));
    let story = flows.refine_story(&transcript).await.expect("refine");
    assert!(story.starts_with("My grandmother"));

    // The refined story is saved with its transcript and comes back first.
    let uid = ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let product = ctx.publish_product("meera", "Shawl", dec!(900), &["weaving"]).await;
    let stories = StoryRepository::new(ctx.state.store());
    stories
        .create(NewStory {
            title: "The family loom".to_owned(),
            artisan_id: uid.clone(),
            product_id: product,
            raw_transcript: transcript.clone(),
            final_story: story.clone(),
        })
        .await
        .expect("save story");
    let saved = stories.for_artisan(&uid).await.expect("stories");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].raw_transcript, transcript);
    assert_eq!(saved[0].final_story, story);

    // A failing refinement propagates instead of fabricating a story.
    ctx.generator.push_err("model overloaded");
    assert!(matches!(
        flows.refine_story(&transcript).await,
        Err(MarketError::RemoteFailure(_))
    ));
}

#[tokio::test]
async fn test_identity_verification_records_outcome() {
    let ctx = TestContext::new();
    let uid = ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let flows = AiFlows::new(ctx.state.generator());
    let coords = GeoPoint {
        latitude: 26.9124,
        longitude: 75.7873,
    };

    ctx.generator
        .push_ok(json!({"verified": true, "reason": "Identity confirmed."}));
    let verdict = flows
        .verify_artisan_identity(ctx.state.store(), &uid, PHOTO, coords)
        .await
        .expect("verdict");
    assert!(verdict.verified);

    let profiles = ProfileRepository::new(ctx.state.store());
    profiles
        .record_verification(&uid, VerificationStatus::Verified, coords)
        .await
        .expect("record");

    let profile = profiles.require(&uid).await.expect("profile");
    assert_eq!(profile.verification_status, VerificationStatus::Verified);
    assert!(profile.last_verified_at.is_some());
    let recorded = profile.last_known_coords.expect("coords");
    assert!((recorded.latitude - coords.latitude).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_identity_verification_missing_profile_is_not_found() {
    let ctx = TestContext::new();
    let flows = AiFlows::new(ctx.state.generator());
    let err = flows
        .verify_artisan_identity(
            ctx.state.store(),
            &UserId::new("ghost"),
            PHOTO,
            GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
        )
        .await
        .expect_err("missing profile");
    assert!(matches!(err, MarketError::NotFound(_)));
}

#[tokio::test]
async fn test_identity_verification_degrades_to_unverified() {
    let ctx = TestContext::new();
    let uid = ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let flows = AiFlows::new(ctx.state.generator());

    ctx.generator.push_err("model overloaded");
    let verdict = flows
        .verify_artisan_identity(
            ctx.state.store(),
            &uid,
            PHOTO,
            GeoPoint {
                latitude: 26.9,
                longitude: 75.8,
            },
        )
        .await
        .expect("verdict");
    assert!(!verdict.verified);
    assert!(!verdict.reason.is_empty());
}
