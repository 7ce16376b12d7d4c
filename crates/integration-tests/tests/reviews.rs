//! Review submission and aggregate maintenance.

use rust_decimal_macros::dec;

use artvaani_core::{MarketError, ProductId, Role, UserId};
use artvaani_integration_tests::TestContext;
use artvaani_market::db::ProductRepository;
use artvaani_market::reviews::{NewReview, ReviewAggregator};

fn review(product: &ProductId, user: &str, rating: u32, text: &str) -> NewReview {
    NewReview {
        product_id: product.clone(),
        user_id: UserId::new(user),
        user_name: user.to_owned(),
        rating,
        review_text: text.to_owned(),
    }
}

#[tokio::test]
async fn test_aggregate_tracks_first_and_second_review() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;

    let products = ProductRepository::new(ctx.state.store());
    let aggregator = ReviewAggregator::new(ctx.state.store());

    let before = products.require(&pot).await.expect("product");
    assert_eq!(before.review_count, 0);
    assert!(before.average_rating.abs() < f64::EPSILON);

    aggregator
        .submit(review(&pot, "asha", 4, "Lovely glaze"))
        .await
        .expect("first review");
    let after_first = products.require(&pot).await.expect("product");
    assert_eq!(after_first.review_count, 1);
    assert!((after_first.average_rating - 4.0).abs() < f64::EPSILON);

    aggregator
        .submit(review(&pot, "ravi", 2, "Arrived chipped"))
        .await
        .expect("second review");
    let after_second = products.require(&pot).await.expect("product");
    assert_eq!(after_second.review_count, 2);
    assert!((after_second.average_rating - 3.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_resubmission_replaces_rating_without_double_count() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;

    let products = ProductRepository::new(ctx.state.store());
    let aggregator = ReviewAggregator::new(ctx.state.store());

    aggregator
        .submit(review(&pot, "asha", 4, "Good"))
        .await
        .expect("submit");
    aggregator
        .submit(review(&pot, "ravi", 2, "Okay"))
        .await
        .expect("submit");
    aggregator
        .submit(review(&pot, "ravi", 5, "Grew on me"))
        .await
        .expect("resubmit");

    let product = products.require(&pot).await.expect("product");
    assert_eq!(product.review_count, 2);
    assert!((product.average_rating - 4.5).abs() < f64::EPSILON);

    // Still exactly one review document per reviewer, newest first.
    let reviews = aggregator.list(&pot).await.expect("list");
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].user_id, UserId::new("ravi"));
    assert_eq!(reviews[0].rating, 5);
    assert_eq!(reviews[0].review_text, "Grew on me");
}

#[tokio::test]
async fn test_out_of_range_rating_rejected_before_any_write() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;

    let aggregator = ReviewAggregator::new(ctx.state.store());
    for rating in [0, 6, 99] {
        let err = aggregator
            .submit(review(&pot, "asha", rating, "..."))
            .await
            .expect_err("rating out of range");
        assert!(matches!(err, MarketError::InvalidInput(_)));
    }

    assert!(aggregator.list(&pot).await.expect("list").is_empty());
    let product = ProductRepository::new(ctx.state.store())
        .require(&pot)
        .await
        .expect("product");
    assert_eq!(product.review_count, 0);
}

#[tokio::test]
async fn test_review_on_missing_product_is_not_found() {
    let ctx = TestContext::new();
    let aggregator = ReviewAggregator::new(ctx.state.store());

    let err = aggregator
        .submit(review(&ProductId::new("ghost"), "asha", 4, "..."))
        .await
        .expect_err("missing product");
    assert!(matches!(err, MarketError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_reviewers_do_not_lose_updates() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;

    let mut handles = Vec::new();
    for (user, rating) in [("u1", 5), ("u2", 4), ("u3", 3), ("u4", 2), ("u5", 1)] {
        let state = ctx.state.clone();
        let pot = pot.clone();
        handles.push(tokio::spawn(async move {
            ReviewAggregator::new(state.store())
                .submit(NewReview {
                    product_id: pot,
                    user_id: UserId::new(user),
                    user_name: user.to_owned(),
                    rating,
                    review_text: String::new(),
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("submit");
    }

    let product = ProductRepository::new(ctx.state.store())
        .require(&pot)
        .await
        .expect("product");
    assert_eq!(product.review_count, 5);
    assert!((product.average_rating - 3.0).abs() < 1e-9);
}
