//! Notification feed behavior after checkout.

use rust_decimal_macros::dec;

use artvaani_core::{NotificationStatus, Role, UserId};
use artvaani_integration_tests::TestContext;
use artvaani_market::db::{NotificationRepository, ProductRepository};

async fn checkout_three_items(ctx: &TestContext) -> UserId {
    let artisan = ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;
    let vase = ctx.publish_product("meera", "Vase", dec!(150), &[]).await;

    ctx.sign_in("asha", "Asha", "Pune", Role::Buyer).await;
    let products = ProductRepository::new(ctx.state.store());
    let cart = ctx.state.cart();
    cart.add_item(&products.require(&pot).await.expect("pot"), 1)
        .await
        .expect("add");
    cart.add_item(&products.require(&vase).await.expect("vase"), 2)
        .await
        .expect("add");
    ctx.state.checkout().place_order().await.expect("checkout");
    artisan
}

#[tokio::test]
async fn test_mark_all_read_flips_every_unread() {
    let ctx = TestContext::new();
    let artisan = checkout_three_items(&ctx).await;

    let notifications = NotificationRepository::new(ctx.state.store());
    assert_eq!(notifications.unread_count(&artisan).await.expect("count"), 2);

    notifications
        .mark_all_read(&artisan)
        .await
        .expect("mark all read");

    assert_eq!(notifications.unread_count(&artisan).await.expect("count"), 0);
    let feed = notifications.for_artisan(&artisan).await.expect("feed");
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|n| n.status == NotificationStatus::Read));

    // Idempotent on an already-read feed.
    notifications
        .mark_all_read(&artisan)
        .await
        .expect("mark again");
    assert_eq!(notifications.unread_count(&artisan).await.expect("count"), 0);
}

#[tokio::test]
async fn test_watch_sees_new_notifications() {
    let ctx = TestContext::new();
    ctx.sign_in("meera", "Meera", "Jaipur", Role::Artisan).await;
    let pot = ctx.publish_product("meera", "Pot", dec!(250), &[]).await;

    let notifications = NotificationRepository::new(ctx.state.store());
    let mut watcher = notifications.watch(&UserId::new("meera")).await;
    assert!(watcher.next().await.expect("initial snapshot").is_empty());

    ctx.sign_in("asha", "Asha", "Pune", Role::Buyer).await;
    let product = ProductRepository::new(ctx.state.store())
        .require(&pot)
        .await
        .expect("pot");
    ctx.state.cart().add_item(&product, 1).await.expect("add");
    ctx.state.checkout().place_order().await.expect("checkout");

    let feed = watcher.next().await.expect("push");
    assert_eq!(feed.len(), 1);
    let notification: artvaani_core::Notification =
        feed[0].deserialize().expect("notification");
    assert_eq!(notification.product_name, "Pot");
    assert_eq!(notification.status, NotificationStatus::Unread);
}
