//! Responses that arrive late or out of order never overwrite newer state.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use opto_world_core::ProductId;
use opto_world_integration_tests::{TestOrigin, cart_body, eventually, sign_in};
use opto_world_storefront::StorePhase;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_slow_mutation_does_not_overwrite_newer_one() {
    let ctx = TestOrigin::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(&[])))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cart/add"))
        .and(body_partial_json(serde_json::json!({"productId": "slow"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(cart_body(&[("slow", "Slow Frame", 1, 999, None)]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cart/add"))
        .and(body_partial_json(serde_json::json!({"productId": "fast"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(&[
            ("slow", "Slow Frame", 1, 999, None),
            ("fast", "Fast Frame", 1, 1499, None),
        ])))
        .mount(&ctx.server)
        .await;

    let tab = ctx.open_tab();
    sign_in(&tab, "tok");
    assert!(eventually(|| tab.cart().phase() == StorePhase::Ready).await);

    let slow_cart = tab.cart().clone();
    let slow = tokio::spawn(async move { slow_cart.add_item(&ProductId::new("slow"), 1).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = tab.cart().add_item(&ProductId::new("fast"), 1).await.unwrap();
    assert!(fast.success);
    assert_eq!(tab.cart().count(), 2);

    let slow = slow.await.unwrap().unwrap();
    // The caller still sees what the server said.
    assert!(slow.success);
    assert_eq!(slow.data.unwrap().total_items, 1);
    assert_eq!(tab.cart().count(), 2);
    assert_eq!(tab.cart().phase(), StorePhase::Ready);
}

#[tokio::test]
async fn test_response_landing_after_logout_is_discarded() {
    let ctx = TestOrigin::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(cart_body(&[("p1", "Classic Aviator Gold", 3, 2499, None)]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&ctx.server)
        .await;

    let tab = ctx.open_tab();
    sign_in(&tab, "tok");

    let cart = tab.cart().clone();
    let pending = tokio::spawn(async move { cart.refresh().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    tab.auth().logout().unwrap();
    assert_eq!(tab.cart().phase(), StorePhase::Unauthenticated);

    let late = pending.await.unwrap().unwrap();
    assert!(late.success);

    // Give the background fetch started by the sign-in time to land as well.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(tab.cart().snapshot().is_none());
    assert_eq!(tab.cart().count(), 0);
    assert_eq!(tab.cart().phase(), StorePhase::Unauthenticated);
}

#[tokio::test]
async fn test_refused_mutation_keeps_previous_snapshot() {
    let ctx = TestOrigin::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(&[(
            "p1",
            "Classic Aviator Gold",
            2,
            2499,
            Some(5),
        )])))
        .mount(&ctx.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/cart/update/p1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "message": "Insufficient stock"
        })))
        .mount(&ctx.server)
        .await;

    let tab = ctx.open_tab();
    sign_in(&tab, "tok");
    assert!(eventually(|| tab.cart().count() == 2).await);

    let result = tab
        .cart()
        .update_quantity(&ProductId::new("p1"), 4)
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.status, Some(400));
    assert_eq!(result.message.as_deref(), Some("Insufficient stock"));
    assert_eq!(tab.cart().count(), 2);
}
