//! File-backed origins keep the session across restarts.

#![allow(clippy::unwrap_used)]

use opto_world_integration_tests::{TestOrigin, cart_body, eventually, sign_in};
use opto_world_storefront::OriginStorage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("profile").join("storage.json");

    {
        let ctx = TestOrigin::with_storage(OriginStorage::file(&file).unwrap()).await;
        let tab = ctx.open_tab();
        sign_in(&tab, "tok-persist");
    }

    let ctx = TestOrigin::with_storage(OriginStorage::file(&file).unwrap()).await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(wiremock::matchers::header("authorization", "Bearer tok-persist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(&[(
            "p1",
            "Classic Aviator Gold",
            1,
            2499,
            None,
        )])))
        .expect(1..)
        .mount(&ctx.server)
        .await;

    let tab = ctx.open_tab();
    assert!(tab.session().is_authenticated());
    assert!(eventually(|| tab.cart().count() == 1).await);
}

#[tokio::test]
async fn test_logout_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("storage.json");

    {
        let ctx = TestOrigin::with_storage(OriginStorage::file(&file).unwrap()).await;
        let tab = ctx.open_tab();
        sign_in(&tab, "tok");
        tab.auth().logout().unwrap();
    }

    let reopened = OriginStorage::file(&file).unwrap().open_tab();
    assert_eq!(reopened.get("token").unwrap(), None);
    assert_eq!(reopened.get("userRole").unwrap(), None);
}
