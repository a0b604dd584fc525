//! Optimistic cart against the mock backend.

use std::sync::Arc;

use axum::http::StatusCode;
use vitrine_client::{
    ApiError, CartController, Credentials, MemoryTokenStore, Product, SessionManager,
};
use vitrine_core::{ProductId, Quantity};
use vitrine_integration_tests::MockBackend;

struct Shop {
    backend: MockBackend,
    session: SessionManager,
    cart: CartController,
    user_id: String,
}

async fn signed_in_shop() -> Shop {
    let backend = MockBackend::start().await;
    let user_id = backend.add_user("Ana", "ana@x.com", "secret1");
    let session = SessionManager::new(backend.client_with_store(Arc::new(MemoryTokenStore::new())));
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");
    let cart = CartController::new(session.clone());
    Shop {
        backend,
        session,
        cart,
        user_id,
    }
}

async fn product(shop: &Shop, id: &str) -> Product {
    shop.session
        .client()
        .get_product(&ProductId::new(id))
        .await
        .expect("seeded product")
}

fn qty(n: u32) -> Quantity {
    Quantity::new(n).expect("positive quantity")
}

#[tokio::test]
async fn test_add_then_set_zero_removes_line() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    let p1 = ProductId::new("p1");

    let cart = shop.cart.add(&camiseta, qty(2)).await.expect("add");
    assert_eq!(cart.get(&p1).map(|l| l.quantity.get()), Some(2));
    assert_eq!(shop.backend.cart_of(&shop.user_id), vec![("p1".to_owned(), 2)]);

    let cart = shop.cart.set_quantity(&p1, 0).await.expect("remove");
    assert!(cart.is_empty());
    assert!(shop.cart.snapshot().is_empty());
    assert_eq!(shop.backend.count("DELETE", "/cart/p1"), 1);
    assert_eq!(shop.backend.count("PATCH", "/cart/p1"), 0);
}

#[tokio::test]
async fn test_add_merges_existing_line() {
    let shop = signed_in_shop().await;
    let caneca = product(&shop, "p2").await;

    shop.cart.add(&caneca, qty(1)).await.expect("first add");
    let cart = shop.cart.add(&caneca, qty(2)).await.expect("second add");

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.item_count(), 3);
    assert_eq!(shop.cart.item_count(), 3);
}

#[tokio::test]
async fn test_failed_add_rolls_back() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    let caneca = product(&shop, "p2").await;
    shop.cart.add(&camiseta, qty(1)).await.expect("add");
    let before = shop.cart.snapshot();

    shop.backend.fail_next(
        "POST",
        "/cart",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Falha interna",
    );
    let err = shop.cart.add(&caneca, qty(1)).await.expect_err("injected");

    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(shop.cart.snapshot(), before);
    assert_eq!(shop.backend.cart_of(&shop.user_id), vec![("p1".to_owned(), 1)]);
}

#[tokio::test]
async fn test_increment_and_decrement() {
    let shop = signed_in_shop().await;
    let moletom = product(&shop, "p3").await;
    let p3 = ProductId::new("p3");
    shop.cart.add(&moletom, qty(1)).await.expect("add");

    let cart = shop.cart.increment(&p3).await.expect("increment");
    assert_eq!(cart.get(&p3).map(|l| l.quantity.get()), Some(2));

    let cart = shop.cart.decrement(&p3).await.expect("decrement");
    assert_eq!(cart.get(&p3).map(|l| l.quantity.get()), Some(1));
    assert_eq!(shop.backend.count("PATCH", "/cart/p3"), 2);

    // The last unit removes the line.
    let cart = shop.cart.decrement(&p3).await.expect("decrement to zero");
    assert!(cart.get(&p3).is_none());
    assert_eq!(shop.backend.count("DELETE", "/cart/p3"), 1);
}

#[tokio::test]
async fn test_total_follows_server_prices() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    let caneca = product(&shop, "p2").await;

    shop.cart.add(&camiseta, qty(2)).await.expect("add p1");
    shop.cart.add(&caneca, qty(1)).await.expect("add p2");

    assert_eq!(shop.cart.total(), vitrine_core::Price::from_cents(11980));
}

#[tokio::test]
async fn test_clear() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    shop.cart.add(&camiseta, qty(1)).await.expect("add");

    let cart = shop.cart.clear().await.expect("clear");

    assert!(cart.is_empty());
    assert!(shop.cart.snapshot().is_empty());
    assert!(shop.backend.cart_of(&shop.user_id).is_empty());
}

#[tokio::test]
async fn test_load_replaces_local_cart() {
    let shop = signed_in_shop().await;
    shop.session
        .client()
        .add_to_cart(&ProductId::new("p2"), qty(4))
        .await
        .expect("server-side add");
    assert!(shop.cart.snapshot().is_empty());

    let cart = shop.cart.load().await.expect("load");

    assert_eq!(cart.item_count(), 4);
    assert_eq!(shop.cart.snapshot(), cart);
}

#[tokio::test]
async fn test_sign_out_empties_cart() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    shop.cart.add(&camiseta, qty(1)).await.expect("add");

    shop.session.sign_out().await;

    assert!(shop.cart.snapshot().is_empty());
    let err = shop.cart.add(&camiseta, qty(1)).await.expect_err("signed out");
    assert!(matches!(err, ApiError::LoginRequired));
}

#[tokio::test]
async fn test_expired_session_empties_cart() {
    let shop = signed_in_shop().await;
    let camiseta = product(&shop, "p1").await;
    shop.cart.add(&camiseta, qty(1)).await.expect("add");
    shop.backend.expire_access_tokens();
    shop.backend.reject_refresh_tokens();

    let err = shop.cart.increment(&ProductId::new("p1")).await.expect_err("expired");

    assert!(matches!(err, ApiError::SessionExpired));
    assert!(!shop.session.is_authenticated());
    assert!(shop.cart.snapshot().is_empty());
}
