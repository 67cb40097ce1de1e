//! Integration tests for error mapping: server messages, fallbacks and
//! transport failures.
//!
//! Run with: cargo test -p cake-shop-integration-tests --test errors

use cake_shop_client::{ApiClient, ApiError, ClientConfig, GENERIC_ERROR_MESSAGE, Session};
use cake_shop_core::{CakeId, UserId, UserRole};
use cake_shop_integration_tests::{BROKEN_CAKE_ID, MockBackend};
use secrecy::SecretString;

fn forged_session() -> Session {
    Session::new(
        SecretString::from("forged"),
        SecretString::from("refresh-forged"),
        UserId::new("u1"),
        UserRole::User,
    )
}

#[tokio::test]
async fn test_status_without_body_uses_generic_message() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client
        .get_cake(&CakeId::new(BROKEN_CAKE_ID))
        .await
        .expect_err("Broken cake should fail");
    assert!(matches!(err, ApiError::Status { status: 500, message: None }));
    assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    assert!(!err.requires_login());
}

#[tokio::test]
async fn test_failed_lookup_is_not_cached() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let id = CakeId::new(BROKEN_CAKE_ID);

    let _ = client.get_cake(&id).await;
    let _ = client.get_cake(&id).await;
    assert_eq!(backend.count("GET", &format!("/cakes/{BROKEN_CAKE_ID}")), 2);
}

#[tokio::test]
async fn test_rejected_token_requires_login() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client
        .get_cart(&forged_session())
        .await
        .expect_err("Forged token should be rejected");
    assert!(err.requires_login());
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid or expired token");

    let request = backend
        .requests()
        .into_iter()
        .find(|r| r.path == "/cart")
        .expect("Cart request not recorded");
    assert!(request.has_bearer);
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client
        .get_cake(&CakeId::new("c1/../c2"))
        .await
        .expect_err("Encoded id should not match a cake");
    assert_eq!(err.status(), Some(404));
    assert_eq!(backend.count_prefix("/cakes/c1%2F"), 1);
}

#[tokio::test]
async fn test_unreachable_backend_uses_generic_message() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    drop(listener);

    let config = ClientConfig::with_api_url(&format!("http://{addr}/api"))
        .expect("Invalid URL");
    let client = ApiClient::new(&config).expect("Failed to build client");

    let err = client
        .list_cakes()
        .await
        .expect_err("Closed port should fail");
    assert!(matches!(err, ApiError::Request(_)));
    assert_eq!(err.status(), None);
    assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
}
