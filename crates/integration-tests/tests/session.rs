//! Session lifecycle against the mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use vitrine_client::{
    ApiError, Credentials, FileTokenStore, MemoryTokenStore, SessionManager, SessionState,
    TokenStore,
};
use vitrine_core::{ProductId, Quantity};
use vitrine_integration_tests::MockBackend;

fn session(backend: &MockBackend, store: Arc<dyn TokenStore>) -> SessionManager {
    SessionManager::new(backend.client_with_store(store))
}

#[tokio::test]
async fn test_register_signs_in() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());

    let credentials = Credentials::register("Ana", "ana@x.com", "secret1").expect("valid form");
    let user = session.sign_in(&credentials).await.expect("registration");

    assert_eq!(user.name, "Ana");
    assert_eq!(user.email.as_str(), "ana@x.com");
    match session.current() {
        SessionState::Authenticated(current) => assert_eq!(current, user),
        SessionState::Anonymous => panic!("expected an authenticated session"),
    }
    assert!(store.tokens().is_some());
    assert_eq!(store.cached_user(), Some(user));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let session = session(&backend, Arc::new(MemoryTokenStore::new()));

    let credentials = Credentials::register("Ana", "ana@x.com", "other").expect("valid form");
    let err = session.sign_in(&credentials).await.expect_err("duplicate");

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message(), "Email já cadastrado");
    assert_eq!(session.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_wrong_password_stays_anonymous_without_refresh() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let transitions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&transitions);
    session.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let credentials = Credentials::login("ana@x.com", "wrong").expect("valid form");
    let err = session.sign_in(&credentials).await.expect_err("bad password");

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.user_message(), "Credenciais inválidas");
    assert_eq!(session.current(), SessionState::Anonymous);
    assert!(store.tokens().is_none());
    assert_eq!(transitions.load(Ordering::SeqCst), 0);
    assert_eq!(backend.count("POST", "/auth/refresh"), 0);
}

#[tokio::test]
async fn test_session_survives_restart_with_file_store() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("session.json");

    {
        let first = session(&backend, Arc::new(FileTokenStore::open(&path)));
        let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
        first.sign_in(&credentials).await.expect("login");
    }

    let restarted = session(&backend, Arc::new(FileTokenStore::open(&path)));
    assert!(restarted.is_authenticated());
    assert_eq!(
        restarted.user().map(|u| u.email.as_str().to_owned()),
        Some("ana@x.com".to_owned())
    );

    // The restored tokens are usable.
    restarted.client().get_cart().await.expect("cart with restored tokens");
    assert_eq!(backend.count("POST", "/auth/refresh"), 0);
}

#[tokio::test]
async fn test_failed_refresh_ends_session_and_notifies_once() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    session.subscribe(move |state| {
        recorder
            .lock()
            .expect("recorder lock")
            .push(state.is_authenticated());
    });

    backend.expire_access_tokens();
    backend.reject_refresh_tokens();
    let err = session.client().get_cart().await.expect_err("session ends");

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(session.current(), SessionState::Anonymous);
    assert_eq!(*seen.lock().expect("recorder lock"), vec![false]);
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");

    session.sign_out().await;

    assert_eq!(backend.count("POST", "/auth/logout"), 1);
    assert_eq!(session.current(), SessionState::Anonymous);
    assert!(store.tokens().is_none());
    assert!(store.cached_user().is_none());
}

#[tokio::test]
async fn test_sign_out_ends_session_when_logout_fails() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");
    backend.fail_next(
        "POST",
        "/auth/logout",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Falha interna",
    );

    session.sign_out().await;

    assert_eq!(session.current(), SessionState::Anonymous);
    assert!(store.tokens().is_none());
}

#[tokio::test]
async fn test_sign_in_twice_notifies_each_time() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let session = session(&backend, Arc::new(MemoryTokenStore::new()));
    let transitions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&transitions);
    session.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("first login");
    session.sign_in(&credentials).await.expect("second login");

    assert_eq!(transitions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sign_out_during_refresh_stays_signed_out() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&credentials).await.expect("login");

    backend.expire_access_tokens();
    backend.set_refresh_delay(Duration::from_millis(300));
    backend.fail_next(
        "POST",
        "/auth/logout",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Falha interna",
    );

    let client = session.client().clone();
    let in_flight = tokio::spawn(async move { client.get_cart().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.sign_out().await;
    let _ = in_flight.await.expect("cart task");

    assert_eq!(session.current(), SessionState::Anonymous);
    assert!(store.tokens().is_none());
    assert!(store.cached_user().is_none());
}

#[tokio::test]
async fn test_sign_in_during_refresh_keeps_new_user() {
    let backend = MockBackend::start().await;
    let ana_id = backend.add_user("Ana", "ana@x.com", "secret1");
    let bia_id = backend.add_user("Bia", "bia@x.com", "secret2");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let ana = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&ana).await.expect("login as Ana");

    backend.expire_access_tokens();
    backend.set_refresh_delay(Duration::from_millis(300));

    let client = session.client().clone();
    let in_flight = tokio::spawn(async move { client.get_cart().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let bia = Credentials::login("bia@x.com", "secret2").expect("valid form");
    session.sign_in(&bia).await.expect("login as Bia");
    let _ = in_flight.await.expect("cart task");

    assert_eq!(session.user().map(|u| u.name), Some("Bia".to_owned()));
    assert_eq!(
        store.cached_user().map(|u| u.email.as_str().to_owned()),
        Some("bia@x.com".to_owned())
    );

    session
        .client()
        .add_to_cart(&ProductId::new("p1"), Quantity::ONE)
        .await
        .expect("add as Bia");
    assert_eq!(backend.cart_of(&bia_id), vec![("p1".to_owned(), 1)]);
    assert!(backend.cart_of(&ana_id).is_empty());
}

#[tokio::test]
async fn test_rejected_refresh_does_not_end_newer_session() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    backend.add_user("Bia", "bia@x.com", "secret2");
    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&backend, store.clone());
    let ana = Credentials::login("ana@x.com", "secret1").expect("valid form");
    session.sign_in(&ana).await.expect("login as Ana");

    backend.expire_access_tokens();
    backend.reject_refresh_tokens();
    backend.set_refresh_delay(Duration::from_millis(300));

    let client = session.client().clone();
    let in_flight = tokio::spawn(async move { client.get_cart().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let bia = Credentials::login("bia@x.com", "secret2").expect("valid form");
    session.sign_in(&bia).await.expect("login as Bia");

    let err = in_flight.await.expect("cart task").expect_err("Ana's session ended");
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(session.user().map(|u| u.name), Some("Bia".to_owned()));
    assert!(store.tokens().is_some());
}

#[tokio::test]
async fn test_sign_in_that_cannot_persist_stays_anonymous() {
    let backend = MockBackend::start().await;
    backend.add_user("Ana", "ana@x.com", "secret1");
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").expect("blocker file");
    let store = Arc::new(FileTokenStore::open(blocker.join("session.json")));
    let session = session(&backend, store.clone());

    let credentials = Credentials::login("ana@x.com", "secret1").expect("valid form");
    let err = session.sign_in(&credentials).await.expect_err("unwritable store");

    assert!(matches!(err, ApiError::Storage(_)));
    assert_eq!(session.current(), SessionState::Anonymous);
    assert!(store.tokens().is_none());
    assert!(store.cached_user().is_none());
}
