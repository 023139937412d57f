//! Session manager lifecycle against the mock backend.

use byline::{
    SessionStatus,
    http::types::{Credentials, RegisterData},
    session::Destination,
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore},
};

use crate::helpers::{
    ADA_EMAIL, ADA_PASSWORD, ISSUED_ACCESS, ISSUED_REFRESH, MockBackend, session_for,
};

#[tokio::test]
async fn initialize_without_token_is_anonymous_without_network() {
    let backend = MockBackend::spawn().await;
    let (manager, _store, _navigator) = session_for(&backend);

    let session = manager.initialize().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(backend.me_hits(), 0);
}

#[tokio::test]
async fn initialize_with_valid_token_authenticates() {
    let backend = MockBackend::spawn().await;
    backend.seed_access("seeded-access");
    let (manager, store, _navigator) = session_for(&backend);
    store.set(ACCESS_TOKEN_KEY, "seeded-access").unwrap();

    let session = manager.initialize().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.user().unwrap().username, "ada");
    assert_eq!(session.token(), Some("seeded-access"));
    assert_eq!(backend.me_hits(), 1);

    // A second initialize does not re-fetch
    manager.initialize().await.unwrap();
    assert_eq!(backend.me_hits(), 1);
}

#[tokio::test]
async fn initialize_with_rejected_token_clears_and_goes_anonymous() {
    let backend = MockBackend::spawn().await;
    let (manager, store, _navigator) = session_for(&backend);
    store.set(ACCESS_TOKEN_KEY, "stale-access").unwrap();

    let session = manager.initialize().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert_eq!(backend.me_hits(), 1);
    // No refresh token was stored, so no refresh attempt happened
    assert_eq!(backend.refresh_hits(), 0);
}

#[tokio::test]
async fn login_authenticates_and_persists_tokens() {
    let backend = MockBackend::spawn().await;
    let (manager, store, navigator) = session_for(&backend);
    manager.initialize().await.unwrap();

    let user = manager
        .login(Credentials {
            username: ADA_EMAIL.into(),
            password: ADA_PASSWORD.into(),
        })
        .await
        .unwrap();

    assert_eq!(user.username, "ada");
    let session = manager.snapshot();
    assert!(session.is_authenticated());
    assert_eq!(session.token(), Some(ISSUED_ACCESS));
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some(ISSUED_ACCESS)
    );
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
        Some(ISSUED_REFRESH)
    );
    assert_eq!(
        manager.auth_header().as_deref(),
        Some(format!("Bearer {ISSUED_ACCESS}").as_str())
    );
    assert_eq!(navigator.destinations(), [Destination::Home]);
}

#[tokio::test]
async fn login_with_bad_credentials_changes_nothing() {
    let backend = MockBackend::spawn().await;
    let (manager, store, navigator) = session_for(&backend);
    manager.initialize().await.unwrap();

    let err = manager
        .login(Credentials {
            username: ADA_EMAIL.into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert!(err.is_invalid_credentials());
    assert!(err.to_string().contains("No active account"));
    assert_eq!(manager.snapshot().status(), SessionStatus::Anonymous);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert!(navigator.destinations().is_empty());
    // A 401 from the token endpoint never triggers a refresh attempt
    assert_eq!(backend.refresh_hits(), 0);
}

#[tokio::test]
async fn register_does_not_authenticate_and_navigates_to_login() {
    let backend = MockBackend::spawn().await;
    let (manager, _store, navigator) = session_for(&backend);
    manager.initialize().await.unwrap();

    let receipt = manager
        .register(RegisterData {
            username: "newbie".into(),
            email: "newbie@example.com".into(),
            password: "hunter2!".into(),
        })
        .await
        .unwrap();

    assert_eq!(receipt.email, "newbie@example.com");
    assert_eq!(manager.snapshot().status(), SessionStatus::Anonymous);
    assert_eq!(
        navigator.destinations(),
        [Destination::Login {
            just_registered: true
        }]
    );
}

#[tokio::test]
async fn register_surfaces_field_errors_verbatim() {
    let backend = MockBackend::spawn().await;
    let (manager, _store, navigator) = session_for(&backend);

    let err = manager
        .register(RegisterData {
            username: "taken".into(),
            email: "taken@example.com".into(),
            password: "hunter2!".into(),
        })
        .await
        .unwrap_err();

    // The backend's field-keyed validation body passes through
    assert!(err.to_string().contains("username"));
    assert!(err.to_string().contains("already exists"));
    assert!(navigator.destinations().is_empty());
}

#[tokio::test]
async fn logout_after_login_resets_everything() {
    let backend = MockBackend::spawn().await;
    let (manager, store, navigator) = session_for(&backend);
    manager.initialize().await.unwrap();
    manager
        .login(Credentials {
            username: ADA_EMAIL.into(),
            password: ADA_PASSWORD.into(),
        })
        .await
        .unwrap();

    manager.logout().unwrap();
    assert_eq!(manager.snapshot().status(), SessionStatus::Anonymous);
    assert_eq!(manager.auth_header(), None);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);

    // Idempotent
    manager.logout().unwrap();
    assert_eq!(
        navigator.destinations(),
        [
            Destination::Home,
            Destination::Login {
                just_registered: false
            },
            Destination::Login {
                just_registered: false
            },
        ]
    );
}

#[tokio::test]
async fn subscribers_see_every_transition() {
    let backend = MockBackend::spawn().await;
    let (manager, _store, _navigator) = session_for(&backend);
    let mut rx = manager.subscribe();
    assert!(rx.borrow().is_loading());

    manager.initialize().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status(), SessionStatus::Anonymous);

    manager
        .login(Credentials {
            username: ADA_EMAIL.into(),
            password: ADA_PASSWORD.into(),
        })
        .await
        .unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_authenticated());
}
