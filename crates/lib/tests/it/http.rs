//! The shared request wrapper: refresh-and-replay, error classification,
//! and the typed endpoint surface.

use std::sync::Arc;

use url::Url;

use byline::{
    ApiClient, ClientConfig, MemoryTokenStore, SessionStatus,
    http::types::{ArticleStatus, Credentials, SearchQuery},
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore},
};

use crate::helpers::{
    ADA_EMAIL, ADA_PASSWORD, DRAFT_ID, ISSUED_REFRESH, MockBackend, PUBLISHED_ID,
    REFRESHED_ACCESS, client_for, session_for,
};

#[tokio::test]
async fn expired_token_refreshes_once_and_replays() {
    let backend = MockBackend::spawn().await;
    backend.seed_refresh(ISSUED_REFRESH);
    let (client, store) = client_for(&backend);
    store.set(ACCESS_TOKEN_KEY, "expired-access").unwrap();
    store.set(REFRESH_TOKEN_KEY, ISSUED_REFRESH).unwrap();

    let article = client.get_article(PUBLISHED_ID).await.unwrap();
    assert_eq!(article.id, PUBLISHED_ID);
    assert_eq!(article.status, ArticleStatus::Published);

    // Original request + one replay, exactly one refresh
    assert_eq!(backend.article_hits(), 2);
    assert_eq!(backend.refresh_hits(), 1);
    // The refreshed access token was persisted
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some(REFRESHED_ACCESS)
    );
}

#[tokio::test]
async fn failed_refresh_surfaces_original_401_and_demotes_session() {
    let backend = MockBackend::spawn().await;
    let (manager, store, _navigator) = session_for(&backend);
    manager.initialize().await.unwrap();
    manager
        .login(Credentials {
            username: ADA_EMAIL.into(),
            password: ADA_PASSWORD.into(),
        })
        .await
        .unwrap();
    assert!(manager.snapshot().is_authenticated());

    // The backend rotates its keys: every issued token is now invalid
    backend.revoke_all_tokens();

    let err = manager
        .client()
        .get_article(PUBLISHED_ID)
        .await
        .unwrap_err();

    // The surfaced error is the original 401, after exactly one refresh try
    assert!(err.is_unauthorized());
    assert_eq!(backend.refresh_hits(), 1);

    // Credentials are gone and the session demoted synchronously
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert_eq!(manager.snapshot().status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn anonymous_request_gets_401_without_refresh_attempt() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let err = client.current_user(None).await.unwrap_err();
    assert!(err.is_unauthorized());
    // No refresh token stored, so nothing to attempt
    assert_eq!(backend.refresh_hits(), 0);
}

#[tokio::test]
async fn missing_article_is_not_found() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let err = client.get_article(999).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Not found"));
}

#[tokio::test]
async fn foreign_draft_is_forbidden() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let err = client.get_article(DRAFT_ID).await.unwrap_err();
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn draft_is_served_to_its_author() {
    let backend = MockBackend::spawn().await;
    backend.seed_access("seeded-access");
    let (client, store) = client_for(&backend);
    store.set(ACCESS_TOKEN_KEY, "seeded-access").unwrap();

    let article = client.get_article(DRAFT_ID).await.unwrap();
    assert_eq!(article.status, ArticleStatus::Draft);
    assert_eq!(article.author.username, "ada");
    assert!(article.readable_by(Some(&article.author)));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    // Port 1 refuses connections
    let config = ClientConfig::new(Url::parse("http://127.0.0.1:1/api/").unwrap());
    let client = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();

    let err = client.get_article(PUBLISHED_ID).await.unwrap_err();
    assert!(err.is_network_error());
}

#[tokio::test]
async fn article_listing_normalizes_to_vec() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let articles = client.list_articles().await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, PUBLISHED_ID);
}

#[tokio::test]
async fn search_carries_query_parameters() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let mut query = SearchQuery::new("turing machines");
    query.page = Some(1);
    let response = client.search_articles(&query).await.unwrap();
    assert_eq!(response.count, 1);
    // The mock echoes the raw query string back
    assert!(response.search_info.query.contains("turing"));
    assert!(response.search_info.query.contains("page=1"));
}

#[tokio::test]
async fn track_view_downgrades_failures() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    // The mock's tracker always fails; the client must not error
    let receipt = client.track_view(PUBLISHED_ID).await;
    assert_eq!(receipt.view_count, 0);
}

#[tokio::test]
async fn comments_deserialize() {
    let backend = MockBackend::spawn().await;
    let (client, _store) = client_for(&backend);

    let comments = client.list_comments(PUBLISHED_ID).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].article, PUBLISHED_ID);
    assert!(comments[0].replies.is_empty());
}
