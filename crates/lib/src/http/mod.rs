//! Shared HTTP request wrapper for the backend API.
//!
//! Every outbound request goes through [`ApiClient`]: it attaches the bearer
//! header from the token store, extracts the human-readable message from
//! JSON error bodies, and runs the single refresh-and-replay cycle when an
//! authenticated endpoint answers 401. Both the session manager and the
//! resource loaders handed to the fetch coordinator are built on it.

mod error;
pub mod types;

use std::sync::{Arc, OnceLock, Weak};

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
    ClientConfig, Result,
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore},
};

pub use error::HttpError;
use types::{
    Article, ArticleInput, ArticleListing, Comment, CommentInput, Credentials, EmailVerification,
    ProfileUpdate, RefreshedToken, RegisterData, RegisterReceipt, SearchQuery, SearchResponse,
    TokenPair, TrackedView, User,
};

/// Receives the notification that persisted credentials were revoked after a
/// failed refresh cycle. The session manager installs itself here so it can
/// demote to anonymous synchronously.
pub(crate) trait AuthSink: Send + Sync {
    fn credentials_revoked(&self);
}

/// Typed client for the backend API.
///
/// Cheap to clone; clones share the underlying connection pool, token store
/// and auth sink.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    auth_sink: OnceLock<Weak<dyn AuthSink>>,
}

/// Token issuance and refresh must never trigger a refresh cycle themselves.
fn is_token_endpoint(path: &str) -> bool {
    path.contains("token")
}

impl ApiClient {
    /// Build a client from configuration and a token store.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HttpError::Network(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.base_url.clone(),
                store,
                auth_sink: OnceLock::new(),
            }),
        })
    }

    /// The token store this client reads credentials from.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub(crate) fn install_auth_sink(&self, sink: Weak<dyn AuthSink>) {
        let _ = self.inner.auth_sink.set(sink);
    }

    // === Auth endpoints ===

    /// Exchange credentials for an access/refresh token pair.
    ///
    /// The backend authenticates by email; the form's `username` field
    /// carries it.
    pub async fn issue_token(&self, credentials: &Credentials) -> Result<TokenPair> {
        let body = serde_json::json!({
            "email": credentials.username,
            "password": credentials.password,
        });
        Ok(self
            .request_json(Method::POST, "users/token/", Some(body))
            .await?)
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh_token(&self, refresh: &str) -> Result<RefreshedToken> {
        let body = serde_json::json!({ "refresh": refresh });
        Ok(self
            .request_json(Method::POST, "users/token/refresh/", Some(body))
            .await?)
    }

    /// Look up the user the current credentials belong to.
    ///
    /// `token` overrides the stored access token; login uses this to validate
    /// a token it has not persisted yet. Requests with an explicit token do
    /// not enter the refresh cycle.
    pub async fn current_user(&self, token: Option<&str>) -> Result<User> {
        let url = self.endpoint("users/me/")?;
        Ok(self
            .request_json_at(Method::GET, url, None, token)
            .await?)
    }

    /// Submit a registration. Does not authenticate.
    pub async fn register(&self, data: &RegisterData) -> Result<RegisterReceipt> {
        // The backend wants the password twice (confirmation field)
        let body = serde_json::json!({
            "username": data.username,
            "email": data.email,
            "password": data.password,
            "password2": data.password,
        });
        Ok(self
            .request_json(Method::POST, "users/register/", Some(body))
            .await?)
    }

    /// Redeem an email verification token.
    pub async fn verify_email(&self, token: &str) -> Result<EmailVerification> {
        let mut url = self.endpoint("users/verify-email")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(self.request_json_at(Method::GET, url, None, None).await?)
    }

    /// Update the authenticated user's profile fields.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let body = serde_json::to_value(update).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(self
            .request_json(Method::PATCH, "users/me/update/", Some(body))
            .await?)
    }

    // === Article endpoints ===

    /// List articles. For an authenticated caller the backend includes the
    /// caller's own drafts alongside everyone's published articles.
    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let listing: ArticleListing = self.request_json(Method::GET, "articles/", None).await?;
        Ok(listing.into_vec())
    }

    /// Fetch a single article by id.
    pub async fn get_article(&self, id: u64) -> Result<Article> {
        Ok(self
            .request_json(Method::GET, &format!("articles/{id}/"), None)
            .await?)
    }

    /// Create an article.
    pub async fn create_article(&self, input: &ArticleInput) -> Result<Article> {
        let body = serde_json::to_value(input).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(self
            .request_json(Method::POST, "articles/", Some(body))
            .await?)
    }

    /// Update an article's fields.
    pub async fn update_article(&self, id: u64, input: &ArticleInput) -> Result<Article> {
        let body = serde_json::to_value(input).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(self
            .request_json(Method::PATCH, &format!("articles/{id}/"), Some(body))
            .await?)
    }

    /// Delete an article.
    pub async fn delete_article(&self, id: u64) -> Result<()> {
        let url = self.endpoint(&format!("articles/{id}/"))?;
        self.perform(Method::DELETE, url, None, None).await?;
        Ok(())
    }

    /// Record a view of an article.
    ///
    /// Failures are downgraded to a zero receipt: view tracking must never
    /// break article display.
    pub async fn track_view(&self, id: u64) -> TrackedView {
        match self
            .request_json(Method::POST, &format!("articles/{id}/track-view/"), None)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                debug!(article_id = id, error = %err, "failed to track article view");
                TrackedView {
                    view_count: 0,
                    message: "failed to track view".to_string(),
                }
            }
        }
    }

    /// Search articles.
    pub async fn search_articles(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let mut url = self.endpoint("articles/search/")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.q);
            if let Some(search_type) = query.search_type {
                pairs.append_pair("type", search_type.as_str());
            }
            if let Some(ordering) = query.ordering {
                pairs.append_pair("ordering", ordering.as_str());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
        }
        Ok(self.request_json_at(Method::GET, url, None, None).await?)
    }

    // === Comment endpoints ===

    /// List the comments on an article.
    pub async fn list_comments(&self, article_id: u64) -> Result<Vec<Comment>> {
        Ok(self
            .request_json(Method::GET, &format!("articles/{article_id}/comments/"), None)
            .await?)
    }

    /// Post a comment on an article.
    pub async fn create_comment(&self, article_id: u64, input: &CommentInput) -> Result<Comment> {
        let body = serde_json::to_value(input).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(self
            .request_json(
                Method::POST,
                &format!("articles/{article_id}/comments/"),
                Some(body),
            )
            .await?)
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, article_id: u64, comment_id: u64) -> Result<()> {
        let url = self.endpoint(&format!("articles/{article_id}/comments/{comment_id}/"))?;
        self.perform(Method::DELETE, url, None, None).await?;
        Ok(())
    }

    // === Request plumbing ===

    fn endpoint(&self, path: &str) -> std::result::Result<Url, HttpError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| HttpError::Network(format!("invalid endpoint {path}: {e}")))
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> std::result::Result<T, HttpError> {
        let url = self.endpoint(path)?;
        self.request_json_at(method, url, body, None).await
    }

    async fn request_json_at<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        token_override: Option<&str>,
    ) -> std::result::Result<T, HttpError> {
        let response = Box::pin(self.perform(method, url, body, token_override)).await?;
        response
            .json()
            .await
            .map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Send the request and return the successful response.
    ///
    /// On a 401 from a non-token endpoint (and no explicit token override),
    /// runs at most one refresh-and-replay cycle; in every other failure
    /// case the classified error is returned as-is.
    async fn perform(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        token_override: Option<&str>,
    ) -> std::result::Result<reqwest::Response, HttpError> {
        let token = match token_override {
            Some(token) => Some(token.to_string()),
            None => self.inner.store.get(ACCESS_TOKEN_KEY).ok().flatten(),
        };
        let response = self
            .dispatch(method.clone(), url.clone(), body.as_ref(), token)
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = Self::error_message(response, status).await;
        debug!(status = status.as_u16(), %url, message, "API request failed");
        let original = HttpError::from_status(status.as_u16(), message);

        if status == StatusCode::UNAUTHORIZED
            && token_override.is_none()
            && !is_token_endpoint(url.path())
        {
            if let Some(access) = self.refresh_credentials().await {
                let retry = self
                    .dispatch(method, url, body.as_ref(), Some(access))
                    .await?;
                if retry.status().is_success() {
                    return Ok(retry);
                }
                debug!(
                    status = retry.status().as_u16(),
                    "replay after refresh failed, surfacing original 401"
                );
            }
        }
        Err(original)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        token: Option<String>,
    ) -> std::result::Result<reqwest::Response, HttpError> {
        let mut request = self.inner.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))
    }

    /// Run one token-refresh cycle, returning the fresh access token.
    ///
    /// On failure both persisted tokens are cleared and the auth sink is
    /// notified so the session demotes to anonymous.
    async fn refresh_credentials(&self) -> Option<String> {
        let refresh = self.inner.store.get(REFRESH_TOKEN_KEY).ok().flatten()?;
        match self.refresh_token(&refresh).await {
            Ok(fresh) => {
                if let Err(err) = self.inner.store.set(ACCESS_TOKEN_KEY, &fresh.access) {
                    warn!(error = %err, "failed to persist refreshed access token");
                }
                debug!("access token refreshed after 401");
                Some(fresh.access)
            }
            Err(err) => {
                debug!(error = %err, "token refresh failed, clearing persisted credentials");
                let _ = self.inner.store.remove(ACCESS_TOKEN_KEY);
                let _ = self.inner.store.remove(REFRESH_TOKEN_KEY);
                if let Some(sink) = self.inner.auth_sink.get().and_then(Weak::upgrade) {
                    sink.credentials_revoked();
                }
                None
            }
        }
    }

    async fn error_message(response: reqwest::Response, status: StatusCode) -> String {
        let fallback = format!("HTTP {status}");
        match response.json::<Value>().await {
            Ok(body) => ["error", "detail", "message"]
                .iter()
                .find_map(|key| body.get(key).and_then(Value::as_str))
                .map(str::to_string)
                // Validation errors arrive as an object keyed by field name;
                // pass the whole body through verbatim
                .or_else(|| {
                    body.as_object()
                        .filter(|fields| !fields.is_empty())
                        .map(|_| body.to_string())
                })
                .unwrap_or(fallback),
            Err(_) => fallback,
        }
    }
}
