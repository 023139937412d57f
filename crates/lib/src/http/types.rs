//! Wire types exchanged with the backend API.
//!
//! These mirror the backend's JSON shapes. Values are replaced wholesale
//! when re-fetched, never patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend user identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<DateTime<Utc>>,
}

/// Publication state of an article.
///
/// Serialized as the backend's lowercase English vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

/// An article as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub view_count: u64,
}

impl Article {
    /// Whether `user` may read this article.
    ///
    /// Drafts are readable only by their author; published articles by
    /// anyone, authenticated or not.
    pub fn readable_by(&self, user: Option<&User>) -> bool {
        match self.status {
            ArticleStatus::Published => true,
            ArticleStatus::Draft => user.is_some_and(|u| u.id == self.author.id),
        }
    }
}

/// A comment on an article. Replies nest one level per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// Id of the article this comment belongs to.
    pub article: u64,
    pub user: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Comment>>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Login credentials. The `username` field carries the email address; the
/// token endpoint authenticates by email.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Access/refresh token pair issued by the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Fresh access token from the refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
}

/// Response to a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReceipt {
    pub message: String,
    pub user_id: u64,
    pub email: String,
}

/// Outcome of an email verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailVerification {
    pub status: VerificationStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Success,
    AlreadyVerified,
    Error,
}

/// Receipt from the view-tracking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedView {
    pub view_count: u64,
    pub message: String,
}

/// Fields for creating or updating an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
}

/// Partial profile update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Fields for posting a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentInput {
    pub content: String,
    /// Id of the parent comment when replying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
}

/// A page of results from a paginated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Article listings arrive either paginated or as a bare array depending on
/// the endpoint and backend version; both normalize to a plain vector.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ArticleListing {
    Paginated(Paginated<Article>),
    Plain(Vec<Article>),
}

impl ArticleListing {
    pub(crate) fn into_vec(self) -> Vec<Article> {
        match self {
            ArticleListing::Paginated(page) => page.results,
            ArticleListing::Plain(articles) => articles,
        }
    }
}

/// Search request parameters.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// The search keywords.
    pub q: String,
    pub search_type: Option<SearchType>,
    pub ordering: Option<SearchOrdering>,
    pub page: Option<u32>,
}

impl SearchQuery {
    /// Search everything, newest first, first page.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            search_type: None,
            ordering: None,
            page: None,
        }
    }
}

/// Which article fields a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    All,
    Title,
    Content,
    Author,
}

impl SearchType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SearchType::All => "all",
            SearchType::Title => "title",
            SearchType::Content => "content",
            SearchType::Author => "author",
        }
    }
}

/// Sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrdering {
    Newest,
    Oldest,
    MostViewed,
    LeastViewed,
    TitleAsc,
    TitleDesc,
}

impl SearchOrdering {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SearchOrdering::Newest => "-created_at",
            SearchOrdering::Oldest => "created_at",
            SearchOrdering::MostViewed => "-view_count",
            SearchOrdering::LeastViewed => "view_count",
            SearchOrdering::TitleAsc => "title",
            SearchOrdering::TitleDesc => "-title",
        }
    }
}

/// Search results: a page of articles plus echo of the interpreted query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Article>,
    pub search_info: SearchInfo,
}

/// How the backend interpreted a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchInfo {
    pub query: String,
    pub search_type: String,
    pub ordering: String,
    pub total_results: u64,
}
