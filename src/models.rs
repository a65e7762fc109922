use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Documents ---

/// User
///
/// Canonical identity record in the `users` collection. The password hash
/// never leaves the process: it is skipped on serialization, so every JSON
/// rendering of a user is hash-free by construction.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Unique, compared case-sensitively.
    pub username: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// FeedbackBlog
///
/// A feedback item in the `feedback_blogs` collection. `likes` and `comments`
/// are denormalized back-references stored as opaque ids; the store enforces
/// no foreign keys, so the handlers are responsible for keeping both sides of
/// the comment link in agreement.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FeedbackBlog {
    pub id: Uuid,
    pub title: String,
    pub tag: String,
    pub content: String,
    // Owning user. Immutable after creation.
    pub author_id: Uuid,
    // Set semantics: each user id appears at most once, toggled on and off.
    pub likes: Vec<Uuid>,
    // Ordered list of comment ids owned by this item.
    pub comments: Vec<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl FeedbackBlog {
    /// A fresh item for `author_id`, with empty `likes` and `comments`.
    pub fn new(author_id: Uuid, title: String, tag: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            tag,
            content,
            author_id,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Toggle `user_id` in the `likes` set: remove if present, append if absent.
    pub fn toggle_like(&mut self, user_id: Uuid) {
        if self.likes.contains(&user_id) {
            self.likes.retain(|id| *id != user_id);
        } else {
            self.likes.push(user_id);
        }
    }
}

/// Comment
///
/// A comment in the `comments` collection. The parent FeedbackBlog holds the
/// forward reference; the comment itself only knows its author.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub comment: String,
    // Comment author. Immutable after creation.
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, comment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            comment,
            author_id,
            created_at: Utc::now(),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /users.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// CreateFeedbackRequest
///
/// Input payload for POST /feedbacks. `title` and `tag` are required and must
/// be non-empty; `content` is free-form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFeedbackRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub content: String,
}

/// CreateCommentRequest
///
/// Input payload for posting a comment against a feedback item.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub comment: String,
}

// --- Response Schemas (Output) ---

/// LoginResponse
///
/// Output of a successful login: the signed token plus the identity fields
/// the client caches.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// UserSummary
///
/// The slice of a user embedded in populated listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// FeedbackResponse
///
/// A feedback item as served by GET /feedbacks: author and comments resolved
/// from their collections on read. `author` is optional because the store has
/// no enforced foreign keys; a dangling author id renders as null rather than
/// failing the whole listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub title: String,
    pub tag: String,
    pub content: String,
    pub likes: Vec<Uuid>,
    pub author: Option<UserSummary>,
    pub comments: Vec<Comment>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl FeedbackResponse {
    /// Assemble the populated view of `feedback` from pre-fetched lookup maps.
    /// Comment order follows the parent's `comments` list; ids that no longer
    /// resolve are dropped silently.
    pub fn populate(
        feedback: FeedbackBlog,
        authors: &HashMap<Uuid, User>,
        comments: &HashMap<Uuid, Comment>,
    ) -> Self {
        Self {
            author: authors.get(&feedback.author_id).map(UserSummary::from),
            comments: feedback
                .comments
                .iter()
                .filter_map(|id| comments.get(id).cloned())
                .collect(),
            id: feedback.id,
            title: feedback.title,
            tag: feedback.tag,
            content: feedback.content,
            likes: feedback.likes,
            created_at: feedback.created_at,
        }
    }
}
