use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Comment, FeedbackBlog, User};

/// Repository Trait
///
/// The abstract contract for all persistence operations, expressed as the
/// document-store primitives the handlers need: insert, find-by-id,
/// find-by-field, full-document replace, delete-by-id, delete-many. The
/// referential fields (`author_id`, `likes`, `comments`) are opaque ids to
/// this layer; cross-collection consistency is the callers' responsibility.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn insert_user(&self, user: User) -> Result<User, ApiError>;
    // Case-sensitive exact match on the username field.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    // Batch lookup used to populate authors on read.
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ApiError>;

    // --- Feedback items ---
    async fn insert_feedback(&self, feedback: FeedbackBlog) -> Result<FeedbackBlog, ApiError>;
    async fn list_feedbacks(&self) -> Result<Vec<FeedbackBlog>, ApiError>;
    async fn find_feedback(&self, id: Uuid) -> Result<Option<FeedbackBlog>, ApiError>;
    // Full-document replace keyed on `feedback.id`. Replacing a document that
    // no longer exists is a no-op, not an error.
    async fn replace_feedback(&self, feedback: &FeedbackBlog) -> Result<(), ApiError>;
    // Returns true if a document was removed.
    async fn delete_feedback(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Comments ---
    async fn insert_comment(&self, comment: Comment) -> Result<Comment, ApiError>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, ApiError>;
    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Comment>, ApiError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, ApiError>;
    // Delete-many-by-filter; returns how many documents were removed.
    async fn delete_comments_by_ids(&self, ids: &[Uuid]) -> Result<u64, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation, backed by PostgreSQL used as a plain
/// document store: three tables with no foreign keys, `uuid[]` columns for
/// the denormalized reference lists, and whole-row updates for replace
/// semantics.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Provisions the three tables if they are missing. Called at startup in
    /// `Env::Local` only; production schemas are managed out of band.
    pub async fn ensure_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // No foreign keys: `author_id`, `likes`, and `comments` are opaque
        // identifier values, consistent with the store contract.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS feedback_blogs (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                tag TEXT NOT NULL,
                content TEXT NOT NULL,
                author_id UUID NOT NULL,
                likes UUID[] NOT NULL,
                comments UUID[] NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS comments (
                id UUID PRIMARY KEY,
                comment TEXT NOT NULL,
                author_id UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert_user(&self, user: User) -> Result<User, ApiError> {
        sqlx::query(
            "INSERT INTO users (id, username, name, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, name, password_hash, created_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn insert_feedback(&self, feedback: FeedbackBlog) -> Result<FeedbackBlog, ApiError> {
        sqlx::query(
            "INSERT INTO feedback_blogs (id, title, tag, content, author_id, likes, comments, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(feedback.id)
        .bind(&feedback.title)
        .bind(&feedback.tag)
        .bind(&feedback.content)
        .bind(feedback.author_id)
        .bind(&feedback.likes)
        .bind(&feedback.comments)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn list_feedbacks(&self) -> Result<Vec<FeedbackBlog>, ApiError> {
        let feedbacks = sqlx::query_as::<_, FeedbackBlog>(
            "SELECT id, title, tag, content, author_id, likes, comments, created_at \
             FROM feedback_blogs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feedbacks)
    }

    async fn find_feedback(&self, id: Uuid) -> Result<Option<FeedbackBlog>, ApiError> {
        let feedback = sqlx::query_as::<_, FeedbackBlog>(
            "SELECT id, title, tag, content, author_id, likes, comments, created_at \
             FROM feedback_blogs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn replace_feedback(&self, feedback: &FeedbackBlog) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE feedback_blogs \
             SET title = $2, tag = $3, content = $4, author_id = $5, likes = $6, comments = $7, created_at = $8 \
             WHERE id = $1",
        )
        .bind(feedback.id)
        .bind(&feedback.title)
        .bind(&feedback.tag)
        .bind(&feedback.content)
        .bind(feedback.author_id)
        .bind(&feedback.likes)
        .bind(&feedback.comments)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_feedback(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM feedback_blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, ApiError> {
        sqlx::query(
            "INSERT INTO comments (id, comment, author_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(comment.id)
        .bind(&comment.comment)
        .bind(comment.author_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, comment, author_id, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Comment>, ApiError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, comment, author_id, created_at FROM comments WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_by_ids(&self, ids: &[Uuid]) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// InMemoryRepository
///
/// A HashMap-backed implementation of the same contract, used by the test
/// suites and anywhere a store-free instance is convenient. Behaviorally it
/// mirrors the Postgres implementation, including the no-foreign-keys
/// looseness the handlers must compensate for.
#[derive(Default)]
pub struct InMemoryRepository {
    users: Mutex<HashMap<Uuid, User>>,
    feedbacks: Mutex<HashMap<Uuid, FeedbackBlog>>,
    comments: Mutex<HashMap<Uuid, Comment>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // Collection sizes, for test assertions.
    pub async fn user_count(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn feedback_count(&self) -> usize {
        self.feedbacks.lock().await.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.comments.lock().await.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert_user(&self, user: User) -> Result<User, ApiError> {
        self.users.lock().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ApiError> {
        let users = self.users.lock().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn insert_feedback(&self, feedback: FeedbackBlog) -> Result<FeedbackBlog, ApiError> {
        self.feedbacks
            .lock()
            .await
            .insert(feedback.id, feedback.clone());
        Ok(feedback)
    }

    async fn list_feedbacks(&self) -> Result<Vec<FeedbackBlog>, ApiError> {
        let mut feedbacks: Vec<FeedbackBlog> =
            self.feedbacks.lock().await.values().cloned().collect();
        feedbacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feedbacks)
    }

    async fn find_feedback(&self, id: Uuid) -> Result<Option<FeedbackBlog>, ApiError> {
        Ok(self.feedbacks.lock().await.get(&id).cloned())
    }

    async fn replace_feedback(&self, feedback: &FeedbackBlog) -> Result<(), ApiError> {
        let mut feedbacks = self.feedbacks.lock().await;
        if feedbacks.contains_key(&feedback.id) {
            feedbacks.insert(feedback.id, feedback.clone());
        }
        Ok(())
    }

    async fn delete_feedback(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.feedbacks.lock().await.remove(&id).is_some())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, ApiError> {
        self.comments
            .lock()
            .await
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        Ok(self.comments.lock().await.get(&id).cloned())
    }

    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Comment>, ApiError> {
        let comments = self.comments.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| comments.get(id).cloned())
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.comments.lock().await.remove(&id).is_some())
    }

    async fn delete_comments_by_ids(&self, ids: &[Uuid]) -> Result<u64, ApiError> {
        let mut comments = self.comments.lock().await;
        let mut removed = 0;
        for id in ids {
            if comments.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
