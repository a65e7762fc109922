use std::collections::HashMap;

use crate::{
    AppState,
    auth::{AuthUser, assert_owner, issue_token},
    error::ApiError,
    models::{
        Comment, CreateCommentRequest, CreateFeedbackRequest, FeedbackBlog, FeedbackResponse,
        LoginRequest, LoginResponse, RegisterRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use uuid::Uuid;

// --- Identity Handlers ---

/// register_user
///
/// [Public Route] Creates a new user account.
///
/// Validation: `username` must be at least 3 characters and `password` at
/// least 4 (checked on the plaintext, before hashing); the username must not
/// already be taken (case-sensitive exact match). The password is bcrypt-hashed
/// before the document is persisted, and the stored hash is skipped on
/// serialization, so the 201 body never carries it.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Invalid or duplicate username/password")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if payload.username.len() < 3 || payload.password.len() < 4 {
        return Err(ApiError::Validation("username or password too short"));
    }

    if state
        .repo
        .find_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation("Username is already taken"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)?;

    let user = User {
        id: Uuid::new_v4(),
        username: payload.username,
        name: payload.name,
        password_hash,
        created_at: Utc::now(),
    };

    let saved = state.repo.insert_user(user).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

/// login
///
/// [Public Route] Verifies credentials and issues a bearer token.
///
/// An unknown username and a wrong password produce the identical 401, so the
/// response never reveals which factor failed. A hash that fails to parse is
/// treated the same way.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.repo.find_user_by_username(&payload.username).await?;

    let password_correct = match &user {
        Some(user) => verify(&payload.password, &user.password_hash).unwrap_or(false),
        None => false,
    };

    let user = match (user, password_correct) {
        (Some(user), true) => user,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = issue_token(&user, &state.config.jwt_secret)?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        name: user.name,
        user_id: user.id,
    }))
}

// --- Feedback Handlers ---

/// get_feedbacks
///
/// [Public Route] Lists all feedback items, newest first, with `author` and
/// `comments` resolved from their collections on read. The back-references are
/// recomputed here rather than stored on the user document.
#[utoipa::path(
    get,
    path = "/feedbacks",
    responses((status = 200, description = "All feedback items", body = [FeedbackResponse]))
)]
pub async fn get_feedbacks(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedbackResponse>>, ApiError> {
    let feedbacks = state.repo.list_feedbacks().await?;

    let author_ids: Vec<Uuid> = feedbacks.iter().map(|f| f.author_id).collect();
    let comment_ids: Vec<Uuid> = feedbacks
        .iter()
        .flat_map(|f| f.comments.iter().copied())
        .collect();

    let authors: HashMap<Uuid, User> = state
        .repo
        .find_users_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let comments: HashMap<Uuid, Comment> = state
        .repo
        .find_comments_by_ids(&comment_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let populated = feedbacks
        .into_iter()
        .map(|f| FeedbackResponse::populate(f, &authors, &comments))
        .collect();

    Ok(Json(populated))
}

/// create_feedback
///
/// [Authenticated Route] Posts a new feedback item owned by the requesting
/// user. `title` and `tag` are required; the item starts with empty `likes`
/// and `comments`.
#[utoipa::path(
    post,
    path = "/feedbacks",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Created", body = FeedbackBlog),
        (status = 400, description = "Missing title or tag"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_feedback(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackBlog>), ApiError> {
    if payload.title.is_empty() || payload.tag.is_empty() {
        return Err(ApiError::Validation("title and tag are required"));
    }

    let feedback = FeedbackBlog::new(user_id, payload.title, payload.tag, payload.content);
    let saved = state.repo.insert_feedback(feedback).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

/// toggle_like
///
/// [Authenticated Route] Toggles the requester in the item's `likes` set:
/// removed if present, appended if absent, so a repeated call restores the
/// previous state. Any authenticated user may like any existing item; there is
/// no ownership check. Concurrent toggles on the same item are last-write-wins
/// on the whole list.
#[utoipa::path(
    put,
    path = "/feedbacks/likes/{id}",
    params(("id" = Uuid, Path, description = "Feedback item ID")),
    responses(
        (status = 200, description = "Updated item", body = FeedbackBlog),
        (status = 400, description = "Feedback not found"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn toggle_like(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackBlog>, ApiError> {
    let mut feedback = state
        .repo
        .find_feedback(id)
        .await?
        .ok_or(ApiError::NotFound("feedback"))?;

    feedback.toggle_like(user_id);
    state.repo.replace_feedback(&feedback).await?;

    Ok(Json(feedback))
}

/// delete_feedback
///
/// [Authenticated Route] Deletes a feedback item and every comment it
/// references. Only the item's author may delete it.
///
/// Sequence: ownership check, then one delete-many over the referenced
/// comment ids, then the item itself. The two deletes are not transactional;
/// if the second fails the orphaned state is logged before the error is
/// surfaced.
#[utoipa::path(
    delete,
    path = "/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback item ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Feedback not found"),
        (status = 401, description = "Missing token or not the author")
    )
)]
pub async fn delete_feedback(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let feedback = state
        .repo
        .find_feedback(id)
        .await?
        .ok_or(ApiError::NotFound("feedback"))?;

    assert_owner(feedback.author_id, &user)?;

    if !feedback.comments.is_empty() {
        let removed = state.repo.delete_comments_by_ids(&feedback.comments).await?;
        if removed != feedback.comments.len() as u64 {
            tracing::warn!(
                feedback_id = %id,
                expected = feedback.comments.len(),
                removed,
                "comment cascade removed fewer documents than referenced"
            );
        }
    }

    if let Err(e) = state.repo.delete_feedback(id).await {
        tracing::error!(
            feedback_id = %id,
            "comments deleted but feedback item still present; collections inconsistent"
        );
        return Err(e);
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Comment Handlers ---

/// add_comment
///
/// [Authenticated Route] Posts a comment against a feedback item. The target
/// item must exist before the comment document is inserted, so a bad id can
/// never strand an orphaned comment. After the insert, the comment id is
/// appended to the parent's `comments` list and the parent is replaced; a
/// failure between those two steps is logged as an inconsistency before it is
/// surfaced.
#[utoipa::path(
    post,
    path = "/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback item ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "Empty comment or feedback not found"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(feedback_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    if payload.comment.is_empty() {
        return Err(ApiError::Validation("comment is required"));
    }

    let mut feedback = state
        .repo
        .find_feedback(feedback_id)
        .await?
        .ok_or(ApiError::NotFound("feedback"))?;

    let comment = state
        .repo
        .insert_comment(Comment::new(user_id, payload.comment))
        .await?;

    feedback.comments.push(comment.id);
    if let Err(e) = state.repo.replace_feedback(&feedback).await {
        tracing::error!(
            comment_id = %comment.id,
            feedback_id = %feedback_id,
            "comment inserted but not linked to its feedback item; collections inconsistent"
        );
        return Err(e);
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment from a feedback item. Only the
/// comment's author may delete it (not the item's author).
///
/// Ordering rule: the parent is replaced with the id removed *first*, then the
/// comment document is deleted. A crash between the steps leaves an unlisted
/// orphan document rather than a dangling id in the parent's list.
#[utoipa::path(
    delete,
    path = "/feedbacks/{id}/{commentId}",
    params(
        ("id" = Uuid, Path, description = "Feedback item ID"),
        ("commentId" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Comment or feedback not found"),
        (status = 401, description = "Missing token or not the comment author")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((feedback_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let comment = state
        .repo
        .find_comment(comment_id)
        .await?
        .ok_or(ApiError::NotFound("comment"))?;

    assert_owner(comment.author_id, &user)?;

    // Both documents must resolve before anything is mutated.
    let mut feedback = state
        .repo
        .find_feedback(feedback_id)
        .await?
        .ok_or(ApiError::NotFound("feedback"))?;

    feedback.comments.retain(|id| *id != comment_id);
    state.repo.replace_feedback(&feedback).await?;

    if let Err(e) = state.repo.delete_comment(comment_id).await {
        tracing::error!(
            comment_id = %comment_id,
            feedback_id = %feedback_id,
            "comment unlinked from its feedback item but document not deleted"
        );
        return Err(e);
    }

    Ok(StatusCode::NO_CONTENT)
}
