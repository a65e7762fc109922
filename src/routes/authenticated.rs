use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Every route here is guarded by the `AuthUser` route layer installed in
/// `create_router`, so the handlers always receive a verified identity. The
/// two delete endpoints additionally apply the ownership rule inside the
/// handler (item author for feedback, comment author for comments).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /feedbacks
        // Submits a new feedback item owned by the authenticated user.
        .route("/feedbacks", post(handlers::create_feedback))
        // PUT /feedbacks/likes/{id}
        // Toggles the requester's like on an item. No ownership check.
        .route("/feedbacks/likes/{id}", put(handlers::toggle_like))
        // POST /feedbacks/{id} posts a comment against the item;
        // DELETE /feedbacks/{id} is the author-only removal of the item,
        // cascading to its comments.
        .route(
            "/feedbacks/{id}",
            post(handlers::add_comment).delete(handlers::delete_feedback),
        )
        // DELETE /feedbacks/{id}/{commentId}
        // Comment-author-only removal, unlinking from the parent first.
        .route(
            "/feedbacks/{id}/{commentId}",
            delete(handlers::delete_comment),
        )
}
