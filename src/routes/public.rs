use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. A request carrying a bad or absent token on these routes simply
/// proceeds anonymously; the token is never inspected here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        // Registration. Username/password validation and the uniqueness check
        // happen in the handler; the response never includes the password hash.
        .route("/users", post(handlers::register_user))
        // POST /login
        // Credential verification and token issuance.
        .route("/login", post(handlers::login))
        // GET /feedbacks
        // Lists every feedback item with author and comments populated.
        .route("/feedbacks", get(handlers::get_feedbacks))
}
