use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The request-local failure taxonomy. Every handler and the auth extractor
/// resolve to one of these variants; none of them is fatal to the process.
///
/// Two notes on the wire mapping:
/// - `Forbidden` (valid identity, wrong principal) is internally distinct from
///   `Unauthorized` (missing/invalid credentials) but both serialize as 401.
/// - `NotFound` maps to 400, matching the API's established convention for
///   unresolved ids.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, empty, or too-short required field; also duplicate usernames.
    #[error("{0}")]
    Validation(&'static str),

    /// Missing/malformed/expired token, or bad login credentials.
    #[error("token missing or invalid")]
    Unauthorized,

    /// Authenticated, but not the owner of the targeted resource.
    #[error("wrong user")]
    Forbidden,

    /// A referenced id did not resolve to a document.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Persistence-layer failure. The underlying error is logged, never
    /// exposed in the response body.
    #[error("store failure")]
    Store(#[from] sqlx::Error),

    /// Anything else that should never happen in a healthy process
    /// (hashing or token-signing failures).
    #[error("internal error")]
    Internal(String),
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::NotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::Forbidden => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            ApiError::Store(e) => tracing::error!("store failure: {e:?}"),
            ApiError::Internal(msg) => tracing::error!("internal error: {msg}"),
            _ => {}
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
