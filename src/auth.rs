use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::User};

/// Issued tokens expire after 30 days; verification rejects anything older.
const TOKEN_TTL_SECS: usize = 60 * 60 * 24 * 30;

/// Claims
///
/// The payload signed into every bearer token. The identity a request acts
/// under comes entirely from here; handlers never re-resolve it against the
/// store.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user.
    pub sub: Uuid,
    /// The username at issue time, echoed for display and logging.
    pub username: String,
    /// Issued At (iat): timestamp when the token was signed.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
}

/// issue_token
///
/// Signs a token for `user` at login. HS256 with the server secret.
pub fn issue_token(user: &User, secret: &str) -> Result<String, ApiError> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))
}

/// AuthUser
///
/// The resolved identity of an authenticated request, extracted from the
/// bearer token. Handlers take this as an argument to require authentication;
/// endpoints that serve anonymous traffic simply do not extract it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler.
///
/// The process:
/// 1. Read the Authorization header and strip a case-insensitive "Bearer" scheme.
/// 2. Decode and validate the JWT (signature and expiry) against the secret
///    from AppConfig.
///
/// Rejection policy is uniform: a missing header, a non-Bearer scheme, a bad
/// signature, a malformed payload, and an expired token all resolve to the
/// same 401 authentication failure. Verification errors never escape as
/// faults.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // Token extraction. The scheme comparison is case-insensitive, so
        // "bearer", "Bearer", and "BEARER" are all accepted.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token)
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: token_data.claims.sub,
            username: token_data.claims.username,
        })
    }
}

/// assert_owner
///
/// The ownership rule applied to every mutating access of an owned resource:
/// only the user whose canonical id matches `author_id` may proceed. The
/// resulting failure kind is distinct from an authentication failure, even
/// though both travel as 401 on the wire.
pub fn assert_owner(author_id: Uuid, user: &AuthUser) -> Result<(), ApiError> {
    if author_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
