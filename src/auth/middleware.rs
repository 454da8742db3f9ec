//! Authentication middleware
//!
//! Extracts and validates JWT tokens from requests.

use crate::auth::{decode_token, Claims};
use crate::error::AppError;
use crate::state::SharedState;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tracing::debug;

/// Claims of the caller, if [`auth_middleware`] accepted a token
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

impl<S> FromRequestParts<S> for MaybeClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Attach the caller's claims to the request when a valid bearer token is sent.
///
/// Requests without a token, or with a bad one, continue anonymously.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    if let Some(token) = token {
        match decode_token(token, &state.auth.secret_key) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(e) => debug!("Ignoring bearer token: {}", e),
        }
    }

    next.run(request).await
}

/// The caller must be logged in as the user named in the path
pub fn ensure_correct_user(claims: Option<&Claims>, user_id: i32) -> Result<(), AppError> {
    match claims {
        Some(claims) if claims.user_id == user_id => Ok(()),
        _ => Err(AppError::Unauthorized("Unauthorized".to_string())),
    }
}
