//! Authentication route handlers
//!
//! Token issuing for existing users and self-registration.

use crate::auth::create_token;
use crate::error::{validation_error, ApiResult};
use crate::models::{LoginRequest, RegisterRequest};
use crate::state::SharedState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/token
///
/// Exchange email and password for a token.
pub async fn token(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state.users.authenticate(&req.email, &req.password).await?;
    let token = create_token(&user, &state.auth)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/register
///
/// Register a new account and log it in.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let user = state.users.register(&req).await?;
    let token = create_token(&user, &state.auth)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
