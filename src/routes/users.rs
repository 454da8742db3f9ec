//! User route handlers

use crate::auth::{create_token, ensure_correct_user, MaybeClaims};
use crate::error::{bad_request_error, validation_error, ApiResult};
use crate::models::{RegisterRequest, UpdateUserRequest, User};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct NewUserResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub deleted_user: i32,
}

/// GET /users/all
pub async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<UserListResponse>> {
    let users = state.users.find_all().await?;
    Ok(Json(UserListResponse { users }))
}

/// POST /users
pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<NewUserResponse>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let user = state.users.register(&req).await?;
    let token = create_token(&user, &state.auth)?;
    Ok((StatusCode::CREATED, Json(NewUserResponse { user, token })))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    let user = state.users.get(user_id).await?;
    Ok(Json(UserResponse { user }))
}

/// PATCH /users/{user_id}
pub async fn update_user(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path(user_id): Path<i32>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UserResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    let req: UpdateUserRequest =
        serde_json::from_value(body).map_err(|e| bad_request_error(e.to_string()))?;
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let user = state.users.update(user_id, req.into_fields()).await?;
    Ok(Json(UserResponse { user }))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<DeletedUserResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    state.users.remove(user_id).await?;
    Ok(Json(DeletedUserResponse { deleted_user: user_id }))
}
