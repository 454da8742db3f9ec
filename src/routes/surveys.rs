//! Survey route handlers
//!
//! Authoring routes are scoped to the logged-in owner; completing a survey
//! is open to anyone.

use crate::auth::{ensure_correct_user, MaybeClaims};
use crate::error::{validation_error, ApiResult};
use crate::models::{CompletedResponse, CreatedSurvey, NewSurvey, SurveySummary, SurveyTree};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct CreatedSurveyResponse {
    pub survey: CreatedSurvey,
}

#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    pub survey: SurveyTree,
}

#[derive(Debug, Serialize)]
pub struct SurveyListResponse {
    pub surveys: Vec<SurveySummary>,
}

#[derive(Debug, Serialize)]
pub struct CompletedSurveyResponse {
    #[serde(rename = "completedSurvey")]
    pub completed_survey: CompletedResponse,
}

#[derive(Debug, Serialize)]
pub struct DeletedSurveyResponse {
    pub deleted_survey: i32,
}

/// POST /surveys/complete
///
/// The body is checked by the response builder, so it is taken as raw JSON.
pub async fn complete_survey(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<CompletedSurveyResponse>)> {
    let completed_survey = state.responses.complete(&payload).await?;
    Ok((StatusCode::CREATED, Json(CompletedSurveyResponse { completed_survey })))
}

/// POST /surveys/{user_id}
pub async fn create_survey(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path(user_id): Path<i32>,
    Json(input): Json<NewSurvey>,
) -> ApiResult<(StatusCode, Json<CreatedSurveyResponse>)> {
    ensure_correct_user(claims.as_ref(), user_id)?;
    input.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Creating survey '{}' with {} questions", input.title, input.questions.len());
    let survey = state.surveys.create(user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(CreatedSurveyResponse { survey })))
}

/// GET /surveys/{user_id}/all
pub async fn list_surveys(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<SurveyListResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    let surveys = state.surveys.list_for_owner(user_id).await?;
    Ok(Json(SurveyListResponse { surveys }))
}

/// GET /surveys/{user_id}/{survey_id}
pub async fn get_survey(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path((user_id, survey_id)): Path<(i32, i32)>,
) -> ApiResult<Json<SurveyResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    let survey = state.surveys.get(survey_id).await?;
    Ok(Json(SurveyResponse { survey }))
}

/// DELETE /surveys/{user_id}/{survey_id}
pub async fn delete_survey(
    State(state): State<SharedState>,
    MaybeClaims(claims): MaybeClaims,
    Path((user_id, survey_id)): Path<(i32, i32)>,
) -> ApiResult<Json<DeletedSurveyResponse>> {
    ensure_correct_user(claims.as_ref(), user_id)?;

    state.surveys.delete(user_id, survey_id).await?;
    Ok(Json(DeletedSurveyResponse { deleted_survey: survey_id }))
}
