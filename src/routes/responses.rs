//! Response route handlers

use crate::error::ApiResult;
use crate::models::{ChartRow, ResponseDetail, ResponseRecord};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub responses: Vec<ResponseRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataResponse {
    #[serde(rename = "surveyChartData")]
    pub survey_chart_data: Vec<ChartRow>,
}

#[derive(Debug, Serialize)]
pub struct ResponseDetailResponse {
    pub response: ResponseDetail,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponseResponse {
    pub deleted_response: i32,
}

/// GET /responses/summary/{survey_id}
pub async fn survey_summary(
    State(state): State<SharedState>,
    Path(survey_id): Path<i32>,
) -> ApiResult<Json<SummaryResponse>> {
    let responses = state.responses.summary(survey_id).await?;
    Ok(Json(SummaryResponse { responses }))
}

/// GET /responses/data/{survey_id}
pub async fn survey_chart_data(
    State(state): State<SharedState>,
    Path(survey_id): Path<i32>,
) -> ApiResult<Json<ChartDataResponse>> {
    let survey_chart_data = state.responses.chart_data(survey_id).await?;
    Ok(Json(ChartDataResponse { survey_chart_data }))
}

/// GET /responses/{response_id}
pub async fn get_response(
    State(state): State<SharedState>,
    Path(response_id): Path<i32>,
) -> ApiResult<Json<ResponseDetailResponse>> {
    let response = state.responses.get(response_id).await?;
    Ok(Json(ResponseDetailResponse { response }))
}

/// DELETE /responses/{response_id}
pub async fn delete_response(
    State(state): State<SharedState>,
    Path(response_id): Path<i32>,
) -> ApiResult<Json<DeletedResponseResponse>> {
    state.responses.delete(response_id).await?;
    Ok(Json(DeletedResponseResponse { deleted_response: response_id }))
}
