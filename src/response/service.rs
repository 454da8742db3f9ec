//! Survey completion and response aggregation

use crate::error::{not_found_error, validation_error, ApiResult};
use crate::models::{ChartRow, CompletedResponse, ResponseDetail, ResponseRecord};
use crate::response::tree::assemble_response;
use crate::store::{settle, ResponseStore, StoreResult, Transaction};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// Records completed surveys and serves their results
pub struct ResponseService<S> {
    store: Arc<S>,
}

impl<S: ResponseStore> ResponseService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Store a completed survey.
    ///
    /// `payload` is `{ "survey_id": .., "responses": { "<question id>": "<answer>" } }`;
    /// answers are inserted in the order the entries appear.
    pub async fn complete(&self, payload: &Value) -> ApiResult<CompletedResponse> {
        let payload = payload
            .as_object()
            .ok_or_else(|| validation_error("Invalid response format"))?;
        let survey_id = parse_survey_id(payload.get("survey_id"))
            .ok_or_else(|| validation_error("Missing or invalid survey id"))?;
        let answers = payload
            .get("responses")
            .and_then(Value::as_object)
            .ok_or_else(|| validation_error("Invalid or missing responses"))?;

        let mut tx = self.store.begin().await?;
        let outcome = write_response(&mut tx, survey_id, answers).await;
        let completed = settle(tx, outcome, "Failed to complete survey").await?;

        info!(
            "Response {} recorded for survey {} ({} answers)",
            completed.response.id,
            survey_id,
            completed.answers.len()
        );
        Ok(completed)
    }

    pub async fn get(&self, response_id: i32) -> ApiResult<ResponseDetail> {
        let rows = self.store.response_rows(response_id).await?;
        assemble_response(&rows)
            .ok_or_else(|| not_found_error(format!("No response found with id: {}", response_id)))
    }

    /// All responses of a survey. No responses is reported as a missing survey.
    pub async fn summary(&self, survey_id: i32) -> ApiResult<Vec<ResponseRecord>> {
        let responses = self.store.list_responses(survey_id).await?;
        if responses.is_empty() {
            return Err(not_found_error(format!("No survey found with id: {}", survey_id)));
        }
        Ok(responses)
    }

    pub async fn chart_data(&self, survey_id: i32) -> ApiResult<Vec<ChartRow>> {
        Ok(self.store.chart_rows(survey_id).await?)
    }

    pub async fn delete(&self, response_id: i32) -> ApiResult<()> {
        if !self.store.delete_response(response_id).await? {
            return Err(not_found_error(format!("No response found with id: {}", response_id)));
        }
        info!("Response {} deleted", response_id);
        Ok(())
    }
}

async fn write_response<T: Transaction>(
    tx: &mut T,
    survey_id: i32,
    entries: &Map<String, Value>,
) -> StoreResult<CompletedResponse> {
    let response = tx.insert_response(survey_id, Utc::now()).await?;

    let mut answers = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let (Ok(question_id), Some(answer_text)) = (key.trim().parse::<i32>(), value.as_str())
        else {
            return Err(validation_error("Invalid question_id or answer_text format"));
        };
        answers.push(tx.insert_answer(response.id, question_id, answer_text).await?);
    }

    Ok(CompletedResponse { response, answers })
}

/// Accepts a positive integer or its decimal string form
fn parse_survey_id(value: Option<&Value>) -> Option<i32> {
    let id = match value? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}
