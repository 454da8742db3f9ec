//! Storage ports
//!
//! The survey and response builders talk to the database through these
//! traits. `PgStore` (in `db`) is the production implementation; the unit
//! tests run against an in-memory one.

#[cfg(test)]
pub mod memory;

use crate::db::queries::UpdateClause;
use crate::error::AppError;
use crate::models::{
    AnswerRecord, ChartRow, ChoiceRecord, NewUserRecord, QuestionRecord, QuestionType,
    ResponseJoinRow, ResponseRecord, SurveyJoinRow, SurveyRecord, SurveySummary, UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

pub type StoreResult<T> = Result<T, AppError>;

/// A store that can open transactions
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: Transaction;

    /// Open a transaction on a dedicated connection
    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// Statements that run inside an aggregate write
///
/// Exactly one of `commit` or `rollback` ends the transaction.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(&mut self) -> StoreResult<()>;
    async fn rollback(&mut self) -> StoreResult<()>;

    async fn insert_survey(
        &mut self,
        owner_id: i32,
        title: &str,
        description: &str,
    ) -> StoreResult<SurveyRecord>;

    async fn insert_question(
        &mut self,
        survey_id: i32,
        text: &str,
        question_type: QuestionType,
    ) -> StoreResult<QuestionRecord>;

    async fn insert_choice(&mut self, question_id: i32, text: &str) -> StoreResult<ChoiceRecord>;

    async fn increment_survey_count(&mut self, user_id: i32) -> StoreResult<()>;

    async fn insert_response(
        &mut self,
        survey_id: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<ResponseRecord>;

    async fn insert_answer(
        &mut self,
        response_id: i32,
        question_id: i32,
        answer_text: &str,
    ) -> StoreResult<AnswerRecord>;
}

#[async_trait]
pub trait SurveyStore: Store {
    /// Survey ⟕ questions ⟕ choices, ordered by question id then choice id
    async fn survey_rows(&self, survey_id: i32) -> StoreResult<Vec<SurveyJoinRow>>;

    async fn list_surveys(&self, owner_id: i32) -> StoreResult<Vec<SurveySummary>>;

    /// Returns whether a row was deleted
    async fn delete_survey(&self, survey_id: i32) -> StoreResult<bool>;

    async fn decrement_survey_count(&self, user_id: i32) -> StoreResult<()>;
}

#[async_trait]
pub trait ResponseStore: Store {
    /// Response ⟕ answers ⟕ questions for one response, ordered by answer id
    async fn response_rows(&self, response_id: i32) -> StoreResult<Vec<ResponseJoinRow>>;

    async fn list_responses(&self, survey_id: i32) -> StoreResult<Vec<ResponseRecord>>;

    /// Responses × answers × questions of a survey, ordered by response id then question id
    async fn chart_rows(&self, survey_id: i32) -> StoreResult<Vec<ChartRow>>;

    async fn delete_response(&self, response_id: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;
    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<UserRecord>>;
    async fn user_exists(&self, id: i32) -> StoreResult<bool>;
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;
    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserRecord>;
    async fn update_user(&self, id: i32, changes: &UpdateClause) -> StoreResult<Option<UserRecord>>;
    async fn delete_user(&self, id: i32) -> StoreResult<bool>;
}

/// End a transaction according to the outcome of its body.
///
/// Success commits; any failure (including a failed commit) rolls back and
/// is re-raised through [`AppError::wrap_aggregate`] with `context`.
pub async fn settle<T, X: Transaction>(
    mut tx: X,
    outcome: StoreResult<T>,
    context: &str,
) -> StoreResult<T> {
    let cause = match outcome {
        Ok(value) => match tx.commit().await {
            Ok(()) => return Ok(value),
            Err(err) => err,
        },
        Err(err) => err,
    };

    if let Err(rollback_err) = tx.rollback().await {
        warn!("Rollback failed after '{}': {}", context, rollback_err);
    }
    Err(AppError::wrap_aggregate(context, cause))
}
