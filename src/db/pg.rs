//! PostgreSQL store
//!
//! Implements the storage ports on top of a deadpool-postgres pool.

use crate::db::queries::{self, SqlBuilder, UpdateClause};
use crate::error::AppError;
use crate::models::{
    AnswerRecord, ChartRow, ChoiceRecord, NewUserRecord, QuestionRecord, QuestionType,
    ResponseJoinRow, ResponseRecord, SurveyJoinRow, SurveyRecord, SurveySummary, UserRecord,
};
use crate::store::{
    ResponseStore, Store, StoreResult, SurveyStore, Transaction, UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Object, Pool};
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::{debug, warn};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> StoreResult<Object> {
        Ok(self.pool.get().await?)
    }
}

/// Transaction holding its pooled connection until commit or rollback
pub struct PgTransaction {
    client: Option<Object>,
    open: bool,
}

impl PgTransaction {
    fn client(&self) -> StoreResult<&Object> {
        match (&self.client, self.open) {
            (Some(client), true) => Ok(client),
            _ => Err(AppError::Internal("Transaction is no longer open".to_string())),
        }
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        // Never hand a connection with a live transaction back to the pool;
        // closing it makes the server abort the transaction.
        if let Some(client) = self.client.take() {
            warn!("Transaction dropped while open, discarding its connection");
            drop(Object::take(client));
        }
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> StoreResult<PgTransaction> {
        let client = self.client().await?;
        client.batch_execute("BEGIN").await?;
        debug!("Transaction started");
        Ok(PgTransaction {
            client: Some(client),
            open: true,
        })
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(&mut self) -> StoreResult<()> {
        self.client()?.batch_execute("COMMIT").await?;
        self.open = false;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if !self.open {
            return Ok(());
        }
        let result = self.client()?.batch_execute("ROLLBACK").await;
        self.open = false;
        debug!("Transaction rolled back");
        result.map_err(AppError::from)
    }

    async fn insert_survey(
        &mut self,
        owner_id: i32,
        title: &str,
        description: &str,
    ) -> StoreResult<SurveyRecord> {
        let row = self
            .client()?
            .query_one(queries::INSERT_SURVEY, &[&owner_id, &title, &description])
            .await?;
        Ok(SurveyRecord {
            id: row.get("id"),
            owner_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
        })
    }

    async fn insert_question(
        &mut self,
        survey_id: i32,
        text: &str,
        question_type: QuestionType,
    ) -> StoreResult<QuestionRecord> {
        let row = self
            .client()?
            .query_one(queries::INSERT_QUESTION, &[&survey_id, &text, &question_type])
            .await?;
        Ok(QuestionRecord {
            id: row.get("id"),
            text: row.get("question_text"),
            question_type: row.get("question_type"),
        })
    }

    async fn insert_choice(&mut self, question_id: i32, text: &str) -> StoreResult<ChoiceRecord> {
        let row = self
            .client()?
            .query_one(queries::INSERT_CHOICE, &[&question_id, &text])
            .await?;
        Ok(ChoiceRecord {
            id: row.get("id"),
            question_id: row.get("question_id"),
            text: row.get("choice_text"),
        })
    }

    async fn increment_survey_count(&mut self, user_id: i32) -> StoreResult<()> {
        self.client()?
            .execute(queries::INCREMENT_SURVEY_COUNT, &[&user_id])
            .await?;
        Ok(())
    }

    async fn insert_response(
        &mut self,
        survey_id: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<ResponseRecord> {
        let row = self
            .client()?
            .query_one(queries::INSERT_RESPONSE, &[&survey_id, &completed_at])
            .await?;
        Ok(response_from_row(&row))
    }

    async fn insert_answer(
        &mut self,
        response_id: i32,
        question_id: i32,
        answer_text: &str,
    ) -> StoreResult<AnswerRecord> {
        let row = self
            .client()?
            .query_one(queries::INSERT_ANSWER, &[&response_id, &question_id, &answer_text])
            .await?;
        Ok(AnswerRecord {
            id: row.get("id"),
            response_id: row.get("response_id"),
            question_id: row.get("question_id"),
            answer_text: row.get("answer_text"),
        })
    }
}

#[async_trait]
impl SurveyStore for PgStore {
    async fn survey_rows(&self, survey_id: i32) -> StoreResult<Vec<SurveyJoinRow>> {
        let client = self.client().await?;
        let rows = client.query(queries::SURVEY_TREE, &[&survey_id]).await?;

        Ok(rows
            .iter()
            .map(|row| SurveyJoinRow {
                survey_id: row.get("survey_id"),
                title: row.get("title"),
                description: row.get("description"),
                question_id: row.get("question_id"),
                question_text: row.get("question_text"),
                question_type: row.get("question_type"),
                choice_id: row.get("choice_id"),
                choice_text: row.get("choice_text"),
            })
            .collect())
    }

    async fn list_surveys(&self, owner_id: i32) -> StoreResult<Vec<SurveySummary>> {
        let client = self.client().await?;
        let rows = client.query(queries::LIST_SURVEYS_BY_OWNER, &[&owner_id]).await?;

        Ok(rows
            .iter()
            .map(|row| SurveySummary {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
            })
            .collect())
    }

    async fn delete_survey(&self, survey_id: i32) -> StoreResult<bool> {
        let client = self.client().await?;
        let row = client.query_opt(queries::DELETE_SURVEY, &[&survey_id]).await?;
        Ok(row.is_some())
    }

    async fn decrement_survey_count(&self, user_id: i32) -> StoreResult<()> {
        let client = self.client().await?;
        client.execute(queries::DECREMENT_SURVEY_COUNT, &[&user_id]).await?;
        Ok(())
    }
}

#[async_trait]
impl ResponseStore for PgStore {
    async fn response_rows(&self, response_id: i32) -> StoreResult<Vec<ResponseJoinRow>> {
        let client = self.client().await?;
        let rows = client.query(queries::RESPONSE_DETAIL, &[&response_id]).await?;

        Ok(rows
            .iter()
            .map(|row| ResponseJoinRow {
                response_id: row.get("response_id"),
                survey_id: row.get("survey_id"),
                completed_at: row.get("completed_at"),
                answer_id: row.get("answer_id"),
                question_id: row.get("question_id"),
                answer_text: row.get("answer_text"),
                question_text: row.get("question_text"),
            })
            .collect())
    }

    async fn list_responses(&self, survey_id: i32) -> StoreResult<Vec<ResponseRecord>> {
        let client = self.client().await?;
        let rows = client.query(queries::LIST_RESPONSES_BY_SURVEY, &[&survey_id]).await?;
        Ok(rows.iter().map(response_from_row).collect())
    }

    async fn chart_rows(&self, survey_id: i32) -> StoreResult<Vec<ChartRow>> {
        let client = self.client().await?;
        let rows = client.query(queries::SURVEY_CHART_DATA, &[&survey_id]).await?;

        Ok(rows
            .iter()
            .map(|row| ChartRow {
                response_id: row.get("response_id"),
                timestamp: row.get("timestamp"),
                question_id: row.get("question_id"),
                question_text: row.get("question_text"),
                question_type: row.get("question_type"),
                answer_text: row.get("answer_text"),
            })
            .collect())
    }

    async fn delete_response(&self, response_id: i32) -> StoreResult<bool> {
        let client = self.client().await?;
        let row = client.query_opt(queries::DELETE_RESPONSE, &[&response_id]).await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let client = self.client().await?;
        let row = client.query_opt(queries::FIND_USER_BY_EMAIL, &[&email]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<UserRecord>> {
        let client = self.client().await?;
        let row = client.query_opt(queries::FIND_USER_BY_ID, &[&id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn user_exists(&self, id: i32) -> StoreResult<bool> {
        let client = self.client().await?;
        let row = client.query_one(queries::USER_EXISTS, &[&id]).await?;
        Ok(row.get(0))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let client = self.client().await?;
        let rows = client.query(queries::LIST_USERS, &[]).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserRecord> {
        let client = self.client().await?;
        let row = client
            .query_one(
                queries::INSERT_USER,
                &[&user.email, &user.password_hash, &user.first_name, &user.last_name],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") {
                    AppError::BadRequest(format!(
                        "Account already registered to email: {}",
                        user.email
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(user_from_row(&row))
    }

    async fn update_user(&self, id: i32, changes: &UpdateClause) -> StoreResult<Option<UserRecord>> {
        // User columns are all text
        let texts: Vec<String> = changes.values.iter().map(value_as_text).collect();
        let mut params: Vec<&(dyn ToSql + Sync)> =
            texts.iter().map(|t| t as &(dyn ToSql + Sync)).collect();
        params.push(&id);

        let sql = SqlBuilder::update_by_id("users", changes, queries::USER_COLUMNS);
        let client = self.client().await?;
        let row = client.query_opt(sql.as_str(), &params).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let client = self.client().await?;
        let row = client.query_opt(queries::DELETE_USER, &[&id]).await?;
        Ok(row.is_some())
    }
}

fn response_from_row(row: &Row) -> ResponseRecord {
    ResponseRecord {
        id: row.get("id"),
        survey_id: row.get("survey_id"),
        completed_at: row.get("completed_at"),
    }
}

fn user_from_row(row: &Row) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        survey_count: row.get("survey_count"),
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
