//! In-memory store for unit tests
//!
//! Mirrors the PostgreSQL schema closely enough for the builders: serial ids,
//! foreign keys, cascading deletes, the unique email and transactions that
//! hold the store lock and only become visible on commit.

use crate::db::queries::UpdateClause;
use crate::error::AppError;
use crate::models::{
    AnswerRecord, ChartRow, ChoiceRecord, NewUserRecord, QuestionRecord, QuestionType,
    ResponseJoinRow, ResponseRecord, SurveyJoinRow, SurveyRecord, SurveySummary, UserRecord,
};
use crate::store::{ResponseStore, Store, StoreResult, SurveyStore, Transaction, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct QuestionRow {
    survey_id: i32,
    text: String,
    question_type: QuestionType,
}

#[derive(Debug, Clone)]
struct ChoiceRow {
    question_id: i32,
    text: String,
}

#[derive(Debug, Clone)]
struct AnswerRow {
    response_id: i32,
    question_id: i32,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    next_id: i32,
    users: BTreeMap<i32, UserRecord>,
    surveys: BTreeMap<i32, SurveyRecord>,
    questions: BTreeMap<i32, QuestionRow>,
    choices: BTreeMap<i32, ChoiceRow>,
    responses: BTreeMap<i32, ResponseRecord>,
    answers: BTreeMap<i32, AnswerRow>,
}

fn fk_violation(table: &str, constraint: &str) -> AppError {
    AppError::Internal(format!(
        "insert or update on table \"{}\" violates foreign key constraint \"{}\"",
        table, constraint
    ))
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn cascade_delete_survey(&mut self, survey_id: i32) -> bool {
        if self.surveys.remove(&survey_id).is_none() {
            return false;
        }
        let question_ids: Vec<i32> = self
            .questions
            .iter()
            .filter(|(_, q)| q.survey_id == survey_id)
            .map(|(id, _)| *id)
            .collect();
        self.questions.retain(|_, q| q.survey_id != survey_id);
        self.choices.retain(|_, c| !question_ids.contains(&c.question_id));
        self.answers.retain(|_, a| !question_ids.contains(&a.question_id));

        let response_ids: Vec<i32> = self
            .responses
            .iter()
            .filter(|(_, r)| r.survey_id == survey_id)
            .map(|(id, _)| *id)
            .collect();
        for id in response_ids {
            self.cascade_delete_response(id);
        }
        true
    }

    fn cascade_delete_response(&mut self, response_id: i32) -> bool {
        if self.responses.remove(&response_id).is_none() {
            return false;
        }
        self.answers.retain(|_, a| a.response_id != response_id);
        true
    }

    fn adjust_survey_count(&mut self, user_id: i32, delta: i32) {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.survey_count += delta;
        }
    }
}

/// Shared in-memory database
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }

    /// Direct access for test setup and assertions; no transaction may be open
    fn idle(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .try_lock()
            .expect("memory store is locked by an open transaction")
    }

    /// Seed a user directly, bypassing hashing
    pub fn seed_user(&self, email: &str, first_name: &str, last_name: &str) -> i32 {
        let mut tables = self.idle();
        let id = tables.next_id();
        tables.users.insert(
            id,
            UserRecord {
                id,
                email: email.to_string(),
                password_hash: "not-a-hash".to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                survey_count: 0,
            },
        );
        id
    }

    pub fn survey_count_of(&self, user_id: i32) -> Option<i32> {
        self.idle().users.get(&user_id).map(|u| u.survey_count)
    }

    pub fn survey_total(&self) -> usize {
        self.idle().surveys.len()
    }

    pub fn question_total(&self) -> usize {
        self.idle().questions.len()
    }

    pub fn choice_total(&self) -> usize {
        self.idle().choices.len()
    }

    pub fn response_total(&self) -> usize {
        self.idle().responses.len()
    }

    pub fn answer_total(&self) -> usize {
        self.idle().answers.len()
    }
}

/// Holds the store lock from `begin` until it ends.
///
/// Writes go to a private copy that replaces the shared tables on commit, so
/// overlapping transactions run one after the other and none is lost.
pub struct MemoryTransaction {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Option<Tables>,
}

impl MemoryTransaction {
    fn tables(&mut self) -> StoreResult<&mut Tables> {
        self.working
            .as_mut()
            .ok_or_else(|| AppError::Internal("Transaction is no longer open".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryTransaction {
            guard: Some(guard),
            working: Some(working),
        })
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&mut self) -> StoreResult<()> {
        let (Some(working), Some(mut guard)) = (self.working.take(), self.guard.take()) else {
            return Err(AppError::Internal("Transaction is no longer open".to_string()));
        };
        *guard = working;
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        self.working = None;
        self.guard = None;
        Ok(())
    }

    async fn insert_survey(
        &mut self,
        owner_id: i32,
        title: &str,
        description: &str,
    ) -> StoreResult<SurveyRecord> {
        let tables = self.tables()?;
        if !tables.users.contains_key(&owner_id) {
            return Err(fk_violation("surveys", "surveys_user_id_fkey"));
        }
        let id = tables.next_id();
        let record = SurveyRecord {
            id,
            owner_id,
            title: title.to_string(),
            description: description.to_string(),
        };
        tables.surveys.insert(id, record.clone());
        Ok(record)
    }

    async fn insert_question(
        &mut self,
        survey_id: i32,
        text: &str,
        question_type: QuestionType,
    ) -> StoreResult<QuestionRecord> {
        let tables = self.tables()?;
        if !tables.surveys.contains_key(&survey_id) {
            return Err(fk_violation("questions", "questions_survey_id_fkey"));
        }
        let id = tables.next_id();
        tables.questions.insert(
            id,
            QuestionRow {
                survey_id,
                text: text.to_string(),
                question_type,
            },
        );
        Ok(QuestionRecord {
            id,
            text: text.to_string(),
            question_type,
        })
    }

    async fn insert_choice(&mut self, question_id: i32, text: &str) -> StoreResult<ChoiceRecord> {
        let tables = self.tables()?;
        if !tables.questions.contains_key(&question_id) {
            return Err(fk_violation("choices", "choices_question_id_fkey"));
        }
        let id = tables.next_id();
        tables.choices.insert(
            id,
            ChoiceRow {
                question_id,
                text: text.to_string(),
            },
        );
        Ok(ChoiceRecord {
            id,
            question_id,
            text: text.to_string(),
        })
    }

    async fn increment_survey_count(&mut self, user_id: i32) -> StoreResult<()> {
        self.tables()?.adjust_survey_count(user_id, 1);
        Ok(())
    }

    async fn insert_response(
        &mut self,
        survey_id: i32,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<ResponseRecord> {
        let tables = self.tables()?;
        if !tables.surveys.contains_key(&survey_id) {
            return Err(fk_violation("responses", "responses_survey_id_fkey"));
        }
        let id = tables.next_id();
        let record = ResponseRecord {
            id,
            survey_id,
            completed_at,
        };
        tables.responses.insert(id, record.clone());
        Ok(record)
    }

    async fn insert_answer(
        &mut self,
        response_id: i32,
        question_id: i32,
        answer_text: &str,
    ) -> StoreResult<AnswerRecord> {
        let tables = self.tables()?;
        if !tables.responses.contains_key(&response_id) {
            return Err(fk_violation("answers", "answers_response_id_fkey"));
        }
        if !tables.questions.contains_key(&question_id) {
            return Err(fk_violation("answers", "answers_question_id_fkey"));
        }
        let id = tables.next_id();
        tables.answers.insert(
            id,
            AnswerRow {
                response_id,
                question_id,
                text: answer_text.to_string(),
            },
        );
        Ok(AnswerRecord {
            id,
            response_id,
            question_id,
            answer_text: answer_text.to_string(),
        })
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn survey_rows(&self, survey_id: i32) -> StoreResult<Vec<SurveyJoinRow>> {
        let tables = self.lock().await;
        let Some(survey) = tables.surveys.get(&survey_id) else {
            return Ok(Vec::new());
        };
        let base = SurveyJoinRow {
            survey_id: survey.id,
            title: survey.title.clone(),
            description: survey.description.clone(),
            question_id: None,
            question_text: None,
            question_type: None,
            choice_id: None,
            choice_text: None,
        };

        let mut rows = Vec::new();
        for (question_id, question) in tables.questions.iter().filter(|(_, q)| q.survey_id == survey_id) {
            let with_question = SurveyJoinRow {
                question_id: Some(*question_id),
                question_text: Some(question.text.clone()),
                question_type: Some(question.question_type),
                ..base.clone()
            };
            let choices: Vec<_> = tables
                .choices
                .iter()
                .filter(|(_, c)| c.question_id == *question_id)
                .collect();
            if choices.is_empty() {
                rows.push(with_question);
            } else {
                for (choice_id, choice) in choices {
                    rows.push(SurveyJoinRow {
                        choice_id: Some(*choice_id),
                        choice_text: Some(choice.text.clone()),
                        ..with_question.clone()
                    });
                }
            }
        }
        if rows.is_empty() {
            rows.push(base);
        }
        Ok(rows)
    }

    async fn list_surveys(&self, owner_id: i32) -> StoreResult<Vec<SurveySummary>> {
        Ok(self
            .lock()
            .await
            .surveys
            .values()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| SurveySummary {
                id: s.id,
                title: s.title.clone(),
                description: s.description.clone(),
            })
            .collect())
    }

    async fn delete_survey(&self, survey_id: i32) -> StoreResult<bool> {
        Ok(self.lock().await.cascade_delete_survey(survey_id))
    }

    async fn decrement_survey_count(&self, user_id: i32) -> StoreResult<()> {
        self.lock().await.adjust_survey_count(user_id, -1);
        Ok(())
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn response_rows(&self, response_id: i32) -> StoreResult<Vec<ResponseJoinRow>> {
        let tables = self.lock().await;
        let Some(response) = tables.responses.get(&response_id) else {
            return Ok(Vec::new());
        };
        let base = ResponseJoinRow {
            response_id: response.id,
            survey_id: response.survey_id,
            completed_at: response.completed_at,
            answer_id: None,
            question_id: None,
            answer_text: None,
            question_text: None,
        };

        let mut rows: Vec<ResponseJoinRow> = tables
            .answers
            .iter()
            .filter(|(_, a)| a.response_id == response_id)
            .map(|(answer_id, answer)| ResponseJoinRow {
                answer_id: Some(*answer_id),
                question_id: Some(answer.question_id),
                answer_text: Some(answer.text.clone()),
                question_text: tables.questions.get(&answer.question_id).map(|q| q.text.clone()),
                ..base.clone()
            })
            .collect();
        if rows.is_empty() {
            rows.push(base);
        }
        Ok(rows)
    }

    async fn list_responses(&self, survey_id: i32) -> StoreResult<Vec<ResponseRecord>> {
        Ok(self
            .lock()
            .await
            .responses
            .values()
            .filter(|r| r.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn chart_rows(&self, survey_id: i32) -> StoreResult<Vec<ChartRow>> {
        let tables = self.lock().await;
        let mut rows: Vec<ChartRow> = tables
            .answers
            .values()
            .filter_map(|answer| {
                let response = tables.responses.get(&answer.response_id)?;
                let question = tables.questions.get(&answer.question_id)?;
                (question.survey_id == survey_id).then(|| ChartRow {
                    response_id: response.id,
                    timestamp: response.completed_at,
                    question_id: answer.question_id,
                    question_text: question.text.clone(),
                    question_type: question.question_type,
                    answer_text: answer.text.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.response_id, r.question_id));
        Ok(rows)
    }

    async fn delete_response(&self, response_id: i32) -> StoreResult<bool> {
        Ok(self.lock().await.cascade_delete_response(response_id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.lock().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> StoreResult<Option<UserRecord>> {
        Ok(self.lock().await.users.get(&id).cloned())
    }

    async fn user_exists(&self, id: i32) -> StoreResult<bool> {
        Ok(self.lock().await.users.contains_key(&id))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.lock().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.last_name.cmp(&b.last_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert_user(&self, user: NewUserRecord) -> StoreResult<UserRecord> {
        let mut tables = self.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest(format!(
                "Account already registered to email: {}",
                user.email
            )));
        }
        let id = tables.next_id();
        let record = UserRecord {
            id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            survey_count: 0,
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, id: i32, changes: &UpdateClause) -> StoreResult<Option<UserRecord>> {
        let mut tables = self.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        for (column, value) in changes.columns.iter().zip(&changes.values) {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match column.as_str() {
                "email" => user.email = text,
                "first_name" => user.first_name = text,
                "last_name" => user.last_name = text,
                "password_hash" => user.password_hash = text,
                other => {
                    return Err(AppError::Internal(format!(
                        "column \"{}\" of relation \"users\" does not exist",
                        other
                    )))
                }
            }
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.lock().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i32> = tables
            .surveys
            .values()
            .filter(|s| s.owner_id == id)
            .map(|s| s.id)
            .collect();
        for survey_id in owned {
            tables.cascade_delete_survey(survey_id);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn survey_fixture(store: &MemoryStore) -> i32 {
        let owner = store.seed_user("u1@test.com", "U1F", "U1L");
        let mut tx = store.begin().await.unwrap();
        let survey = tx.insert_survey(owner, "Test Survey", "Desc").await.unwrap();
        tx.commit().await.unwrap();
        survey.id
    }

    #[tokio::test]
    async fn test_overlapping_transactions_both_commit() {
        let store = MemoryStore::new();
        let survey_id = survey_fixture(&store).await;

        let mut first = store.begin().await.unwrap();
        first.insert_response(survey_id, Utc::now()).await.unwrap();

        let other = store.clone();
        let second = tokio::spawn(async move {
            let mut tx = other.begin().await?;
            tx.insert_response(survey_id, Utc::now()).await?;
            tx.commit().await
        });
        // Let the second transaction queue up behind the first
        tokio::task::yield_now().await;

        first.commit().await.unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(store.response_total(), 2);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes_and_releases_lock() {
        let store = MemoryStore::new();
        let survey_id = survey_fixture(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_response(survey_id, Utc::now()).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.response_total(), 0);
        assert!(tx.insert_response(survey_id, Utc::now()).await.is_err());
    }
}
