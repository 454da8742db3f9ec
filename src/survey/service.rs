//! Survey authoring operations

use crate::error::{not_found_error, validation_error, ApiResult};
use crate::models::{
    CreatedSurvey, NewQuestion, NewSurvey, QuestionType, SurveySummary, SurveyTree,
};
use crate::store::{settle, StoreResult, SurveyStore, Transaction, UserStore};
use crate::survey::tree::assemble_survey;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates, reads and deletes surveys
pub struct SurveyService<S> {
    store: Arc<S>,
}

impl<S> SurveyService<S>
where
    S: SurveyStore + UserStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a survey with its questions and choices in one transaction.
    ///
    /// The owner's survey counter is bumped in the same transaction.
    pub async fn create(&self, owner_id: i32, input: &NewSurvey) -> ApiResult<CreatedSurvey> {
        if owner_id <= 0 {
            return Err(validation_error("Invalid or missing user id"));
        }
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(validation_error("Invalid or missing survey data"));
        }

        let mut tx = self.store.begin().await?;
        let outcome = write_survey(&mut tx, owner_id, input).await;
        let created = settle(tx, outcome, "Failed to create survey").await?;

        info!(
            "Survey {} created by user {} with {} questions",
            created.survey.id,
            owner_id,
            created.questions.len()
        );
        Ok(created)
    }

    pub async fn get(&self, survey_id: i32) -> ApiResult<SurveyTree> {
        let rows = self.store.survey_rows(survey_id).await?;
        assemble_survey(&rows)
            .ok_or_else(|| not_found_error(format!("No survey found with id: {}", survey_id)))
    }

    pub async fn list_for_owner(&self, owner_id: i32) -> ApiResult<Vec<SurveySummary>> {
        if !self.store.user_exists(owner_id).await? {
            return Err(not_found_error(format!("No user found with id: {}", owner_id)));
        }
        Ok(self.store.list_surveys(owner_id).await?)
    }

    /// Delete a survey and decrement its owner's counter.
    ///
    /// The counter is decremented even when nothing was deleted.
    pub async fn delete(&self, owner_id: i32, survey_id: i32) -> ApiResult<()> {
        let deleted = self.store.delete_survey(survey_id).await?;
        self.store.decrement_survey_count(owner_id).await?;

        if !deleted {
            warn!(
                "Survey {} not found but survey count of user {} was decremented",
                survey_id, owner_id
            );
            return Err(not_found_error(format!("No survey found with id: {}", survey_id)));
        }
        info!("Survey {} deleted", survey_id);
        Ok(())
    }
}

async fn write_survey<T: Transaction>(
    tx: &mut T,
    owner_id: i32,
    input: &NewSurvey,
) -> StoreResult<CreatedSurvey> {
    let survey = tx
        .insert_survey(owner_id, &input.title, &input.description)
        .await?;

    let mut questions = Vec::with_capacity(input.questions.len());
    for question in &input.questions {
        let question_type = check_question(question)?;
        let created = tx
            .insert_question(survey.id, &question.text, question_type)
            .await?;

        if question_type == QuestionType::MultipleChoice {
            for option in question.options.iter().flatten() {
                tx.insert_choice(created.id, &option.choice_text).await?;
            }
        }
        debug!(
            "{} question {} added to survey {}",
            question_type, created.id, survey.id
        );
        questions.push(created);
    }

    tx.increment_survey_count(owner_id).await?;
    Ok(CreatedSurvey { survey, questions })
}

fn check_question(question: &NewQuestion) -> StoreResult<QuestionType> {
    if question.text.trim().is_empty() || question.question_type.trim().is_empty() {
        return Err(validation_error("Missing question data"));
    }
    let question_type: QuestionType = question.question_type.parse().map_err(validation_error)?;

    if question_type == QuestionType::MultipleChoice {
        let options = question.options.as_deref().unwrap_or_default();
        if options.is_empty() || options.iter().any(|o| o.choice_text.trim().is_empty()) {
            return Err(validation_error("Missing question option data"));
        }
    }
    Ok(question_type)
}
