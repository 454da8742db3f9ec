//! Response, answer and chart models

use crate::models::QuestionType;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response row as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub id: i32,
    pub survey_id: i32,
    pub completed_at: DateTime<Utc>,
}

/// Answer row as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub id: i32,
    pub response_id: i32,
    pub question_id: i32,
    pub answer_text: String,
}

/// Result of completing a survey: the response plus answers in submission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedResponse {
    #[serde(flatten)]
    pub response: ResponseRecord,
    pub answers: Vec<AnswerRecord>,
}

/// One row of the response ⟕ answer ⟕ question join
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseJoinRow {
    pub response_id: i32,
    pub survey_id: i32,
    pub completed_at: DateTime<Utc>,
    pub answer_id: Option<i32>,
    pub question_id: Option<i32>,
    pub answer_text: Option<String>,
    pub question_text: Option<String>,
}

/// A single response with its answers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetail {
    pub response_id: i32,
    pub survey_id: i32,
    pub completed_at: DateTime<Utc>,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerDetail {
    pub id: i32,
    pub question_id: i32,
    pub question_text: Option<String>,
    pub answer_text: String,
}

/// Flattened response × answer × question record for tables and charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub response_id: i32,
    pub timestamp: DateTime<Utc>,
    pub question_id: i32,
    pub question_text: String,
    pub question_type: QuestionType,
    pub answer_text: String,
}
