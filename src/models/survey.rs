//! Survey, question and choice models

use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Kind of a survey question, stored as the `question_type_enum` PostgreSQL enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "question_type_enum")]
pub enum QuestionType {
    #[postgres(name = "Text")]
    #[serde(rename = "Text")]
    Text,
    #[postgres(name = "Yes/No")]
    #[serde(rename = "Yes/No")]
    YesNo,
    #[postgres(name = "Multiple Choice")]
    #[serde(rename = "Multiple Choice")]
    MultipleChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "Text",
            QuestionType::YesNo => "Yes/No",
            QuestionType::MultipleChoice => "Multiple Choice",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Text" => Ok(QuestionType::Text),
            "Yes/No" => Ok(QuestionType::YesNo),
            "Multiple Choice" => Ok(QuestionType::MultipleChoice),
            other => Err(format!(
                "invalid input value for enum question_type_enum: \"{}\"",
                other
            )),
        }
    }
}

// ============================================
// Request types
// ============================================

/// Request to create a survey with its questions
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewSurvey {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Survey title is required"))]
    pub title: String,

    #[serde(default, alias = "survey_description")]
    #[validate(length(min = 1, message = "Survey description is required"))]
    pub description: String,

    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<NewQuestion>,
}

/// One question of a new survey
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewQuestion {
    #[serde(default, alias = "question_text")]
    #[validate(length(min = 1, message = "Question text is required"))]
    pub text: String,

    /// Kept as text so unknown kinds are rejected by the builder with a clear message
    #[serde(default, rename = "type", alias = "question_type")]
    #[validate(length(min = 1, message = "Question type is required"))]
    pub question_type: String,

    #[serde(default)]
    #[validate(nested)]
    pub options: Option<Vec<NewChoice>>,
}

/// One option of a multiple choice question
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewChoice {
    #[serde(default)]
    #[validate(length(min = 1, message = "Choice text is required"))]
    pub choice_text: String,
}

// ============================================
// Stored records
// ============================================

/// Survey row as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyRecord {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
}

/// Question row as echoed back after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    pub id: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceRecord {
    pub id: i32,
    pub question_id: i32,
    pub text: String,
}

/// Result of a survey creation: the survey row plus its questions in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSurvey {
    #[serde(flatten)]
    pub survey: SurveyRecord,
    pub questions: Vec<QuestionRecord>,
}

/// Entry of a user's survey list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    pub id: i32,
    pub title: String,
    pub description: String,
}

/// One row of the survey ⟕ question ⟕ choice join
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyJoinRow {
    pub survey_id: i32,
    pub title: String,
    pub description: String,
    pub question_id: Option<i32>,
    pub question_text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub choice_id: Option<i32>,
    pub choice_text: Option<String>,
}

// ============================================
// Nested read model
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyTree {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionNode {
    pub id: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<ChoiceNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceNode {
    pub id: i32,
    pub text: String,
}
