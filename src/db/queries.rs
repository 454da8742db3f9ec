//! SQL query constants and builders
//!
//! Contains all SQL queries used by the application.

use crate::error::{bad_request_error, AppError};
use serde_json::{Map, Value};

// ============================================
// Surveys
// ============================================

pub const INSERT_SURVEY: &str = r#"
    INSERT INTO surveys (user_id, title, description)
    VALUES ($1, $2, $3)
    RETURNING id, user_id, title, description
"#;

pub const INSERT_QUESTION: &str = r#"
    INSERT INTO questions (survey_id, question_text, question_type)
    VALUES ($1, $2, $3)
    RETURNING id, question_text, question_type
"#;

pub const INSERT_CHOICE: &str = r#"
    INSERT INTO choices (question_id, choice_text)
    VALUES ($1, $2)
    RETURNING id, question_id, choice_text
"#;

pub const INCREMENT_SURVEY_COUNT: &str = r#"
    UPDATE users SET survey_count = survey_count + 1 WHERE id = $1
"#;

pub const DECREMENT_SURVEY_COUNT: &str = r#"
    UPDATE users SET survey_count = survey_count - 1 WHERE id = $1
"#;

/// Survey with its questions and choices, one row per choice
pub const SURVEY_TREE: &str = r#"
    SELECT
        s.id AS survey_id,
        s.title,
        s.description,
        q.id AS question_id,
        q.question_text,
        q.question_type,
        c.id AS choice_id,
        c.choice_text
    FROM surveys s
    LEFT JOIN questions q ON s.id = q.survey_id
    LEFT JOIN choices c ON q.id = c.question_id
    WHERE s.id = $1
    ORDER BY q.id, c.id
"#;

pub const LIST_SURVEYS_BY_OWNER: &str = r#"
    SELECT id, title, description
    FROM surveys
    WHERE user_id = $1
    ORDER BY id
"#;

pub const DELETE_SURVEY: &str = r#"
    DELETE FROM surveys WHERE id = $1 RETURNING id
"#;

// ============================================
// Responses
// ============================================

pub const INSERT_RESPONSE: &str = r#"
    INSERT INTO responses (survey_id, completed_at)
    VALUES ($1, $2)
    RETURNING id, survey_id, completed_at
"#;

pub const INSERT_ANSWER: &str = r#"
    INSERT INTO answers (response_id, question_id, answer_text)
    VALUES ($1, $2, $3)
    RETURNING id, response_id, question_id, answer_text
"#;

pub const RESPONSE_DETAIL: &str = r#"
    SELECT
        r.id AS response_id,
        r.survey_id,
        r.completed_at,
        a.id AS answer_id,
        a.question_id,
        a.answer_text,
        q.question_text
    FROM responses r
    LEFT JOIN answers a ON r.id = a.response_id
    LEFT JOIN questions q ON a.question_id = q.id
    WHERE r.id = $1
    ORDER BY a.id
"#;

pub const LIST_RESPONSES_BY_SURVEY: &str = r#"
    SELECT id, survey_id, completed_at
    FROM responses
    WHERE survey_id = $1
    ORDER BY id
"#;

pub const SURVEY_CHART_DATA: &str = r#"
    SELECT
        r.id AS response_id,
        r.completed_at AS timestamp,
        q.id AS question_id,
        q.question_text,
        q.question_type,
        a.answer_text
    FROM responses r
    JOIN answers a ON r.id = a.response_id
    JOIN questions q ON a.question_id = q.id
    WHERE q.survey_id = $1
    ORDER BY r.id, q.id
"#;

pub const DELETE_RESPONSE: &str = r#"
    DELETE FROM responses WHERE id = $1 RETURNING id
"#;

// ============================================
// Users
// ============================================

pub const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, survey_count";

pub const FIND_USER_BY_EMAIL: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, survey_count
    FROM users WHERE email = $1
"#;

pub const FIND_USER_BY_ID: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, survey_count
    FROM users WHERE id = $1
"#;

pub const USER_EXISTS: &str = r#"
    SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)
"#;

pub const LIST_USERS: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, survey_count
    FROM users ORDER BY last_name, id
"#;

pub const INSERT_USER: &str = r#"
    INSERT INTO users (email, password_hash, first_name, last_name, survey_count)
    VALUES ($1, $2, $3, $4, 0)
    RETURNING id, email, password_hash, first_name, last_name, survey_count
"#;

pub const DELETE_USER: &str = r#"
    DELETE FROM users WHERE id = $1 RETURNING id
"#;

/// Column assignments for a partial update, with their values in parameter order
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateClause {
    /// `"col_a"=$1, "col_b"=$2`
    pub set_cols: String,
    /// Physical column names, in parameter order
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl UpdateClause {
    /// Placeholder number for the trailing `WHERE id = $N`
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// SQL builder for safe identifier quoting
pub struct SqlBuilder;

impl SqlBuilder {
    /// Quote an identifier (table/column name) safely
    pub fn quote_ident(ident: &str) -> String {
        // PostgreSQL identifier quoting
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Build the SET part of an UPDATE from a sparse field map.
    ///
    /// `column_map` translates field names to column names; unmapped fields
    /// are used as-is. Parameters follow the iteration order of `fields`.
    pub fn partial_update(
        fields: &Map<String, Value>,
        column_map: &[(&str, &str)],
    ) -> Result<UpdateClause, AppError> {
        if fields.is_empty() {
            return Err(bad_request_error("No data"));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut columns = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len());

        for (idx, (field, value)) in fields.iter().enumerate() {
            let column = column_map
                .iter()
                .find(|(name, _)| *name == field.as_str())
                .map(|(_, column)| *column)
                .unwrap_or(field.as_str());
            assignments.push(format!("{}=${}", Self::quote_ident(column), idx + 1));
            columns.push(column.to_string());
            values.push(value.clone());
        }

        Ok(UpdateClause {
            set_cols: assignments.join(", "),
            columns,
            values,
        })
    }

    /// Build `UPDATE <table> SET ... WHERE id = $N RETURNING <returning>`
    pub fn update_by_id(table: &str, clause: &UpdateClause, returning: &str) -> String {
        format!(
            "UPDATE {} SET {} WHERE id = ${} RETURNING {}",
            Self::quote_ident(table),
            clause.set_cols,
            clause.next_placeholder(),
            returning
        )
    }
}
