//! User models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// User record from database
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub survey_count: i32,
}

/// User data safe to send to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub survey_count: i32,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            survey_count: record.survey_count,
        }
    }
}

/// Row to insert for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request to register a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"), length(max = 255))]
    pub email: String,

    #[validate(length(min = 5, max = 72, message = "Password must be between 5 and 72 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 30, message = "First name must be between 1 and 30 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name must be between 1 and 30 characters"))]
    pub last_name: String,
}

/// Request to login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial update of a user
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub last_name: Option<String>,

    #[validate(length(min = 5, max = 72))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Present fields as an ordered field map
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        let entries = [
            ("email", self.email),
            ("first_name", self.first_name),
            ("last_name", self.last_name),
            ("password", self.password),
        ];
        for (name, value) in entries {
            if let Some(value) = value {
                fields.insert(name.to_string(), Value::String(value));
            }
        }
        fields
    }
}
