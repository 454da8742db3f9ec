//! User management module
//!
//! Registration, password authentication and the user directory.

use crate::auth::{hash_password, verify_password};
use crate::db::queries::SqlBuilder;
use crate::error::{bad_request_error, not_found_error, AppError, ApiResult};
use crate::models::{NewUserRecord, RegisterRequest, User};
use crate::store::UserStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// Fields a user may change about themselves
const UPDATABLE_FIELDS: [&str; 4] = ["email", "first_name", "last_name", "password"];

/// Logical field → column names that differ
const USER_COLUMN_MAP: [(&str, &str); 1] = [("password", "password_hash")];

pub struct UserService<S> {
    store: Arc<S>,
    bcrypt_cost: u32,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: Arc<S>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Register a new user with a zero survey count
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<User> {
        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(bad_request_error(format!(
                "Account already registered to email: {}",
                req.email
            )));
        }

        let password_hash = hash_password(&req.password, self.bcrypt_cost)?;
        let record = self
            .store
            .insert_user(NewUserRecord {
                email: req.email.clone(),
                password_hash,
                first_name: req.first_name.clone(),
                last_name: req.last_name.clone(),
            })
            .await?;

        info!("User {} registered", record.id);
        Ok(record.into())
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<User> {
        if let Some(record) = self.store.find_user_by_email(email).await? {
            if verify_password(password, &record.password_hash)? {
                return Ok(record.into());
            }
        }
        Err(AppError::Unauthorized("Email and password do not match".to_string()))
    }

    pub async fn get(&self, id: i32) -> ApiResult<User> {
        self.store
            .find_user_by_id(id)
            .await?
            .map(User::from)
            .ok_or_else(|| not_found_error(format!("No user found with id: {}", id)))
    }

    /// All users ordered by last name
    pub async fn find_all(&self) -> ApiResult<Vec<User>> {
        let records = self.store.list_users().await?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Apply a partial update; a new password is hashed before it is stored.
    pub async fn update(&self, id: i32, mut fields: Map<String, Value>) -> ApiResult<User> {
        for (name, value) in &fields {
            if !UPDATABLE_FIELDS.contains(&name.as_str()) {
                return Err(bad_request_error(format!("Field cannot be updated: {}", name)));
            }
            if !value.is_string() {
                return Err(bad_request_error(format!("Field must be a string: {}", name)));
            }
        }

        if let Some(Value::String(password)) = fields.get_mut("password") {
            *password = hash_password(password, self.bcrypt_cost)?;
        }

        let clause = SqlBuilder::partial_update(&fields, &USER_COLUMN_MAP)?;
        let record = self
            .store
            .update_user(id, &clause)
            .await?
            .ok_or_else(|| not_found_error(format!("No user found with id: {}", id)))?;

        info!("User {} updated ({})", id, clause.columns.join(", "));
        Ok(record.into())
    }

    pub async fn remove(&self, id: i32) -> ApiResult<()> {
        if !self.store.delete_user(id).await? {
            return Err(not_found_error(format!("No user found with id: {}", id)));
        }
        info!("User {} removed", id);
        Ok(())
    }
}
