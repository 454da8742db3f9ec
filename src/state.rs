//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::AuthConfig;
use crate::db::PgStore;
use crate::response::ResponseService;
use crate::survey::SurveyService;
use crate::users::UserService;
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub users: UserService<PgStore>,
    pub surveys: SurveyService<PgStore>,
    pub responses: ResponseService<PgStore>,

    /// Token signing and password hashing settings
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(pool: Pool, auth: AuthConfig) -> Self {
        let store = Arc::new(PgStore::new(pool));

        Self {
            users: UserService::new(Arc::clone(&store), auth.bcrypt_cost),
            surveys: SurveyService::new(Arc::clone(&store)),
            responses: ResponseService::new(store),
            auth,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
