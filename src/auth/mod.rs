//! Authentication and authorization module
//!
//! Provides bcrypt password hashing, JWT issuing and the correct-user guard.

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_token, decode_token, Claims};
pub use middleware::{auth_middleware, ensure_correct_user, MaybeClaims};
pub use password::{hash_password, verify_password};
