//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the stored records, join rows, nested read models and the
//! request/response structures used by the API.

pub mod response;
pub mod survey;
pub mod user;

// Re-export commonly used types
pub use response::*;
pub use survey::*;
pub use user::*;
