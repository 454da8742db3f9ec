//! JWT token management
//!
//! Handles creation and validation of session tokens.

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub user_id: i32,
    pub first_name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Sign a token for a user
pub fn create_token(user: &User, config: &AuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user.id,
        first_name: user.first_name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => {
            AppError::Unauthorized("Invalid token".to_string())
        }
        _ => AppError::Unauthorized(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn user() -> User {
        User {
            id: 7,
            email: "u1@test.com".into(),
            first_name: "U1F".into(),
            last_name: "U1L".into(),
            survey_count: 0,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = AuthConfig::for_tests();
        let token = create_token(&user(), &config).unwrap();

        let claims = assert_ok!(decode_token(&token, &config.secret_key));
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.first_name, "U1F");
        assert_eq!(claims.exp - claims.iat, config.token_ttl_hours * 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = create_token(&user(), &AuthConfig::for_tests()).unwrap();
        let err = decode_token(&token, "another-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token() {
        let config = AuthConfig {
            token_ttl_hours: -2,
            ..AuthConfig::for_tests()
        };
        let token = create_token(&user(), &config).unwrap();
        let err = decode_token(&token, &config.secret_key).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Token expired"));
    }
}
