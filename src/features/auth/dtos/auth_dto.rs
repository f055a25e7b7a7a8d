use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::USERNAME_REGEX;

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "Username must be 1-50 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits and underscores"
        )
    )]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO carrying only a username (verify / forgot password)
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UsernameRequestDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
}

/// Request DTO for the unauthenticated password reset
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordNoAuthDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Request DTO for resetting another user's password while logged in
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Target username is required"))]
    pub target_username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Response DTO for login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    pub username: String,
}

/// Response DTO for /api/auth/me
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_requires_both_fields() {
        let dto: RegisterRequestDto = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
        assert!(dto.validate().is_err());

        let dto: RegisterRequestDto =
            serde_json::from_str(r#"{"username": "alice", "password": "pw"}"#).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_register_rejects_bad_username() {
        let dto = RegisterRequestDto {
            username: "9lives".to_string(),
            password: "pw".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = RegisterRequestDto {
            username: "a".repeat(51),
            password: "pw".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
