use crate::core::error::{AppError, Result};
use crate::features::auth::model::Claims;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::time::Duration;

/// Access token handed back to the client on login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issues HS256 access tokens whose subject is the username
pub struct TokenService {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, username: &str) -> Result<IssuedToken> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign access token: {}", e);
            AppError::Internal(format!("Failed to sign access token: {}", e))
        })?;

        tracing::debug!(
            "Issued access token for {}, expires in {} seconds",
            username,
            self.ttl.as_secs()
        );

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.as_secs() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::JwtValidator;

    #[test]
    fn test_issued_token_validates_to_same_user() {
        let service = TokenService::new("issue-secret", Duration::from_secs(3600));
        let issued = service.issue("operator_1").unwrap();

        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let user = JwtValidator::new("issue-secret", Duration::from_secs(0))
            .validate_token(&issued.access_token)
            .unwrap();
        assert_eq!(user.username, "operator_1");
    }
}
