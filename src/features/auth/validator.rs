use super::model::{AuthenticatedUser, Claims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Validates HS256 access tokens issued by `TokenService`
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if token_data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(AuthenticatedUser {
            username: token_data.claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::services::TokenService;

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let issued = TokenService::new("secret-a", Duration::from_secs(60))
            .issue("bob")
            .unwrap();
        let validator = JwtValidator::new("secret-b", Duration::from_secs(0));

        assert!(matches!(
            validator.validate_token(&issued.access_token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let claims = Claims {
            sub: "bob".to_string(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let validator = JwtValidator::new("secret", Duration::from_secs(60));
        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let validator = JwtValidator::new("secret", Duration::from_secs(0));
        assert!(validator.validate_token("not-a-jwt").is_err());
    }
}
