use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, MeResponseDto, RegisterRequestDto,
};
use crate::features::auth::model::{AuthenticatedUser, Credential};
use crate::features::auth::services::password::{hash_password, verify_password};
use crate::features::auth::services::token_service::TokenService;
use std::sync::Arc;

/// Credential store backed by the `users` table
pub struct AuthService {
    pool: PgPool,
    token_service: Arc<TokenService>,
    allow_unauthenticated_reset: bool,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        token_service: Arc<TokenService>,
        allow_unauthenticated_reset: bool,
    ) -> Self {
        Self {
            pool,
            token_service,
            allow_unauthenticated_reset,
        }
    }

    /// Register a new user. Fails with `Conflict` if the username is taken; the existing
    /// credential is left untouched.
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<()> {
        let password_hash = hash_password(dto.password).await?;

        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind(&dto.username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_db_with_conflict(e, "Username already exists"))?;

        tracing::info!("Registered user: {}", dto.username);
        Ok(())
    }

    /// Verify username/password and issue an access token
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let credential = self.find_credential(&dto.username).await?;

        // Same message for unknown user and wrong password
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());
        let credential = credential.ok_or_else(invalid)?;

        if !verify_password(dto.password, credential.password_hash).await? {
            tracing::info!("Failed login for user: {}", credential.username);
            return Err(invalid());
        }

        let token = self.token_service.issue(&credential.username)?;
        tracing::info!("User logged in: {}", credential.username);

        Ok(AuthResponseDto {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            username: credential.username,
        })
    }

    pub async fn verify_username(&self, username: &str) -> Result<()> {
        if self.username_exists(username).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User does not exist".to_string()))
        }
    }

    /// No mail delivery is configured; only confirms the account exists.
    pub async fn forgot_password(&self, username: &str) -> Result<String> {
        self.verify_username(username).await?;
        tracing::info!("Password reset requested for user: {}", username);
        Ok("Password reset instructions have been sent to the registered mailbox".to_string())
    }

    pub async fn reset_password(
        &self,
        actor: &AuthenticatedUser,
        target_username: &str,
        new_password: String,
    ) -> Result<()> {
        self.set_password(target_username, new_password).await?;
        tracing::info!(
            "Password of {} reset by {}",
            target_username,
            actor.username
        );
        Ok(())
    }

    pub async fn reset_password_no_auth(&self, username: &str, new_password: String) -> Result<()> {
        if !self.allow_unauthenticated_reset {
            return Err(AppError::Forbidden(
                "Unauthenticated password reset is disabled".to_string(),
            ));
        }

        self.set_password(username, new_password).await?;
        tracing::warn!("Password of {} reset without authentication", username);
        Ok(())
    }

    pub fn current_user(&self, user: AuthenticatedUser) -> MeResponseDto {
        MeResponseDto {
            username: user.username,
        }
    }

    async fn set_password(&self, username: &str, new_password: String) -> Result<()> {
        let password_hash = hash_password(new_password).await?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE username = $2",
        )
        .bind(&password_hash)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to reset password: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User does not exist".to_string()));
        }
        Ok(())
    }

    async fn find_credential(&self, username: &str) -> Result<Option<Credential>> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load credential: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
