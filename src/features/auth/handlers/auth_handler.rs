use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, MeResponseDto, RegisterRequestDto, ResetPasswordDto,
    ResetPasswordNoAuthDto, UsernameRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully"),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<()>>)> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            None,
            Some("Account registered successfully".to_string()),
            None,
        )),
    ))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let auth_response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(auth_response),
        Some("Login successful".to_string()),
        None,
    )))
}

/// Check whether a username exists
#[utoipa::path(
    post,
    path = "/api/auth/verify_username",
    request_body = UsernameRequestDto,
    responses(
        (status = 200, description = "Username exists"),
        (status = 404, description = "User does not exist")
    ),
    tag = "auth"
)]
pub async fn verify_username(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UsernameRequestDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    service.verify_username(&dto.username).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Username exists".to_string()),
        None,
    )))
}

/// Request password reset instructions
#[utoipa::path(
    post,
    path = "/api/auth/forgot_password",
    request_body = UsernameRequestDto,
    responses(
        (status = 200, description = "Instructions sent"),
        (status = 404, description = "User does not exist")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UsernameRequestDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let message = service.forgot_password(&dto.username).await?;
    Ok(Json(ApiResponse::success(None, Some(message), None)))
}

/// Reset a password without logging in (disabled unless configured)
#[utoipa::path(
    post,
    path = "/api/auth/reset_password_no_auth",
    request_body = ResetPasswordNoAuthDto,
    responses(
        (status = 200, description = "Password reset"),
        (status = 403, description = "Unauthenticated reset disabled"),
        (status = 404, description = "User does not exist")
    ),
    tag = "auth"
)]
pub async fn reset_password_no_auth(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ResetPasswordNoAuthDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    service
        .reset_password_no_auth(&dto.username, dto.new_password)
        .await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("Password of {} has been reset", dto.username)),
        None,
    )))
}

/// Reset the password of a user
#[utoipa::path(
    put,
    path = "/api/reset_password",
    request_body = ResetPasswordDto,
    responses(
        (status = 200, description = "Password reset"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User does not exist")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reset_password(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ResetPasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    service
        .reset_password(&user, &dto.target_username, dto.new_password)
        .await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("Password of {} has been reset", dto.target_username)),
        None,
    )))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<MeResponseDto>>> {
    Ok(Json(ApiResponse::success(
        Some(service.current_user(user)),
        None,
        None,
    )))
}
