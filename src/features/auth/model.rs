use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Principal resolved from a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// JWT claims issued by `TokenService`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// Login material of a user. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}
