#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Username injected by `with_authenticated_user`
#[cfg(test)]
pub const TEST_USERNAME: &str = "test-operator";

#[cfg(test)]
pub fn create_test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        username: TEST_USERNAME.to_string(),
    }
}

#[cfg(test)]
async fn inject_user_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_test_user());
    next.run(request).await
}

#[cfg(test)]
pub fn with_authenticated_user(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_user_middleware))
}

/// Pool that never connects unless a query runs. Used by HTTP tests that must fail
/// validation before touching the database.
#[cfg(test)]
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(250))
        .connect_lazy("postgres://cc:cc@127.0.0.1:1/cc_unused")
        .unwrap()
}
