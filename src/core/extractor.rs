use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::{request::Parts, StatusCode},
};

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        // Bodies over DefaultBodyLimit surface as a buffering failure with status 413
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge("Request body exceeds the configured limit".to_string());
        }

        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::InvalidInput(
                "Expected a JSON body with Content-Type: application/json".to_string(),
            ),
            JsonRejection::JsonSyntaxError(err) => {
                AppError::InvalidInput(format!("Malformed JSON: {}", err.body_text()))
            }
            JsonRejection::JsonDataError(err) => {
                AppError::InvalidInput(format!("Invalid request body: {}", err.body_text()))
            }
            other => {
                tracing::debug!("Unreadable request body: {}", other.body_text());
                AppError::InvalidInput("Request body could not be read".to_string())
            }
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Reads the user placed on the request by `auth_middleware`
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::DefaultBodyLimit, routing::post, Router};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn echo(AppJson(body): AppJson<Value>) -> String {
        body.to_string()
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/echo", post(echo))
            .layer(DefaultBodyLimit::max(64));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let response = server()
            .post("/echo")
            .json(&json!({"comment": "x".repeat(200)}))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(body["code"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_invalid_input() {
        let response = server().post("/echo").text("{}").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "invalid_input");
    }

    #[tokio::test]
    async fn test_small_json_body_passes_through() {
        let response = server().post("/echo").json(&json!({"a": 1})).await;
        response.assert_status_ok();
        response.assert_text(r#"{"a":1}"#);
    }
}
