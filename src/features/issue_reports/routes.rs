use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::issue_reports::handlers;
use crate::features::issue_reports::services::ReportService;

/// Issue report routes; all of them expect an authenticated user
pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/report/upload", post(handlers::upload_report))
        .route("/api/reports", get(handlers::list_reports))
        .route(
            "/api/report/{id}",
            put(handlers::process_report).delete(handlers::delete_report),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::LocalBlobStore;
    use crate::shared::test_helpers::{lazy_pool, with_authenticated_user};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    async fn server() -> (TestServer, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("cc-report-routes-{}", Uuid::new_v4()));
        let store = LocalBlobStore::new(root.clone(), "/static/uploads")
            .await
            .unwrap();
        let service = Arc::new(ReportService::new(lazy_pool(), Arc::new(store)));
        let server = TestServer::new(with_authenticated_user(routes(service))).unwrap();
        (server, root)
    }

    #[tokio::test]
    async fn test_upload_without_issue_type_is_bad_request() {
        let (server, root) = server().await;

        let form = MultipartForm::new().add_text("ccm_id", "BOX-1").add_part(
            "images",
            Part::bytes(b"not really a png".to_vec())
                .file_name("photo.png")
                .mime_type("image/png"),
        );
        let response = server.post("/api/report/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "invalid_input");
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_with_overlong_unit_id_is_bad_request() {
        let (server, root) = server().await;

        let form = MultipartForm::new()
            .add_text("ccm_id", "B".repeat(51))
            .add_text("issue_type", "damaged")
            .add_part(
                "images[]",
                Part::bytes(b"gif bytes".to_vec())
                    .file_name("photo.gif")
                    .mime_type("image/gif"),
            );
        let response = server.post("/api/report/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "invalid_input");
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_requires_multipart_body() {
        let (server, _) = server().await;

        let response = server
            .post("/api/report/upload")
            .json(&json!({"ccm_id": "BOX-1", "issue_type": "damaged"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_process_without_status_is_bad_request() {
        let (server, _) = server().await;

        let response = server
            .put("/api/report/3")
            .json(&json!({"process_notes": "looked at it"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
