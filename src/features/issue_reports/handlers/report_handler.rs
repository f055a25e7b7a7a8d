use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::issue_reports::dtos::{
    IssueReportResponseDto, ProcessReportDto, SubmitReport, SubmitReportForm, UploadedImage,
};
use crate::features::issue_reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta};

/// Submit an issue report
///
/// Accepts multipart/form-data with:
/// - `ccm_id`: unit the report refers to (required)
/// - `issue_type`: kind of issue (required)
/// - `issue_description`: free text
/// - `images` / `images[]`: zero or more photos; files that are not png, jpg, jpeg or gif are
///   ignored
#[utoipa::path(
    post,
    path = "/api/report/upload",
    request_body(
        content = SubmitReportForm,
        content_type = "multipart/form-data",
        description = "Report fields and optional photos",
    ),
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<IssueReportResponseDto>),
        (status = 400, description = "Missing ccm_id or issue_type"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn upload_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<IssueReportResponseDto>>)> {
    let mut multipart =
        multipart.map_err(|e| AppError::InvalidInput(format!("Expected multipart form: {}", e)))?;
    let mut report = SubmitReport::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::InvalidInput(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "images" | "images[]" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                match file_name {
                    Some(file_name) => report.images.push(UploadedImage {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    }),
                    None => debug!("Ignoring image part without a file name"),
                }
            }
            "ccm_id" | "unit_id" => report.unit_ref = Some(read_text(field).await?),
            "issue_type" => report.issue_type = Some(read_text(field).await?),
            "issue_description" | "issue_info" => {
                report.issue_info = Some(read_text(field).await?)
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    let created = service.submit(report, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(created),
            Some("Report submitted".to_string()),
            None,
        )),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("").to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read {} field: {}", name, e)))
}

/// List all issue reports, newest first
#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Reports", body = ApiResponse<Vec<IssueReportResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<Vec<IssueReportResponseDto>>>> {
    let reports = service.list_all().await?;
    let total = reports.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(reports),
        None,
        Some(Meta { total }),
    )))
}

/// Record the processing of a report
#[utoipa::path(
    put,
    path = "/api/report/{id}",
    params(("id" = i64, Path, description = "Report id")),
    request_body = ProcessReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<IssueReportResponseDto>),
        (status = 400, description = "Missing status"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn process_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(report_id): Path<i64>,
    AppJson(dto): AppJson<ProcessReportDto>,
) -> Result<Json<ApiResponse<IssueReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let report = service.process(report_id, dto, &user).await?;
    Ok(Json(ApiResponse::success(
        Some(report),
        Some("Report updated".to_string()),
        None,
    )))
}

/// Delete a report and its photos
#[utoipa::path(
    delete,
    path = "/api/report/{id}",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report deleted"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn delete_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(report_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(report_id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Report deleted".to_string()),
        None,
    )))
}
