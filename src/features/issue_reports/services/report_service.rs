use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::issue_reports::dtos::{
    decode_image_paths, encode_image_paths, IssueReportResponseDto, ProcessReportDto,
    SubmitReport,
};
use crate::features::issue_reports::models::IssueReport;
use crate::features::issue_reports::services::image_files::{
    accepted_images, content_type_for, stored_file_name,
};
use crate::modules::storage::BlobStore;
use crate::shared::constants::{MAX_LABEL_LEN, REPORT_STATUS_PENDING};
use crate::shared::validation::non_blank;

const REPORT_COLUMNS: &str = r#"
    id, unit_ref, reporter, report_time, issue_type, issue_info, image_paths,
    status, processer, process_time, process_notes
"#;

/// Ledger of issue reports and their photos
pub struct ReportService {
    pool: PgPool,
    blobs: Arc<dyn BlobStore>,
}

impl ReportService {
    pub fn new(pool: PgPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self { pool, blobs }
    }

    /// File a new report in `pending` state.
    ///
    /// Photos are written to the blob store before the row. If anything fails afterwards the
    /// photos already written are removed again, best effort.
    pub async fn submit(
        &self,
        report: SubmitReport,
        actor: &AuthenticatedUser,
    ) -> Result<IssueReportResponseDto> {
        let (Some(unit_ref), Some(issue_type)) = (
            non_blank(report.unit_ref.as_deref()),
            non_blank(report.issue_type.as_deref()),
        ) else {
            return Err(AppError::InvalidInput(
                "ccm_id and issue_type are required".to_string(),
            ));
        };
        for (field, value) in [("ccm_id", unit_ref), ("issue_type", issue_type)] {
            if value.chars().count() > MAX_LABEL_LEN {
                return Err(AppError::InvalidInput(format!(
                    "{} must be at most {} characters",
                    field, MAX_LABEL_LEN
                )));
            }
        }

        let mut stored = Vec::new();
        for image in accepted_images(report.images) {
            let Some(name) = stored_file_name(&image.file_name, Utc::now()) else {
                continue;
            };
            let content_type = image
                .content_type
                .unwrap_or_else(|| content_type_for(&image.file_name).to_string());

            match self.blobs.put(&name, image.data, &content_type).await {
                Ok(path) => stored.push(path),
                Err(e) => {
                    tracing::error!("Failed to store report image '{}': {}", name, e);
                    self.remove_blobs(&stored).await;
                    return Err(e);
                }
            }
        }

        let inserted = sqlx::query_as::<_, IssueReport>(&format!(
            r#"
            INSERT INTO issue_reports
                (unit_ref, reporter, report_time, issue_type, issue_info, image_paths, status)
            VALUES ($1, $2, NOW(), $3, $4, $5, $6)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(unit_ref)
        .bind(&actor.username)
        .bind(issue_type)
        .bind(non_blank(report.issue_info.as_deref()))
        .bind(encode_image_paths(&stored))
        .bind(REPORT_STATUS_PENDING)
        .fetch_one(&self.pool)
        .await;

        let report = match inserted {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Failed to insert issue report: {:?}", e);
                self.remove_blobs(&stored).await;
                return Err(AppError::Database(e));
            }
        };

        tracing::info!(
            "Issue report {} on {} submitted by {} with {} image(s)",
            report.id,
            report.unit_ref,
            actor.username,
            stored.len()
        );
        Ok(report.into())
    }

    /// All reports, newest first
    pub async fn list_all(&self) -> Result<Vec<IssueReportResponseDto>> {
        let reports = sqlx::query_as::<_, IssueReport>(&format!(
            "SELECT {} FROM issue_reports ORDER BY report_time DESC, id DESC",
            REPORT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list issue reports: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(reports.into_iter().map(IssueReportResponseDto::from).collect())
    }

    /// Set status, processer, notes and process time in one statement
    pub async fn process(
        &self,
        report_id: i64,
        dto: ProcessReportDto,
        actor: &AuthenticatedUser,
    ) -> Result<IssueReportResponseDto> {
        let status = non_blank(dto.status.as_deref())
            .ok_or_else(|| AppError::InvalidInput("status is required".to_string()))?;

        let report = sqlx::query_as::<_, IssueReport>(&format!(
            r#"
            UPDATE issue_reports
            SET status = $1, processer = $2, process_notes = $3, process_time = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(status)
        .bind(&actor.username)
        .bind(&dto.process_notes)
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to process issue report {}: {:?}", report_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| not_found(report_id))?;

        tracing::info!(
            "Issue report {} set to '{}' by {}",
            report_id,
            status,
            actor.username
        );
        Ok(report.into())
    }

    /// Delete a report. Its photos are removed afterwards; failures there are logged and do
    /// not undo the deletion.
    pub async fn delete(&self, report_id: i64, actor: &AuthenticatedUser) -> Result<()> {
        let image_paths = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM issue_reports WHERE id = $1 RETURNING image_paths",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete issue report {}: {:?}", report_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| not_found(report_id))?;

        self.remove_blobs(&decode_image_paths(image_paths.as_deref()))
            .await;

        tracing::info!("Issue report {} deleted by {}", report_id, actor.username);
        Ok(())
    }

    async fn remove_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.blobs.delete(path).await {
                tracing::warn!("Could not delete report image '{}': {}", path, e);
            }
        }
    }
}

fn not_found(report_id: i64) -> AppError {
    AppError::NotFound(format!("Issue report {} not found", report_id))
}
