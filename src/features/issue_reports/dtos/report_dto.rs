use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::issue_reports::models::IssueReport;
use crate::shared::datetime;

/// Multipart form accepted by `POST /api/report/upload`.
/// Documentation only; the handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitReportForm {
    /// Unit the report refers to
    #[schema(example = "BOX-1")]
    pub ccm_id: String,
    #[schema(example = "damaged")]
    pub issue_type: String,
    pub issue_description: Option<String>,
    /// Photo (png, jpg, jpeg, gif); repeat the field for several. Other files are ignored and
    /// `images[]` is accepted as the field name too.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub images: Option<String>,
}

/// One uploaded file as read from the multipart body
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Report submission after multipart parsing
#[derive(Debug, Clone, Default)]
pub struct SubmitReport {
    pub unit_ref: Option<String>,
    pub issue_type: Option<String>,
    pub issue_info: Option<String>,
    pub images: Vec<UploadedImage>,
}

/// Request DTO for processing a report
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProcessReportDto {
    #[serde(default)]
    #[validate(length(max = 20, message = "status must be at most 20 characters"))]
    #[schema(example = "processed")]
    pub status: Option<String>,

    #[serde(default)]
    pub process_notes: Option<String>,
}

/// Response DTO for an issue report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueReportResponseDto {
    pub id: i64,
    pub unit_ref: String,
    pub reporter: String,
    #[serde(serialize_with = "datetime::serialize")]
    #[schema(value_type = String, example = "2025-01-01 08:00:00")]
    pub report_time: DateTime<Utc>,
    pub issue_type: String,
    pub issue_info: Option<String>,
    pub image_paths: Vec<String>,
    pub status: String,
    pub processer: Option<String>,
    #[serde(serialize_with = "datetime::serialize_opt")]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub process_time: Option<DateTime<Utc>>,
    pub process_notes: Option<String>,
}

impl From<IssueReport> for IssueReportResponseDto {
    fn from(r: IssueReport) -> Self {
        Self {
            image_paths: decode_image_paths(r.image_paths.as_deref()),
            id: r.id,
            unit_ref: r.unit_ref,
            reporter: r.reporter,
            report_time: r.report_time,
            issue_type: r.issue_type,
            issue_info: r.issue_info,
            status: r.status,
            processer: r.processer,
            process_time: r.process_time,
            process_notes: r.process_notes,
        }
    }
}

/// JSON array text for storage, or `None` when there are no paths
pub fn encode_image_paths(paths: &[String]) -> Option<String> {
    if paths.is_empty() {
        return None;
    }
    serde_json::to_string(paths).ok()
}

/// Reads the stored column. A value that is not a JSON array is treated as a single path.
pub fn decode_image_paths(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str::<Vec<String>>(raw)
            .unwrap_or_else(|_| vec![raw.to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_image_paths() {
        assert_eq!(encode_image_paths(&[]), None);
        assert_eq!(
            encode_image_paths(&["/static/uploads/a.png".to_string()]).as_deref(),
            Some(r#"["/static/uploads/a.png"]"#)
        );
    }

    #[test]
    fn test_decode_image_paths() {
        assert!(decode_image_paths(None).is_empty());
        assert!(decode_image_paths(Some("  ")).is_empty());
        assert_eq!(
            decode_image_paths(Some(r#"["/a.png", "/b.gif"]"#)),
            vec!["/a.png", "/b.gif"]
        );
        // Rows written before paths were JSON-encoded
        assert_eq!(
            decode_image_paths(Some("/static/uploads/old.jpg")),
            vec!["/static/uploads/old.jpg"]
        );
    }

    #[test]
    fn test_response_dto_formats_report() {
        let report = IssueReport {
            id: 7,
            unit_ref: "BOX-1".to_string(),
            reporter: "alice".to_string(),
            report_time: Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap(),
            issue_type: "damaged".to_string(),
            issue_info: None,
            image_paths: Some(r#"["/static/uploads/x.png"]"#.to_string()),
            status: "pending".to_string(),
            processer: None,
            process_time: None,
            process_notes: None,
        };

        let json = serde_json::to_value(IssueReportResponseDto::from(report)).unwrap();
        assert_eq!(json["report_time"], "2025-05-06 07:08:09");
        assert_eq!(json["image_paths"][0], "/static/uploads/x.png");
        assert!(json["process_time"].is_null());
    }
}
