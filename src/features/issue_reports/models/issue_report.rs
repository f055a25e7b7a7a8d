use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for an issue report. `image_paths` holds a JSON array of blob paths.
#[derive(Debug, Clone, FromRow)]
pub struct IssueReport {
    pub id: i64,
    pub unit_ref: String,
    pub reporter: String,
    pub report_time: DateTime<Utc>,
    pub issue_type: String,
    pub issue_info: Option<String>,
    pub image_paths: Option<String>,
    pub status: String,
    pub processer: Option<String>,
    pub process_time: Option<DateTime<Utc>>,
    pub process_notes: Option<String>,
}
