use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::features::equipment::models::AuditEntry;
use crate::shared::datetime;

/// Response DTO for one audit entry
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntryResponseDto {
    pub id: i64,
    pub unit_id: String,
    #[serde(serialize_with = "datetime::serialize_opt")]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub input_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub updated_by: String,
    #[serde(serialize_with = "datetime::serialize")]
    #[schema(value_type = String, example = "2025-01-01 08:00:00")]
    pub update_time: DateTime<Utc>,
    pub comment: Option<String>,
}

impl From<AuditEntry> for AuditEntryResponseDto {
    fn from(e: AuditEntry) -> Self {
        Self {
            id: e.id,
            unit_id: e.unit_id,
            input_date: e.input_date,
            status: e.status,
            sub_status: e.sub_status,
            updated_by: e.updated_by,
            update_time: e.update_time,
            comment: e.comment,
        }
    }
}
