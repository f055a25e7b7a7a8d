use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a status-change record
#[derive(Debug, Clone, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub unit_id: String,
    pub input_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub updated_by: String,
    pub update_time: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Entry to append; `update_time` is always assigned by the database.
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub unit_id: &'a str,
    pub input_date: Option<DateTime<Utc>>,
    pub status: Option<&'a str>,
    pub sub_status: Option<&'a str>,
    pub updated_by: &'a str,
    pub comment: Option<&'a str>,
}
