use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A unit joined with its current audit entry. The status columns are `None` when the unit
/// has no entries.
#[derive(Debug, Clone, FromRow)]
pub struct EquipmentState {
    pub unit_id: String,
    pub size: Option<String>,
    pub box_id: Option<String>,
    pub assigned_user: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub update_count: i32,
    pub input_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub comment: Option<String>,
    pub updated_by: Option<String>,
    pub update_time: Option<DateTime<Utc>>,
}
