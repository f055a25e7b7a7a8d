use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

use crate::features::equipment::models::EquipmentState;
use crate::shared::datetime;
use crate::shared::validation::non_blank;

/// Request DTO for registering a unit. Upper-case keys of the legacy client are accepted as
/// aliases.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateEquipmentDto {
    #[serde(default, alias = "CCM_ID")]
    #[validate(length(max = 50, message = "unit_id must be at most 50 characters"))]
    pub unit_id: Option<String>,

    #[serde(default, alias = "CC_SIZE")]
    #[validate(length(max = 20, message = "size must be at most 20 characters"))]
    pub size: Option<String>,

    #[serde(default, alias = "BOX_ID")]
    #[validate(length(max = 50, message = "box_id must be at most 50 characters"))]
    pub box_id: Option<String>,

    #[serde(default, alias = "USER_NAME")]
    #[validate(length(max = 50, message = "assigned_user must be at most 50 characters"))]
    pub assigned_user: Option<String>,

    /// Also recorded as the input date of the initial audit entry
    #[serde(
        default,
        alias = "CC_STARTTIME",
        deserialize_with = "datetime::deserialize_opt"
    )]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, alias = "CC_STATUS")]
    #[validate(length(max = 50, message = "status must be at most 50 characters"))]
    pub status: Option<String>,

    #[serde(default, alias = "CC_SUBSTATUS")]
    #[validate(length(max = 50, message = "sub_status must be at most 50 characters"))]
    pub sub_status: Option<String>,

    #[serde(default, alias = "COMMENT")]
    pub comment: Option<String>,
}

/// Request DTO for updating a unit. `start_time` and `status` are required.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipmentDto {
    #[serde(default, alias = "CC_SIZE")]
    #[validate(length(max = 20, message = "size must be at most 20 characters"))]
    pub size: Option<String>,

    #[serde(default, alias = "BOX_ID")]
    #[validate(length(max = 50, message = "box_id must be at most 50 characters"))]
    pub box_id: Option<String>,

    #[serde(default, alias = "USER_NAME")]
    #[validate(length(max = 50, message = "assigned_user must be at most 50 characters"))]
    pub assigned_user: Option<String>,

    #[serde(
        default,
        alias = "CC_STARTTIME",
        deserialize_with = "datetime::deserialize_opt"
    )]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, alias = "CC_STATUS")]
    #[validate(length(max = 50, message = "status must be at most 50 characters"))]
    pub status: Option<String>,

    #[serde(default, alias = "CC_SUBSTATUS")]
    #[validate(length(max = 50, message = "sub_status must be at most 50 characters"))]
    pub sub_status: Option<String>,

    #[serde(default, alias = "COMMENT")]
    pub comment: Option<String>,
}

/// One element of a batch status update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BatchUpdateItemDto {
    #[serde(default, alias = "CCM_ID")]
    #[validate(length(max = 50, message = "unit_id must be at most 50 characters"))]
    pub unit_id: Option<String>,

    #[serde(default, alias = "CC_STATUS")]
    #[validate(length(max = 50, message = "status must be at most 50 characters"))]
    pub status: Option<String>,

    #[serde(default, alias = "CC_SUBSTATUS")]
    #[validate(length(max = 50, message = "sub_status must be at most 50 characters"))]
    pub sub_status: Option<String>,

    #[serde(default, alias = "COMMENT")]
    pub comment: Option<String>,
}

/// A batch item that passed normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdateItem {
    pub unit_id: String,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub comment: Option<String>,
}

impl BatchUpdateItemDto {
    /// Returns `None` for items that must be skipped: no unit id, or none of status,
    /// sub-status and comment. A missing sub-status falls back to the status.
    pub fn normalize(&self) -> Option<BatchUpdateItem> {
        let unit_id = non_blank(self.unit_id.as_deref())?;
        let status = non_blank(self.status.as_deref());
        let sub_status = non_blank(self.sub_status.as_deref());
        let comment = non_blank(self.comment.as_deref());

        if status.is_none() && sub_status.is_none() && comment.is_none() {
            return None;
        }

        Some(BatchUpdateItem {
            unit_id: unit_id.to_string(),
            status: status.map(str::to_string),
            sub_status: sub_status.or(status).map(str::to_string),
            comment: comment.map(str::to_string),
        })
    }
}

/// Response DTO for a unit and its current status
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentResponseDto {
    pub unit_id: String,
    pub size: Option<String>,
    pub box_id: Option<String>,
    pub assigned_user: Option<String>,
    #[serde(serialize_with = "datetime::serialize_opt")]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub start_time: Option<DateTime<Utc>>,
    pub update_count: i32,
    #[serde(serialize_with = "datetime::serialize_opt")]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub input_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub comment: Option<String>,
    pub updated_by: Option<String>,
    #[serde(serialize_with = "datetime::serialize_opt")]
    #[schema(value_type = Option<String>, example = "2025-01-01 08:00:00")]
    pub update_time: Option<DateTime<Utc>>,
}

impl From<EquipmentState> for EquipmentResponseDto {
    fn from(s: EquipmentState) -> Self {
        Self {
            unit_id: s.unit_id,
            size: s.size,
            box_id: s.box_id,
            assigned_user: s.assigned_user,
            start_time: s.start_time,
            update_count: s.update_count.max(0),
            input_date: s.input_date,
            status: s.status,
            sub_status: s.sub_status,
            comment: s.comment,
            updated_by: s.updated_by,
            update_time: s.update_time,
        }
    }
}

/// Response DTO for a batch update
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchUpdateResponseDto {
    pub updated_count: usize,
    pub updated_ids: Vec<String>,
}

/// Current status distribution.
///
/// The flat status to count mapping sits under `counts`; `total` is their sum.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCountsDto {
    /// Status of each unit's current entry mapped to the number of units in it. Entries without
    /// a status are counted under `unknown`.
    #[schema(example = json!({"in-service": 12, "in-repair": 3, "unknown": 1}))]
    pub counts: BTreeMap<String, i64>,
    /// Number of units with at least one audit entry
    #[schema(example = 16)]
    pub total: i64,
}

impl StatusCountsDto {
    /// Rows with the same status are merged.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut counts = BTreeMap::new();
        for (status, count) in rows {
            *counts.entry(status).or_insert(0) += count;
        }
        let total = counts.values().sum();
        Self { counts, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(unit_id: Option<&str>, status: Option<&str>, sub_status: Option<&str>) -> BatchUpdateItemDto {
        BatchUpdateItemDto {
            unit_id: unit_id.map(String::from),
            status: status.map(String::from),
            sub_status: sub_status.map(String::from),
            comment: None,
        }
    }

    #[test]
    fn test_batch_item_without_unit_id_is_skipped() {
        assert!(item(None, Some("in-service"), None).normalize().is_none());
        assert!(item(Some("   "), Some("in-service"), None).normalize().is_none());
    }

    #[test]
    fn test_batch_item_without_changes_is_skipped() {
        assert!(item(Some("BOX-1"), None, None).normalize().is_none());
        assert!(item(Some("BOX-1"), Some(""), Some(" ")).normalize().is_none());
    }

    #[test]
    fn test_batch_item_sub_status_defaults_to_status() {
        let normalized = item(Some(" BOX-1 "), Some("in-repair"), None)
            .normalize()
            .unwrap();
        assert_eq!(normalized.unit_id, "BOX-1");
        assert_eq!(normalized.sub_status.as_deref(), Some("in-repair"));

        let explicit = item(Some("BOX-1"), Some("in-repair"), Some("waiting-parts"))
            .normalize()
            .unwrap();
        assert_eq!(explicit.sub_status.as_deref(), Some("waiting-parts"));
    }

    #[test]
    fn test_batch_item_with_comment_only() {
        let dto = BatchUpdateItemDto {
            unit_id: Some("BOX-2".to_string()),
            comment: Some("strap frayed".to_string()),
            ..Default::default()
        };
        let normalized = dto.normalize().unwrap();
        assert_eq!(normalized.status, None);
        assert_eq!(normalized.sub_status, None);
        assert_eq!(normalized.comment.as_deref(), Some("strap frayed"));
    }

    #[test]
    fn test_create_dto_accepts_legacy_keys() {
        let dto: CreateEquipmentDto = serde_json::from_str(
            r#"{"CCM_ID": "BOX-1", "CC_SIZE": "L", "CC_STARTTIME": "2025-01-02 08:30", "CC_STATUS": "in-service"}"#,
        )
        .unwrap();
        assert_eq!(dto.unit_id.as_deref(), Some("BOX-1"));
        assert_eq!(dto.size.as_deref(), Some("L"));
        assert_eq!(
            dto.start_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap())
        );
        assert_eq!(dto.status.as_deref(), Some("in-service"));
    }

    #[test]
    fn test_create_dto_rejects_long_unit_id() {
        let dto = CreateEquipmentDto {
            unit_id: Some("X".repeat(51)),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_response_formats_timestamps_and_clamps_counter() {
        let state = EquipmentState {
            unit_id: "BOX-1".to_string(),
            size: None,
            box_id: None,
            assigned_user: None,
            start_time: Some(Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap()),
            update_count: -3,
            input_date: None,
            status: None,
            sub_status: None,
            comment: None,
            updated_by: None,
            update_time: None,
        };
        let json = serde_json::to_value(EquipmentResponseDto::from(state)).unwrap();
        assert_eq!(json["start_time"], "2025-01-02 08:30:00");
        assert_eq!(json["update_count"], 0);
        assert!(json["status"].is_null());
    }

    #[test]
    fn test_status_counts_total() {
        let dto = StatusCountsDto::from_rows(vec![
            ("in-service".to_string(), 3),
            ("unknown".to_string(), 1),
            ("unknown".to_string(), 2),
        ]);
        assert_eq!(dto.total, 6);
        assert_eq!(dto.counts["in-service"], 3);
        assert_eq!(dto.counts["unknown"], 3);
    }
}
