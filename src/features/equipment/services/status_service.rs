use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::equipment::dtos::StatusCountsDto;
use crate::shared::constants::UNKNOWN_STATUS;

/// Aggregates the current status of every unit
pub struct StatusService {
    pool: PgPool,
}

impl StatusService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count units per current status. The current entry is the one the unit points at, which
    /// is the highest id among entries sharing the latest update time. Units without entries
    /// are not counted; entries without a status count as `unknown`.
    pub async fn status_counts(&self) -> Result<StatusCountsDto> {
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(
            r#"
            SELECT a.status, COUNT(*) AS count
            FROM equipment_units u
            JOIN audit_entries a ON a.id = u.current_entry_id
            GROUP BY a.status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count statuses: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(StatusCountsDto::from_rows(rows.into_iter().map(|(status, count)| {
            (status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()), count)
        })))
    }
}
