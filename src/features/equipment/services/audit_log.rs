//! Append-only audit log of status changes.
//!
//! `append` must run inside the unit of work that mutates the owning unit so the entry and the
//! unit's `current_entry_id` pointer commit together.

use sqlx::{PgConnection, PgExecutor};

use crate::core::error::{AppError, Result};
use crate::features::equipment::models::{AuditEntry, NewAuditEntry};

/// Insert an entry and make it the unit's current one. Returns the new entry id.
pub async fn append(conn: &mut PgConnection, entry: &NewAuditEntry<'_>) -> Result<i64> {
    // clock_timestamp() rather than NOW(): entries appended later in the same transaction
    // must not sort before earlier ones.
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO audit_entries
            (unit_id, input_date, status, sub_status, updated_by, update_time, comment)
        VALUES ($1, $2, $3, $4, $5, clock_timestamp(), $6)
        RETURNING id
        "#,
    )
    .bind(entry.unit_id)
    .bind(entry.input_date)
    .bind(entry.status)
    .bind(entry.sub_status)
    .bind(entry.updated_by)
    .bind(entry.comment)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to append audit entry for {}: {:?}", entry.unit_id, e);
        AppError::Database(e)
    })?;

    sqlx::query("UPDATE equipment_units SET current_entry_id = $1 WHERE unit_id = $2")
        .bind(id)
        .bind(entry.unit_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to move current entry of {}: {:?}", entry.unit_id, e);
            AppError::Database(e)
        })?;

    tracing::debug!(
        "Appended audit entry {} for {} (status: {:?})",
        id,
        entry.unit_id,
        entry.status
    );
    Ok(id)
}

/// Entries of a unit, newest first. Unknown units simply have no history.
pub async fn history_of<'e, E>(executor: E, unit_id: &str) -> Result<Vec<AuditEntry>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, unit_id, input_date, status, sub_status, updated_by, update_time, comment
        FROM audit_entries
        WHERE unit_id = $1
        ORDER BY update_time DESC, id DESC
        "#,
    )
    .bind(unit_id)
    .fetch_all(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load history of {}: {:?}", unit_id, e);
        AppError::Database(e)
    })
}
