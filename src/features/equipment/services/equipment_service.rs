use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use validator::Validate;

use crate::core::database;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::equipment::dtos::{
    AuditEntryResponseDto, BatchUpdateItemDto, BatchUpdateResponseDto, CreateEquipmentDto,
    EquipmentResponseDto, UpdateEquipmentDto,
};
use crate::features::equipment::models::{EquipmentState, NewAuditEntry};
use crate::features::equipment::services::audit_log;
use crate::shared::constants::RESERVED_UNIT_IDS;
use crate::shared::validation::non_blank;

const STATE_COLUMNS: &str = r#"
    SELECT u.unit_id, u.size, u.box_id, u.assigned_user, u.start_time, u.update_count,
           a.input_date, a.status, a.sub_status, a.comment, a.updated_by, a.update_time
    FROM equipment_units u
    LEFT JOIN audit_entries a ON a.id = u.current_entry_id
"#;

/// Repository over the current-state projection of equipment units
pub struct EquipmentService {
    pool: PgPool,
}

impl EquipmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every unit with its current status, ordered by unit id.
    ///
    /// Counters and current-entry pointers are recomputed from the audit log first, so drift
    /// introduced outside this service is repaired on the next listing.
    pub async fn list_all(&self) -> Result<Vec<EquipmentResponseDto>> {
        let mut uow = database::begin(&self.pool).await?;

        let healed = sqlx::query(
            r#"
            WITH truth AS (
                SELECT u.unit_id,
                       GREATEST(COUNT(a.id) - 1, 0)::INTEGER AS update_count,
                       (ARRAY_AGG(a.id ORDER BY a.update_time DESC, a.id DESC)
                            FILTER (WHERE a.id IS NOT NULL))[1] AS current_entry_id
                FROM equipment_units u
                LEFT JOIN audit_entries a ON a.unit_id = u.unit_id
                GROUP BY u.unit_id
            )
            UPDATE equipment_units e
            SET update_count = t.update_count,
                current_entry_id = t.current_entry_id
            FROM truth t
            WHERE e.unit_id = t.unit_id
              AND (e.update_count <> t.update_count
                   OR e.current_entry_id IS DISTINCT FROM t.current_entry_id)
            "#,
        )
        .execute(&mut *uow)
        .await
        .map_err(|e| {
            tracing::error!("Failed to recompute equipment counters: {:?}", e);
            AppError::Database(e)
        })?;

        if healed.rows_affected() > 0 {
            tracing::warn!(
                "Repaired counters of {} equipment unit(s)",
                healed.rows_affected()
            );
        }

        let units = sqlx::query_as::<_, EquipmentState>(&format!(
            "{} ORDER BY u.unit_id ASC",
            STATE_COLUMNS
        ))
        .fetch_all(&mut *uow)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list equipment: {:?}", e);
            AppError::Database(e)
        })?;

        database::commit(uow).await?;

        Ok(units.into_iter().map(EquipmentResponseDto::from).collect())
    }

    pub async fn get(&self, unit_id: &str) -> Result<EquipmentResponseDto> {
        let unit_id = unit_id.trim();
        fetch_state(&self.pool, unit_id)
            .await?
            .map(EquipmentResponseDto::from)
            .ok_or_else(|| not_found(unit_id))
    }

    /// Register a unit and record its initial status in one unit of work
    pub async fn create(
        &self,
        dto: CreateEquipmentDto,
        actor: &AuthenticatedUser,
    ) -> Result<EquipmentResponseDto> {
        let unit_id = non_blank(dto.unit_id.as_deref())
            .ok_or_else(|| AppError::InvalidInput("unit_id is required".to_string()))?;
        if RESERVED_UNIT_IDS.contains(&unit_id) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is reserved and cannot be used as a unit id",
                unit_id
            )));
        }

        let mut uow = database::begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO equipment_units
                (unit_id, size, box_id, assigned_user, start_time, update_count)
            VALUES ($1, $2, $3, $4, $5, 0)
            "#,
        )
        .bind(unit_id)
        .bind(&dto.size)
        .bind(&dto.box_id)
        .bind(&dto.assigned_user)
        .bind(dto.start_time)
        .execute(&mut *uow)
        .await
        .map_err(|e| {
            AppError::from_db_with_conflict(
                e,
                format!("Equipment '{}' already exists", unit_id),
            )
        })?;

        audit_log::append(
            &mut uow,
            &NewAuditEntry {
                unit_id,
                input_date: dto.start_time,
                status: dto.status.as_deref(),
                sub_status: dto.sub_status.as_deref(),
                updated_by: &actor.username,
                comment: dto.comment.as_deref(),
            },
        )
        .await?;

        let state = fetch_state(&mut *uow, unit_id)
            .await?
            .ok_or_else(|| not_found(unit_id))?;

        database::commit(uow).await?;

        tracing::info!("Equipment {} created by {}", unit_id, actor.username);
        Ok(state.into())
    }

    /// Overwrite a unit's attributes and record a new status.
    ///
    /// The unit row stays locked from the counter read until commit.
    pub async fn update(
        &self,
        unit_id: &str,
        dto: UpdateEquipmentDto,
        actor: &AuthenticatedUser,
    ) -> Result<EquipmentResponseDto> {
        let unit_id = unit_id.trim();
        let status = non_blank(dto.status.as_deref());
        let (Some(start_time), Some(status)) = (dto.start_time, status) else {
            return Err(AppError::InvalidInput(
                "start_time and status are required".to_string(),
            ));
        };

        let mut uow = database::begin(&self.pool).await?;

        let current = sqlx::query_scalar::<_, i32>(
            "SELECT update_count FROM equipment_units WHERE unit_id = $1 FOR UPDATE",
        )
        .bind(unit_id)
        .fetch_optional(&mut *uow)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lock equipment {}: {:?}", unit_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| not_found(unit_id))?;

        sqlx::query(
            r#"
            UPDATE equipment_units
            SET size = $1, box_id = $2, assigned_user = $3, start_time = $4, update_count = $5
            WHERE unit_id = $6
            "#,
        )
        .bind(&dto.size)
        .bind(&dto.box_id)
        .bind(&dto.assigned_user)
        .bind(start_time)
        .bind(current.max(0) + 1)
        .bind(unit_id)
        .execute(&mut *uow)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update equipment {}: {:?}", unit_id, e);
            AppError::Database(e)
        })?;

        audit_log::append(
            &mut uow,
            &NewAuditEntry {
                unit_id,
                input_date: Some(start_time),
                status: Some(status),
                sub_status: dto.sub_status.as_deref(),
                updated_by: &actor.username,
                comment: dto.comment.as_deref(),
            },
        )
        .await?;

        let state = fetch_state(&mut *uow, unit_id)
            .await?
            .ok_or_else(|| not_found(unit_id))?;

        database::commit(uow).await?;

        tracing::info!(
            "Equipment {} updated to '{}' by {}",
            unit_id,
            status,
            actor.username
        );
        Ok(state.into())
    }

    /// Record status changes for several units in one unit of work.
    ///
    /// Items without a unit id or without any change are skipped. An item naming an unknown
    /// unit fails the whole batch.
    pub async fn batch_update(
        &self,
        items: Vec<BatchUpdateItemDto>,
        actor: &AuthenticatedUser,
    ) -> Result<BatchUpdateResponseDto> {
        if items.is_empty() {
            return Err(AppError::InvalidInput(
                "Batch update requires a non-empty list".to_string(),
            ));
        }
        for item in &items {
            item.validate()
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        }

        let input_date = Utc::now();
        let mut updated_ids = Vec::with_capacity(items.len());
        let mut uow = database::begin(&self.pool).await?;

        for raw in &items {
            let Some(item) = raw.normalize() else {
                tracing::warn!("Skipping batch item without unit id or changes: {:?}", raw);
                continue;
            };

            let result = sqlx::query(
                r#"
                UPDATE equipment_units
                SET update_count = COALESCE(update_count, 0) + 1
                WHERE unit_id = $1
                "#,
            )
            .bind(&item.unit_id)
            .execute(&mut *uow)
            .await
            .map_err(|e| {
                tracing::error!("Failed to bump counter of {}: {:?}", item.unit_id, e);
                AppError::Database(e)
            })?;

            if result.rows_affected() == 0 {
                return Err(not_found(&item.unit_id));
            }

            audit_log::append(
                &mut uow,
                &NewAuditEntry {
                    unit_id: &item.unit_id,
                    input_date: Some(input_date),
                    status: item.status.as_deref(),
                    sub_status: item.sub_status.as_deref(),
                    updated_by: &actor.username,
                    comment: item.comment.as_deref(),
                },
            )
            .await?;

            updated_ids.push(item.unit_id);
        }

        database::commit(uow).await?;

        tracing::info!(
            "Batch update by {}: {} of {} item(s) applied",
            actor.username,
            updated_ids.len(),
            items.len()
        );

        Ok(BatchUpdateResponseDto {
            updated_count: updated_ids.len(),
            updated_ids,
        })
    }

    /// Delete a unit; its audit entries go with it
    pub async fn delete(&self, unit_id: &str, actor: &AuthenticatedUser) -> Result<()> {
        let unit_id = unit_id.trim();
        let result = sqlx::query("DELETE FROM equipment_units WHERE unit_id = $1")
            .bind(unit_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete equipment {}: {:?}", unit_id, e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(not_found(unit_id));
        }

        tracing::info!("Equipment {} deleted by {}", unit_id, actor.username);
        Ok(())
    }

    pub async fn history(&self, unit_id: &str) -> Result<Vec<AuditEntryResponseDto>> {
        let entries = audit_log::history_of(&self.pool, unit_id.trim()).await?;
        Ok(entries.into_iter().map(AuditEntryResponseDto::from).collect())
    }
}

async fn fetch_state<'e, E>(executor: E, unit_id: &str) -> Result<Option<EquipmentState>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, EquipmentState>(&format!("{} WHERE u.unit_id = $1", STATE_COLUMNS))
        .bind(unit_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load equipment {}: {:?}", unit_id, e);
            AppError::Database(e)
        })
}

fn not_found(unit_id: &str) -> AppError {
    AppError::NotFound(format!("Equipment '{}' not found", unit_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::equipment::services::StatusService;
    use crate::shared::test_helpers::{create_test_user, lazy_pool};
    use chrono::TimeZone;
    use fake::faker::name::en::FirstName;
    use fake::Fake;
    use tokio_test::assert_ok;

    fn create_dto(unit_id: &str, status: &str) -> CreateEquipmentDto {
        CreateEquipmentDto {
            unit_id: Some(unit_id.to_string()),
            size: Some("M".to_string()),
            box_id: Some("SHELF-A".to_string()),
            assigned_user: Some(FirstName().fake()),
            start_time: Some(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn update_dto(status: &str) -> UpdateEquipmentDto {
        UpdateEquipmentDto {
            size: Some("M".to_string()),
            start_time: Some(Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn batch_item(unit_id: Option<&str>, status: &str) -> BatchUpdateItemDto {
        BatchUpdateItemDto {
            unit_id: unit_id.map(String::from),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn find<'a>(units: &'a [EquipmentResponseDto], unit_id: &str) -> Option<&'a EquipmentResponseDto> {
        units.iter().find(|u| u.unit_id == unit_id)
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_create_then_list_shows_initial_state(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();

        assert_ok!(service.create(create_dto("BOX-2", "in-service"), &user).await);
        assert_ok!(service.create(create_dto("BOX-1", "spare"), &user).await);

        let units = service.list_all().await.unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["BOX-1", "BOX-2"]);

        let unit = find(&units, "BOX-2").unwrap();
        assert_eq!(unit.update_count, 0);
        assert_eq!(unit.status.as_deref(), Some("in-service"));
        assert_eq!(unit.updated_by.as_deref(), Some(user.username.as_str()));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_duplicate_create_is_conflict(pool: PgPool) {
        let service = EquipmentService::new(pool.clone());
        let user = create_test_user();

        service
            .create(create_dto("BOX-1", "in-service"), &user)
            .await
            .unwrap();
        let second = service.create(create_dto("BOX-1", "spare"), &user).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // The failed create must not leave a second entry behind
        assert_eq!(service.history("BOX-1").await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_n_updates_count_n_and_keep_n_plus_one_entries(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();
        service
            .create(create_dto("BOX-1", "status-0"), &user)
            .await
            .unwrap();

        let n = 4;
        for i in 1..=n {
            let updated = service
                .update("BOX-1", update_dto(&format!("status-{}", i)), &user)
                .await
                .unwrap();
            assert_eq!(updated.update_count, i);
        }

        let units = service.list_all().await.unwrap();
        assert_eq!(find(&units, "BOX-1").unwrap().update_count, n);

        let history = service.history("BOX-1").await.unwrap();
        let statuses: Vec<&str> = history.iter().filter_map(|e| e.status.as_deref()).collect();
        assert_eq!(
            statuses,
            vec!["status-4", "status-3", "status-2", "status-1", "status-0"]
        );
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_box_1_scenario(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();

        service
            .create(create_dto("BOX-1", "in-service"), &user)
            .await
            .unwrap();
        service
            .update("BOX-1", update_dto("in-repair"), &user)
            .await
            .unwrap();

        let units = service.list_all().await.unwrap();
        let unit = find(&units, "BOX-1").unwrap();
        assert_eq!(unit.update_count, 1);
        assert_eq!(unit.status.as_deref(), Some("in-repair"));

        let history = service.history("BOX-1").await.unwrap();
        let statuses: Vec<&str> = history.iter().filter_map(|e| e.status.as_deref()).collect();
        assert_eq!(statuses, vec!["in-repair", "in-service"]);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_update_of_unknown_unit_is_not_found(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let result = service
            .update("NOPE", update_dto("in-repair"), &create_test_user())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_batch_skips_items_without_unit_id(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();
        for id in ["BOX-1", "BOX-2"] {
            service.create(create_dto(id, "spare"), &user).await.unwrap();
        }

        let result = service
            .batch_update(
                vec![
                    batch_item(Some("BOX-1"), "in-service"),
                    batch_item(None, "in-service"),
                    batch_item(Some("BOX-2"), "lost"),
                ],
                &user,
            )
            .await
            .unwrap();

        assert_eq!(result.updated_count, 2);
        assert_eq!(result.updated_ids, vec!["BOX-1", "BOX-2"]);

        let units = service.list_all().await.unwrap();
        let box_2 = find(&units, "BOX-2").unwrap();
        assert_eq!(box_2.update_count, 1);
        assert_eq!(box_2.status.as_deref(), Some("lost"));
        assert_eq!(box_2.sub_status.as_deref(), Some("lost"));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_batch_with_unknown_unit_rolls_back(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();
        service
            .create(create_dto("BOX-1", "spare"), &user)
            .await
            .unwrap();

        let result = service
            .batch_update(
                vec![
                    batch_item(Some("BOX-1"), "in-service"),
                    batch_item(Some("GHOST"), "in-service"),
                ],
                &user,
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let unit = service.get("BOX-1").await.unwrap();
        assert_eq!(unit.update_count, 0);
        assert_eq!(unit.status.as_deref(), Some("spare"));
        assert_eq!(service.history("BOX-1").await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_delete_removes_unit_and_history(pool: PgPool) {
        let service = EquipmentService::new(pool);
        let user = create_test_user();
        service
            .create(create_dto("BOX-1", "spare"), &user)
            .await
            .unwrap();
        service
            .update("BOX-1", update_dto("retired"), &user)
            .await
            .unwrap();

        assert_ok!(service.delete("BOX-1", &user).await);

        assert!(service.history("BOX-1").await.unwrap().is_empty());
        assert!(find(&service.list_all().await.unwrap(), "BOX-1").is_none());
        assert!(matches!(
            service.delete("BOX-1", &user).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_status_counts_sum_to_units_with_entries(pool: PgPool) {
        let service = EquipmentService::new(pool.clone());
        let status = StatusService::new(pool.clone());
        let user = create_test_user();

        service
            .create(create_dto("BOX-1", "in-service"), &user)
            .await
            .unwrap();
        service
            .create(create_dto("BOX-2", "in-service"), &user)
            .await
            .unwrap();
        service
            .create(
                CreateEquipmentDto {
                    unit_id: Some("BOX-3".to_string()),
                    ..Default::default()
                },
                &user,
            )
            .await
            .unwrap();
        service
            .update("BOX-2", update_dto("in-repair"), &user)
            .await
            .unwrap();

        // A unit with no entries at all never contributes
        sqlx::query("INSERT INTO equipment_units (unit_id) VALUES ('BARE')")
            .execute(&pool)
            .await
            .unwrap();

        let counts = status.status_counts().await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.counts.get("in-service"), Some(&1));
        assert_eq!(counts.counts.get("in-repair"), Some(&1));
        assert_eq!(counts.counts.get("unknown"), Some(&1));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_list_all_repairs_drifted_counter(pool: PgPool) {
        let service = EquipmentService::new(pool.clone());
        let user = create_test_user();
        service
            .create(create_dto("BOX-1", "spare"), &user)
            .await
            .unwrap();
        service
            .update("BOX-1", update_dto("in-service"), &user)
            .await
            .unwrap();

        sqlx::query("UPDATE equipment_units SET update_count = 42 WHERE unit_id = 'BOX-1'")
            .execute(&pool)
            .await
            .unwrap();

        let units = service.list_all().await.unwrap();
        assert_eq!(find(&units, "BOX-1").unwrap().update_count, 1);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_audit_entries_reject_updates(pool: PgPool) {
        let service = EquipmentService::new(pool.clone());
        service
            .create(create_dto("BOX-1", "spare"), &create_test_user())
            .await
            .unwrap();

        let result = sqlx::query("UPDATE audit_entries SET status = 'tampered'")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_batch_with_overlong_status_is_invalid_input() {
        let service = EquipmentService::new(lazy_pool());
        let items = vec![
            batch_item(Some("BOX-1"), "in-service"),
            batch_item(Some("BOX-2"), &"x".repeat(51)),
        ];

        let result = service.batch_update(items, &create_test_user()).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_ids_shadowed_by_static_routes() {
        let service = EquipmentService::new(lazy_pool());
        for reserved in RESERVED_UNIT_IDS {
            let result = service
                .create(create_dto(reserved, "spare"), &create_test_user())
                .await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }
}
