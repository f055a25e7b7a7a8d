use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::equipment::dtos::{
    AuditEntryResponseDto, BatchUpdateItemDto, BatchUpdateResponseDto, CreateEquipmentDto,
    EquipmentResponseDto, StatusCountsDto, UpdateEquipmentDto,
};
use crate::features::equipment::services::{EquipmentService, StatusService};
use crate::shared::types::{ApiResponse, Meta};

/// List all equipment with its current status
#[utoipa::path(
    get,
    path = "/api/equipment",
    responses(
        (status = 200, description = "Equipment list", body = ApiResponse<Vec<EquipmentResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn list_equipment(
    State(service): State<Arc<EquipmentService>>,
) -> Result<Json<ApiResponse<Vec<EquipmentResponseDto>>>> {
    let units = service.list_all().await?;
    let total = units.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(units),
        None,
        Some(Meta { total }),
    )))
}

/// Get one unit with its current status
#[utoipa::path(
    get,
    path = "/api/equipment/{id}",
    params(("id" = String, Path, description = "Unit id")),
    responses(
        (status = 200, description = "Equipment found", body = ApiResponse<EquipmentResponseDto>),
        (status = 404, description = "Equipment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn get_equipment(
    State(service): State<Arc<EquipmentService>>,
    Path(unit_id): Path<String>,
) -> Result<Json<ApiResponse<EquipmentResponseDto>>> {
    let unit = service.get(&unit_id).await?;
    Ok(Json(ApiResponse::success(Some(unit), None, None)))
}

/// Register a unit with its initial status
#[utoipa::path(
    post,
    path = "/api/equipment",
    request_body = CreateEquipmentDto,
    responses(
        (status = 201, description = "Equipment created", body = ApiResponse<EquipmentResponseDto>),
        (status = 400, description = "Missing unit id"),
        (status = 409, description = "Unit id already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn create_equipment(
    State(service): State<Arc<EquipmentService>>,
    user: AuthenticatedUser,
    AppJson(dto): AppJson<CreateEquipmentDto>,
) -> Result<(StatusCode, Json<ApiResponse<EquipmentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let unit = service.create(dto, &user).await?;
    let message = format!("Equipment {} created", unit.unit_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(unit), Some(message), None)),
    ))
}

/// Update a unit and record a new status
#[utoipa::path(
    put,
    path = "/api/equipment/{id}",
    params(("id" = String, Path, description = "Unit id")),
    request_body = UpdateEquipmentDto,
    responses(
        (status = 200, description = "Equipment updated", body = ApiResponse<EquipmentResponseDto>),
        (status = 400, description = "start_time or status missing"),
        (status = 404, description = "Equipment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn update_equipment(
    State(service): State<Arc<EquipmentService>>,
    user: AuthenticatedUser,
    Path(unit_id): Path<String>,
    AppJson(dto): AppJson<UpdateEquipmentDto>,
) -> Result<Json<ApiResponse<EquipmentResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let unit = service.update(&unit_id, dto, &user).await?;
    Ok(Json(ApiResponse::success(
        Some(unit),
        Some("Equipment updated".to_string()),
        None,
    )))
}

/// Record status changes for several units at once
#[utoipa::path(
    put,
    path = "/api/equipment/batch",
    request_body = Vec<BatchUpdateItemDto>,
    responses(
        (status = 200, description = "Batch applied", body = ApiResponse<BatchUpdateResponseDto>),
        (status = 400, description = "Empty or malformed batch"),
        (status = 404, description = "A listed unit does not exist; nothing was applied")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn batch_update_equipment(
    State(service): State<Arc<EquipmentService>>,
    user: AuthenticatedUser,
    AppJson(items): AppJson<Vec<BatchUpdateItemDto>>,
) -> Result<Json<ApiResponse<BatchUpdateResponseDto>>> {
    let result = service.batch_update(items, &user).await?;
    let message = format!("Updated {} unit(s)", result.updated_count);
    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

/// Delete a unit and its history
#[utoipa::path(
    delete,
    path = "/api/equipment/{id}",
    params(("id" = String, Path, description = "Unit id")),
    responses(
        (status = 200, description = "Equipment deleted"),
        (status = 404, description = "Equipment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn delete_equipment(
    State(service): State<Arc<EquipmentService>>,
    user: AuthenticatedUser,
    Path(unit_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&unit_id, &user).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Equipment deleted".to_string()),
        None,
    )))
}

/// Audit history of a unit, newest first
#[utoipa::path(
    get,
    path = "/api/equipment/logs/{id}",
    params(("id" = String, Path, description = "Unit id")),
    responses(
        (status = 200, description = "History (empty for unknown units)", body = ApiResponse<Vec<AuditEntryResponseDto>>)
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn get_equipment_history(
    State(service): State<Arc<EquipmentService>>,
    Path(unit_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AuditEntryResponseDto>>>> {
    let entries = service.history(&unit_id).await?;
    let total = entries.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(entries),
        None,
        Some(Meta { total }),
    )))
}

/// Number of units per current status
///
/// The status to count mapping is wrapped in `counts` next to a `total`, unlike the flat object
/// returned by the legacy service.
#[utoipa::path(
    get,
    path = "/api/equipment/status_counts",
    responses(
        (status = 200, description = "Status distribution: `counts` maps status to units, `total` sums them", body = ApiResponse<StatusCountsDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "equipment"
)]
pub async fn get_status_counts(
    State(service): State<Arc<StatusService>>,
) -> Result<Json<ApiResponse<StatusCountsDto>>> {
    let counts = service.status_counts().await?;
    Ok(Json(ApiResponse::success(Some(counts), None, None)))
}
