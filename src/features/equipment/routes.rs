use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::features::equipment::handlers;
use crate::features::equipment::services::{EquipmentService, StatusService};

/// Equipment routes; all of them expect an authenticated user
pub fn routes(equipment: Arc<EquipmentService>, status: Arc<StatusService>) -> Router {
    let status_routes = Router::new()
        .route(
            "/api/equipment/status_counts",
            get(handlers::get_status_counts),
        )
        .with_state(status);

    Router::new()
        .route(
            "/api/equipment",
            get(handlers::list_equipment).post(handlers::create_equipment),
        )
        .route("/api/equipment/batch", put(handlers::batch_update_equipment))
        .route(
            "/api/equipment/logs/{id}",
            get(handlers::get_equipment_history),
        )
        .route(
            "/api/equipment/{id}",
            get(handlers::get_equipment)
                .put(handlers::update_equipment)
                .delete(handlers::delete_equipment),
        )
        .with_state(equipment)
        .merge(status_routes)
}
