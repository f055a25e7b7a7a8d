use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::equipment::{dtos as equipment_dtos, handlers as equipment_handlers};
use crate::features::issue_reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::verify_username,
        auth::handlers::forgot_password,
        auth::handlers::reset_password_no_auth,
        auth::handlers::reset_password,
        auth::handlers::get_me,
        // Equipment
        equipment_handlers::list_equipment,
        equipment_handlers::get_equipment,
        equipment_handlers::create_equipment,
        equipment_handlers::update_equipment,
        equipment_handlers::batch_update_equipment,
        equipment_handlers::delete_equipment,
        equipment_handlers::get_equipment_history,
        equipment_handlers::get_status_counts,
        // Reports
        reports_handlers::upload_report,
        reports_handlers::list_reports,
        reports_handlers::process_report,
        reports_handlers::delete_report,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::UsernameRequestDto,
            auth::dtos::ResetPasswordNoAuthDto,
            auth::dtos::ResetPasswordDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::MeResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::MeResponseDto>,
            // Equipment
            equipment_dtos::CreateEquipmentDto,
            equipment_dtos::UpdateEquipmentDto,
            equipment_dtos::BatchUpdateItemDto,
            equipment_dtos::EquipmentResponseDto,
            equipment_dtos::AuditEntryResponseDto,
            equipment_dtos::BatchUpdateResponseDto,
            equipment_dtos::StatusCountsDto,
            ApiResponse<Vec<equipment_dtos::EquipmentResponseDto>>,
            ApiResponse<equipment_dtos::EquipmentResponseDto>,
            ApiResponse<Vec<equipment_dtos::AuditEntryResponseDto>>,
            ApiResponse<equipment_dtos::BatchUpdateResponseDto>,
            ApiResponse<equipment_dtos::StatusCountsDto>,
            // Reports
            reports_dtos::SubmitReportForm,
            reports_dtos::ProcessReportDto,
            reports_dtos::IssueReportResponseDto,
            ApiResponse<Vec<reports_dtos::IssueReportResponseDto>>,
            ApiResponse<reports_dtos::IssueReportResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and password management"),
        (name = "equipment", description = "Equipment units, audit history and status counts"),
        (name = "reports", description = "Issue reports with photo attachments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "CC Tracker API",
        version = "0.1.0",
        description = "Equipment tracking, audit log and issue reports",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Overrides the document info with values from `SwaggerConfig`
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/equipment",
            "/api/equipment/{id}",
            "/api/equipment/batch",
            "/api/equipment/status_counts",
            "/api/equipment/logs/{id}",
            "/api/report/upload",
            "/api/reports",
            "/api/report/{id}",
            "/api/auth/login",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_status_counts_schema_documents_wrapped_shape() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let properties = &doc["components"]["schemas"]["StatusCountsDto"]["properties"];

        assert!(properties["counts"].is_object());
        assert!(properties["total"].is_object());
    }
}
