use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers, models};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        reports_handlers::submit_report,
        reports_handlers::list_reports,
        reports_handlers::list_my_reports,
        reports_handlers::resolve_report,
        reports_handlers::get_stats,
        reports_handlers::get_heatmap,
    ),
    components(
        schemas(
            ApiResponse,
            models::ReportStatus,
            models::ReportSeverity,
            reports_dtos::SubmitReportDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportStatsDto,
            reports_dtos::HeatCellDto,
            reports_dtos::MapBoundsDto,
            reports_dtos::HeatmapDto,
        )
    ),
    tags(
        (name = "issues", description = "Hazard report ingestion, listing and resolution"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Nullify API",
        version = "0.1.0",
        description = "Citizen hazard reporting backend",
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

/// Overrides OpenAPI info from config
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
