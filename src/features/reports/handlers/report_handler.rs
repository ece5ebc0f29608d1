use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppPath, AppQuery};
use crate::features::auth::{AuthenticatedUser, RequireAdmin};
use crate::features::reports::dtos::{
    HeatmapDto, HeatmapQueryParams, ImageUpload, RawReportForm, ReportQueryParams,
    ReportResponseDto, ReportStatsDto, ReportSubmission, SubmitReportDto,
};
use crate::features::reports::services::{ReportService, Resolution};
use crate::shared::constants::DEFAULT_HEATMAP_PRECISION;
use crate::shared::types::ApiResponse;

/// Submit a hazard report
///
/// Accepts multipart/form-data with `title`, `description`, `latitude`,
/// `longitude`, `severity` and an optional `image`. A bearer token is
/// optional; without one the report is anonymous.
#[utoipa::path(
    post,
    path = "/api/report-issue",
    tag = "issues",
    request_body(
        content = SubmitReportDto,
        content_type = "multipart/form-data",
        description = "Report form with optional JPG/PNG image",
    ),
    responses(
        (status = 200, description = "Report created", body = ApiResponse),
        (status = 400, description = "Missing or malformed field", body = ApiResponse),
        (status = 401, description = "Invalid bearer token", body = ApiResponse),
        (status = 500, description = "Image or row could not be stored", body = ApiResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn submit_report(
    user: Option<AuthenticatedUser>,
    State(service): State<Arc<ReportService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse>> {
    let mut form = RawReportForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read image bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read image data: {}", e))
                })?;

                // Browsers send an empty part when no file was picked
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            "title" | "description" | "latitude" | "longitude" | "severity" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read {} field: {}", field_name, e))
                })?;
                let slot = match field_name.as_str() {
                    "title" => &mut form.title,
                    "description" => &mut form.description,
                    "latitude" => &mut form.latitude,
                    "longitude" => &mut form.longitude,
                    _ => &mut form.severity,
                };
                *slot = Some(text);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let submission = ReportSubmission::try_from(form)?;
    let report = service.submit(submission, user.as_ref()).await?;

    Ok(Json(ApiResponse::created(report.id)))
}

/// List reports
///
/// Returns every report (newest first) unless filtered or paginated.
#[utoipa::path(
    get,
    path = "/api/issues",
    tag = "issues",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Reports", body = Vec<ReportResponseDto>),
        (status = 400, description = "Invalid query parameters", body = ApiResponse)
    )
)]
pub async fn list_reports(
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<ReportQueryParams>,
) -> Result<Json<Vec<ReportResponseDto>>> {
    let reports = service.list(&params).await?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// List the caller's own reports
///
/// Includes the same fields as the public list, newest first.
#[utoipa::path(
    get,
    path = "/api/issues/mine",
    tag = "issues",
    responses(
        (status = 200, description = "Reports submitted by the caller", body = Vec<ReportResponseDto>),
        (status = 401, description = "Authentication required", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
) -> Result<Json<Vec<ReportResponseDto>>> {
    let reports = service.list_mine(&user).await?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// Mark a report as resolved (admin only)
///
/// Resolving an already resolved report succeeds without changes.
#[utoipa::path(
    put,
    path = "/api/issues/{id}",
    tag = "issues",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report resolved", body = ApiResponse),
        (status = 400, description = "Invalid report id", body = ApiResponse),
        (status = 401, description = "Authentication required", body = ApiResponse),
        (status = 403, description = "Admin privileges required", body = ApiResponse),
        (status = 404, description = "Report not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn resolve_report(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ApiResponse>> {
    if let Resolution::AlreadyResolved(report) = service.resolve(id, &admin).await? {
        debug!(
            "Report {} already resolved at {:?} by {:?}",
            report.id, report.resolved_at, report.resolved_by
        );
    }
    Ok(Json(ApiResponse::success(Some(
        "Resolution confirmed".to_string(),
    ))))
}

/// Report counts per status
#[utoipa::path(
    get,
    path = "/api/issues/stats",
    tag = "issues",
    responses(
        (status = 200, description = "Report counts", body = ReportStatsDto)
    )
)]
pub async fn get_stats(State(service): State<Arc<ReportService>>) -> Result<Json<ReportStatsDto>> {
    Ok(Json(service.stats().await?.into()))
}

/// Anonymized report density for public maps
#[utoipa::path(
    get,
    path = "/api/issues/heatmap",
    tag = "issues",
    params(HeatmapQueryParams),
    responses(
        (status = 200, description = "Heatmap cells", body = HeatmapDto),
        (status = 400, description = "Invalid query parameters", body = ApiResponse)
    )
)]
pub async fn get_heatmap(
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<HeatmapQueryParams>,
) -> Result<Json<HeatmapDto>> {
    let precision = params.precision.unwrap_or(DEFAULT_HEATMAP_PRECISION);
    Ok(Json(service.heatmap(precision, params.status).await?))
}
