use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::core::error::AppError;
use crate::features::reports::models::{Report, ReportSeverity, ReportStatus, StatusCounts};
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE};
use crate::shared::types::PaginationQuery;
use crate::shared::validation::parse_coordinate;

// =============================================================================
// INGESTION
// =============================================================================

/// Submit report form for OpenAPI documentation.
/// The handler reads the multipart body field by field.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitReportDto {
    #[schema(example = "Pothole")]
    pub title: String,
    #[schema(example = "Deep crack across the left lane")]
    pub description: Option<String>,
    #[schema(example = "12.9716")]
    pub latitude: String,
    #[schema(example = "77.5946")]
    pub longitude: String,
    /// Low, Med or High (default Med)
    #[schema(example = "High")]
    pub severity: Option<String>,
    /// JPG or PNG, at most 10MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<String>,
}

/// Image attached to a submission
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Extension used for the stored object
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            _ => "jpg",
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Image type '{}' is not allowed. Only JPG and PNG images are allowed",
                self.content_type
            )));
        }
        if self.data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::Validation(format!(
                "Image too large. Maximum size is {} MB",
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }
        Ok(())
    }
}

/// Form fields as they arrive, before any parsing
#[derive(Debug, Default)]
pub struct RawReportForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub severity: Option<String>,
    pub image: Option<ImageUpload>,
}

/// A fully parsed and validated submission
#[derive(Debug, Clone, Validate)]
pub struct ReportSubmission {
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,
    pub description: String,
    #[validate(custom(function = "validate_latitude"))]
    pub latitude: f64,
    #[validate(custom(function = "validate_longitude"))]
    pub longitude: f64,
    pub severity: ReportSeverity,
    pub image: Option<ImageUpload>,
}

impl TryFrom<RawReportForm> for ReportSubmission {
    type Error = AppError;

    fn try_from(form: RawReportForm) -> Result<Self, Self::Error> {
        let title = form.title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation(
                "Title and location (lat/lng) are required".to_string(),
            ));
        }

        let latitude = required_coordinate("latitude", form.latitude.as_deref())?;
        let longitude = required_coordinate("longitude", form.longitude.as_deref())?;

        let severity = match form.severity.as_deref().map(str::trim) {
            None | Some("") => ReportSeverity::default(),
            Some(raw) => ReportSeverity::parse(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid severity '{}'. Expected Low, Med or High",
                    raw
                ))
            })?,
        };

        if let Some(image) = &form.image {
            image.check()?;
        }

        let submission = Self {
            title,
            description: form.description.unwrap_or_default().trim().to_string(),
            latitude,
            longitude,
            severity,
            image: form.image,
        };

        submission
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(submission)
    }
}

fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("latitude_range")
            .with_message("latitude must be between -90 and 90".into()))
    }
}

fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("longitude_range")
            .with_message("longitude must be between -180 and 180".into()))
    }
}

fn required_coordinate(field: &str, raw: Option<&str>) -> Result<f64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Title and location (lat/lng) are required".to_string()))?;

    parse_coordinate(raw)
        .ok_or_else(|| AppError::Validation(format!("{} must be a number, got '{}'", field, raw)))
}

// =============================================================================
// QUERY
// =============================================================================

/// Report as served to map renderers and the admin list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: ReportSeverity,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            image_path: r.image_path,
            latitude: r.latitude,
            longitude: r.longitude,
            severity: r.severity,
            status: r.status,
            created_at: r.created_at,
            resolved_at: r.resolved_at,
        }
    }
}

/// Optional filters for the report list. No parameters returns every report.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQueryParams {
    /// Only reports in this status
    pub status: Option<ReportStatus>,
    /// Page number (1-indexed); enables pagination
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page (default 10, max 100); enables pagination
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

impl ReportQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Report counts per status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportStatsDto {
    pub total: i64,
    pub pending: i64,
    pub resolved: i64,
}

impl From<StatusCounts> for ReportStatsDto {
    fn from(c: StatusCounts) -> Self {
        Self {
            total: c.total(),
            pending: c.pending,
            resolved: c.resolved,
        }
    }
}

// =============================================================================
// HEATMAP
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HeatmapQueryParams {
    /// Grid precision in decimal places (0-4, default 2 = ~1.1km cells)
    #[param(minimum = 0, maximum = 4)]
    pub precision: Option<u32>,
    /// Only reports in this status
    pub status: Option<ReportStatus>,
}

/// One grid cell of the public heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeatCellDto {
    /// Cell centre
    pub latitude: f64,
    pub longitude: f64,
    pub count: i64,
    pub pending: i64,
    pub resolved: i64,
    pub max_severity: ReportSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MapBoundsDto {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Aggregated, anonymized report density
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HeatmapDto {
    pub precision: u32,
    pub cells: Vec<HeatCellDto>,
    pub bounds: Option<MapBoundsDto>,
}
