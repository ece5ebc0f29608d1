use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Lifecycle state of a report. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// Reporter-assessed severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, Type,
    ToSchema,
)]
#[sqlx(type_name = "report_severity", rename_all = "lowercase")]
pub enum ReportSeverity {
    Low,
    #[default]
    Med,
    High,
}

impl ReportSeverity {
    /// Parse a form value, accepting any casing and the long "medium" spelling
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(ReportSeverity::Low),
            "med" | "medium" => Some(ReportSeverity::Med),
            "high" => Some(ReportSeverity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSeverity::Low => write!(f, "Low"),
            ReportSeverity::Med => write!(f, "Med"),
            ReportSeverity::High => write!(f, "High"),
        }
    }
}

/// Database model for report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Report {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: ReportSeverity,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<i64>,
}

impl Report {
    /// Coordinates are finite and inside WGS84 bounds
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Data for creating a new report. Status is always `pending` on insert.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: ReportSeverity,
}

/// Report totals per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: i64,
    pub resolved: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.resolved
    }
}
