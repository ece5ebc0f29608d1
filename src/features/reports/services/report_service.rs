use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{HeatmapDto, ReportQueryParams, ReportSubmission};
use crate::features::reports::models::{NewReport, Report, ReportStatus, StatusCounts};
use crate::features::reports::repositories::{ReportFilter, ReportRepository};
use crate::features::reports::services::heatmap;
use crate::modules::storage::{ImageStore, StoredImage};
use crate::shared::constants::REPORT_IMAGE_FOLDER;

/// Outcome of a resolution request. Both variants are successes.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The report moved from pending to resolved by this call
    Resolved(Report),
    /// The report was already resolved; nothing changed
    AlreadyResolved(Report),
}

/// Service for the report lifecycle: ingestion, queries and resolution
pub struct ReportService {
    repository: Arc<dyn ReportRepository>,
    image_store: Arc<dyn ImageStore>,
}

impl ReportService {
    pub fn new(repository: Arc<dyn ReportRepository>, image_store: Arc<dyn ImageStore>) -> Self {
        Self {
            repository,
            image_store,
        }
    }

    /// Persist a validated submission as a new pending report.
    ///
    /// The image (if any) is stored first. When the row insert fails the
    /// stored image is removed again, so either both exist or neither does.
    pub async fn submit(
        &self,
        submission: ReportSubmission,
        reporter: Option<&AuthenticatedUser>,
    ) -> Result<Report> {
        let stored = match &submission.image {
            Some(image) => {
                let path = format!(
                    "{}/{}.{}",
                    REPORT_IMAGE_FOLDER,
                    Uuid::new_v4(),
                    image.extension()
                );
                let stored = self
                    .image_store
                    .put(&path, image.data.clone(), &image.content_type)
                    .await
                    .map_err(|e| match e {
                        AppError::Storage(_) => e,
                        other => AppError::Storage(other.to_string()),
                    })?;
                tracing::debug!(
                    "Stored report image '{}' as {}",
                    image.file_name,
                    stored.key
                );
                Some(stored)
            }
            None => None,
        };

        let data = NewReport {
            user_id: reporter.map(|u| u.id),
            title: submission.title,
            description: submission.description,
            image_path: stored.as_ref().map(|s| s.url.clone()),
            latitude: submission.latitude,
            longitude: submission.longitude,
            severity: submission.severity,
        };

        match self.repository.insert(&data).await {
            Ok(report) => {
                tracing::info!(
                    "Created report {} at ({}, {}) severity={} anonymous={}",
                    report.id,
                    report.latitude,
                    report.longitude,
                    report.severity,
                    report.user_id.is_none()
                );
                Ok(report)
            }
            Err(e) => {
                if let Some(stored) = stored {
                    self.discard_image(&stored).await;
                }
                Err(e)
            }
        }
    }

    async fn discard_image(&self, stored: &StoredImage) {
        if let Err(e) = self.image_store.remove(&stored.key).await {
            tracing::warn!(
                "Failed to remove orphaned report image {}: {}",
                stored.key,
                e
            );
        }
    }

    /// Reports for map rendering and admin review, newest first.
    ///
    /// Rows whose stored coordinates are not finite or out of range are
    /// left out of the result.
    pub async fn list(&self, params: &ReportQueryParams) -> Result<Vec<Report>> {
        let filter = ReportFilter {
            status: params.status,
            window: params.pagination().window(),
        };
        let reports = self.repository.list(&filter).await?;
        Ok(keep_well_formed(reports))
    }

    /// Reports the given account submitted, newest first
    pub async fn list_mine(&self, user: &AuthenticatedUser) -> Result<Vec<Report>> {
        let reports = self.repository.list_by_user(user.id).await?;
        Ok(keep_well_formed(reports))
    }

    /// Mark a report as resolved. Resolving a resolved report is a no-op.
    pub async fn resolve(&self, id: i64, admin: &AuthenticatedUser) -> Result<Resolution> {
        if let Some(report) = self.repository.resolve_pending(id, admin.id).await? {
            tracing::info!("Report {} resolved by account {}", id, admin.id);
            return Ok(Resolution::Resolved(report));
        }

        match self.repository.find_by_id(id).await? {
            Some(report) if report.status == ReportStatus::Resolved => {
                tracing::debug!("Report {} was already resolved", id);
                Ok(Resolution::AlreadyResolved(report))
            }
            // The row went back to pending between the two statements; no
            // transition exists for that, so treat it as storage inconsistency.
            Some(report) => Err(AppError::Internal(format!(
                "Report {} is {} after resolution",
                id, report.status
            ))),
            None => Err(AppError::NotFound(format!("Report {} not found", id))),
        }
    }

    pub async fn stats(&self) -> Result<StatusCounts> {
        self.repository.count_by_status().await
    }

    /// Anonymized density grid over all (optionally status-filtered) reports
    pub async fn heatmap(&self, precision: u32, status: Option<ReportStatus>) -> Result<HeatmapDto> {
        let filter = ReportFilter {
            status,
            window: None,
        };
        let reports = keep_well_formed(self.repository.list(&filter).await?);
        Ok(heatmap::aggregate(&reports, precision))
    }
}

fn keep_well_formed(reports: Vec<Report>) -> Vec<Report> {
    reports
        .into_iter()
        .filter(|r| {
            let ok = r.has_valid_coordinates();
            if !ok {
                tracing::warn!(
                    "Excluding report {} with malformed coordinates ({}, {})",
                    r.id,
                    r.latitude,
                    r.longitude
                );
            }
            ok
        })
        .collect()
}
