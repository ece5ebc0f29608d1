use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{NewReport, Report, ReportStatus, StatusCounts};

/// Selection applied when listing reports
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    /// `(limit, offset)`; `None` returns every matching row
    pub window: Option<(i64, i64)>,
}

/// Persistence for the `reports` table.
///
/// Every mutation touches exactly one row.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Insert a pending report and return it with its assigned id
    async fn insert(&self, data: &NewReport) -> Result<Report>;

    /// Reports matching `filter`, newest first
    async fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>>;

    /// Reports submitted by one account, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Report>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>>;

    /// Flip a pending report to resolved.
    ///
    /// Returns `None` when no *pending* report has this id, which covers both
    /// unknown ids and reports that are already resolved.
    async fn resolve_pending(&self, id: i64, resolved_by: i64) -> Result<Option<Report>>;

    async fn count_by_status(&self) -> Result<StatusCounts>;
}

/// PostgreSQL-backed report repository
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn insert(&self, data: &NewReport) -> Result<Report> {
        sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (user_id, title, description, image_path, latitude, longitude, severity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.image_path)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.severity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert report: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>> {
        let (limit, offset) = match filter.window {
            Some((limit, offset)) => (Some(limit), Some(offset)),
            None => (None, None),
        };

        // LIMIT NULL is LIMIT ALL and OFFSET NULL is OFFSET 0 in PostgreSQL
        sqlx::query_as::<_, Report>(
            r#"
            SELECT *
            FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT *
            FROM reports
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports of account {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch report {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn resolve_pending(&self, id: i64, resolved_by: i64) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET status = 'resolved', resolved_at = NOW(), resolved_by = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolved_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resolve report {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    async fn count_by_status(&self) -> Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (ReportStatus, i64)>(
            "SELECT status, COUNT(*) FROM reports GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count reports: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(rows
            .into_iter()
            .fold(StatusCounts::default(), |mut counts, (status, n)| {
                match status {
                    ReportStatus::Pending => counts.pending += n,
                    ReportStatus::Resolved => counts.resolved += n,
                }
                counts
            }))
    }
}
