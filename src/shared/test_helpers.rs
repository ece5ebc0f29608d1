//! In-memory stand-ins and token helpers shared by unit and router tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Claims};
use crate::features::reports::models::{
    NewReport, Report, ReportSeverity, ReportStatus, StatusCounts,
};
use crate::features::reports::repositories::{ReportFilter, ReportRepository};
use crate::modules::storage::{ImageStore, StoredImage};

pub const TEST_JWT_SECRET: &str = "test-secret-with-enough-entropy-for-hs256";

/// Mint an HS256 token valid for one hour
pub fn issue_token(id: i64, is_admin: bool) -> String {
    let claims = Claims {
        id,
        phone: Some(format!("+62812{:07}", id)),
        is_admin,
        exp: Utc::now().timestamp() as u64 + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("test token must encode")
}

pub fn admin_user(id: i64) -> AuthenticatedUser {
    AuthenticatedUser {
        id,
        phone: None,
        is_admin: true,
    }
}

pub fn citizen_user(id: i64) -> AuthenticatedUser {
    AuthenticatedUser {
        id,
        phone: None,
        is_admin: false,
    }
}

#[derive(Default)]
struct ReportTable {
    rows: Vec<Report>,
    last_id: i64,
}

/// Report repository backed by a vector
#[derive(Default)]
pub struct MemoryReportRepository {
    table: RwLock<ReportTable>,
    fail_inserts: bool,
}

impl MemoryReportRepository {
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Default::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Insert a row without any validation, as a legacy writer might have
    pub async fn insert_raw_coordinates(&self, title: &str, latitude: f64, longitude: f64) -> i64 {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.push(Report {
            id,
            user_id: None,
            title: title.to_string(),
            description: String::new(),
            image_path: None,
            latitude,
            longitude,
            severity: ReportSeverity::Med,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        });
        id
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn insert(&self, data: &NewReport) -> Result<Report> {
        if self.fail_inserts {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }

        let mut table = self.table.write().await;
        table.last_id += 1;
        let report = Report {
            id: table.last_id,
            user_id: data.user_id,
            title: data.title.clone(),
            description: data.description.clone(),
            image_path: data.image_path.clone(),
            latitude: data.latitude,
            longitude: data.longitude,
            severity: data.severity,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        table.rows.push(report.clone());
        Ok(report)
    }

    async fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>> {
        let table = self.table.read().await;
        let matching = table
            .rows
            .iter()
            .rev()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned();

        Ok(match filter.window {
            Some((limit, offset)) => matching
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect(),
            None => matching.collect(),
        })
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Report>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .rev()
            .filter(|r| r.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn resolve_pending(&self, id: i64, resolved_by: i64) -> Result<Option<Report>> {
        let mut table = self.table.write().await;
        let Some(report) = table
            .rows
            .iter_mut()
            .find(|r| r.id == id && r.status == ReportStatus::Pending)
        else {
            return Ok(None);
        };

        report.status = ReportStatus::Resolved;
        report.resolved_at = Some(Utc::now());
        report.resolved_by = Some(resolved_by);
        Ok(Some(report.clone()))
    }

    async fn count_by_status(&self) -> Result<StatusCounts> {
        let table = self.table.read().await;
        let pending = table
            .rows
            .iter()
            .filter(|r| r.status == ReportStatus::Pending)
            .count() as i64;
        Ok(StatusCounts {
            pending,
            resolved: table.rows.len() as i64 - pending,
        })
    }
}

/// Image store backed by a map of key to bytes
#[derive(Default)]
pub struct MemoryImageStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    fail: bool,
}

impl MemoryImageStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, path: &str, data: Vec<u8>, _content_type: &str) -> Result<StoredImage> {
        if self.fail {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }

        let key = format!("public/{}", path);
        self.objects.write().await.insert(key.clone(), data);
        Ok(StoredImage {
            url: format!("http://localhost:9000/nullify-uploads/{}", key),
            key,
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
