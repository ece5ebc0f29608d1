use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Envelope for state-changing endpoints and for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    /// Identifier of the created resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn created(id: i64) -> Self {
        Self {
            success: true,
            id: Some(id),
            message: None,
            error: None,
        }
    }

    pub fn success(message: Option<String>) -> Self {
        Self {
            success: true,
            id: None,
            message,
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Optional pagination for list endpoints.
/// When neither field is supplied the caller gets the full list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationQuery {
    /// Page number (1-indexed)
    pub page: Option<i64>,
    /// Number of items per page (default: 10, max: 100)
    pub page_size: Option<i64>,
}

impl PaginationQuery {
    pub fn is_requested(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }

    /// Calculate SQL OFFSET from page number, saturating for absurd pages
    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1).saturating_mul(self.limit())
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// `(limit, offset)` when pagination was requested
    pub fn window(&self) -> Option<(i64, i64)> {
        self.is_requested().then(|| (self.limit(), self.offset()))
    }
}
