use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Create routes for the issue lifecycle
///
/// Submission, listing, stats and heatmap are public. "Mine" needs a
/// signed-in caller and resolution is gated by `RequireAdmin`.
pub fn routes(report_service: Arc<ReportService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/api/report-issue",
            post(handlers::submit_report).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/issues", get(handlers::list_reports))
        .route("/api/issues/mine", get(handlers::list_my_reports))
        .route("/api/issues/stats", get(handlers::get_stats))
        .route("/api/issues/heatmap", get(handlers::get_heatmap))
        .route("/api/issues/{id}", put(handlers::resolve_report))
        .with_state(report_service)
}
