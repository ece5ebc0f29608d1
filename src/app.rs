use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::core::middleware;
use crate::features::auth::JwtValidator;
use crate::features::reports::{self, ReportService};

async fn health_check() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}

/// API routes with optional bearer authentication applied.
///
/// Tokens are validated for every matched route; whether a caller must be
/// authenticated is decided per handler.
pub fn api_routes(
    report_service: Arc<ReportService>,
    jwt_validator: Arc<JwtValidator>,
    max_body_size: usize,
) -> Router {
    Router::new()
        .merge(reports::routes(report_service, max_body_size))
        .route_layer(from_fn_with_state(jwt_validator, middleware::auth_middleware))
        .route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::ReportStatus;
    use crate::features::reports::repositories::ReportRepository;
    use crate::shared::test_helpers::{
        issue_token, MemoryImageStore, MemoryReportRepository, TEST_JWT_SECRET,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "nullify-test-boundary";

    fn app(repo: Arc<MemoryReportRepository>, store: Arc<MemoryImageStore>) -> Router {
        let service = Arc::new(ReportService::new(repo, store));
        let validator = Arc::new(JwtValidator::new(TEST_JWT_SECRET, Duration::from_secs(0)));
        api_routes(service, validator, 11 * 1024 * 1024)
    }

    fn default_app() -> (Router, Arc<MemoryReportRepository>) {
        let repo = Arc::new(MemoryReportRepository::default());
        (app(repo.clone(), Arc::new(MemoryImageStore::default())), repo)
    }

    fn multipart(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn submit_request(body: Vec<u8>, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/report-issue")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn resolve_request(id: &str, authorization: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("PUT")
            .uri(format!("/api/issues/{id}"));
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_bearer() -> Option<String> {
        Some(format!("Bearer {}", issue_token(1, true)))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn pothole() -> Vec<u8> {
        multipart(
            &[
                ("title", "Pothole"),
                ("description", "Deep crack"),
                ("latitude", "12.9716"),
                ("longitude", "77.5946"),
                ("severity", "High"),
            ],
            None,
        )
    }

    #[tokio::test]
    async fn test_report_lifecycle() {
        let (app, _) = default_app();

        let (status, body) = send(&app, submit_request(pothole(), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["id"], 1);

        let (status, body) = send(&app, get("/api/issues")).await;
        assert_eq!(status, StatusCode::OK);
        let issues = body.as_array().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0]["title"], "Pothole");
        assert_eq!(issues[0]["description"], "Deep crack");
        assert_eq!(issues[0]["severity"], "High");
        assert_eq!(issues[0]["status"], "pending");
        assert_eq!(issues[0]["latitude"], 12.9716);
        assert!(issues[0].get("user_id").is_none());

        let (status, body) = send(&app, resolve_request("1", admin_bearer())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Resolution confirmed");

        let (_, body) = send(&app, get("/api/issues")).await;
        assert_eq!(body[0]["status"], "resolved");
        assert!(!body[0]["resolved_at"].is_null());
    }

    #[tokio::test]
    async fn test_image_upload_is_recorded() {
        let store = Arc::new(MemoryImageStore::default());
        let app = app(Arc::new(MemoryReportRepository::default()), store.clone());
        let body = multipart(
            &[("title", "Flood"), ("latitude", "-6.2"), ("longitude", "106.8")],
            Some(("flood.png", "image/png", &[0x89, 0x50, 0x4E, 0x47])),
        );

        let (status, _) = send(&app, submit_request(body, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.len().await, 1);

        let (_, body) = send(&app, get("/api/issues")).await;
        let path = body[0]["image_path"].as_str().unwrap();
        assert!(path.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_token_links_reporter() {
        let (app, repo) = default_app();
        let token = issue_token(77, false);

        let (status, body) = send(&app, submit_request(pothole(), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        let id = body["id"].as_i64().unwrap();
        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, Some(77));
    }

    #[tokio::test]
    async fn test_empty_title_is_rejected() {
        let (app, repo) = default_app();
        let body = multipart(
            &[("title", ""), ("latitude", "12.9716"), ("longitude", "77.5946")],
            None,
        );

        let (status, body) = send(&app, submit_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_non_numeric_latitude_is_rejected() {
        let (app, repo) = default_app();
        let body = multipart(
            &[("title", "Pothole"), ("latitude", "abc"), ("longitude", "77.5946")],
            None,
        );

        let (status, body) = send(&app, submit_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("latitude"));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_disallowed_image_type_is_rejected() {
        let (app, repo) = default_app();
        let body = multipart(
            &[("title", "Pothole"), ("latitude", "1"), ("longitude", "1")],
            Some(("anim.gif", "image/gif", b"GIF89a")),
        );

        let (status, _) = send(&app, submit_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_creates_nothing() {
        let repo = Arc::new(MemoryReportRepository::default());
        let app = app(repo.clone(), Arc::new(MemoryImageStore::failing()));
        let body = multipart(
            &[("title", "Pothole"), ("latitude", "1"), ("longitude", "1")],
            Some(("hole.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF])),
        );

        let (status, body) = send(&app, submit_request(body, None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_twice_succeeds() {
        let (app, repo) = default_app();
        send(&app, submit_request(pothole(), None)).await;

        let (first, _) = send(&app, resolve_request("1", admin_bearer())).await;
        let (second, body) = send(&app, resolve_request("1", admin_bearer())).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(body["success"], true);

        let report = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolve_unknown_or_malformed_id() {
        let (app, _) = default_app();

        let (status, body) = send(&app, resolve_request("999999", admin_bearer())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, resolve_request("abc", admin_bearer())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_requires_admin() {
        let (app, repo) = default_app();
        send(&app, submit_request(pothole(), None)).await;

        let (status, _) = send(&app, resolve_request("1", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let citizen = Some(format!("Bearer {}", issue_token(2, false)));
        let (status, _) = send(&app, resolve_request("1", citizen)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let forged = Some("Bearer not.a.token".to_string());
        let (status, _) = send(&app, resolve_request("1", forged)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let report = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_status_filter_and_stats() {
        let (app, _) = default_app();
        for _ in 0..3 {
            send(&app, submit_request(pothole(), None)).await;
        }
        send(&app, resolve_request("2", admin_bearer())).await;

        let (_, body) = send(&app, get("/api/issues?status=pending")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, get("/api/issues?status=closed")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, get("/api/issues/stats")).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["pending"], 2);
        assert_eq!(body["resolved"], 1);
    }

    #[tokio::test]
    async fn test_heatmap_is_anonymized() {
        let (app, _) = default_app();
        let token = issue_token(5, false);
        send(&app, submit_request(pothole(), Some(&token))).await;
        send(&app, submit_request(pothole(), None)).await;

        let (status, body) = send(&app, get("/api/issues/heatmap?precision=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["precision"], 2);

        let cells = body["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0]["count"], 2);
        assert_eq!(cells[0]["max_severity"], "High");

        let raw = body.to_string();
        assert!(!raw.contains("Pothole"));
        assert!(!raw.contains("user_id"));
    }

    fn authed_get(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_my_reports() {
        let (app, _) = default_app();
        let mine = issue_token(31, false);
        let other = issue_token(32, false);
        send(&app, submit_request(pothole(), Some(&mine))).await;
        send(&app, submit_request(pothole(), Some(&other))).await;
        send(&app, submit_request(pothole(), None)).await;
        send(&app, submit_request(pothole(), Some(&mine))).await;

        let (status, body) = send(&app, authed_get("/api/issues/mine", &mine)).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![4, 1]);
        assert!(body[0].get("user_id").is_none());

        let (status, body) = send(&app, get("/api/issues/mine")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_pagination_boundaries() {
        let (app, _) = default_app();
        for _ in 0..3 {
            send(&app, submit_request(pothole(), None)).await;
        }

        let (status, body) = send(&app, get("/api/issues?page=9223372036854775807")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, body) = send(
            &app,
            get("/api/issues?page=9223372036854775807&page_size=100"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, body) = send(&app, get("/api/issues?page=-3&page_size=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], 3);

        let (status, body) = send(&app, get("/api/issues?page_size=0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, get("/api/issues?page=9223372036854775808")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get("/api/issues?page=two")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_heatmap_precision_boundaries() {
        let (app, _) = default_app();
        send(&app, submit_request(pothole(), None)).await;

        let (status, body) = send(&app, get("/api/issues/heatmap?precision=9")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["precision"], 4);
        assert_eq!(body["cells"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, get("/api/issues/heatmap")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["precision"], 2);

        let (status, _) = send(&app, get("/api/issues/heatmap?precision=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, get("/api/issues/heatmap?status=resolved")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["cells"].as_array().unwrap().is_empty());
        assert!(body["bounds"].is_null());
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = default_app();
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
