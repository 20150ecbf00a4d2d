use crate::api::views::{self, AppState};
use crate::dashboard;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let view_routes = Router::new()
        .route("/view", get(views::get_view))
        .route("/view/fragment", post(views::restore_fragment))
        .route("/view/site", post(views::select_site))
        .route("/view/period", post(views::select_period))
        .route("/view/page", post(views::show_page))
        // Selection payloads are a few short strings
        .layer(DefaultBodyLimit::max(4096));

    let api_routes = Router::new()
        .route("/sites", get(views::get_sites))
        .merge(view_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api", api_routes)
        .route("/", get(dashboard::serve_index))
        .route("/{*path}", get(dashboard::serve_asset))
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(30),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject OWASP-recommended security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // Content-Security-Policy only on HTML responses (avoids breaking JSON APIs)
    let is_html = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"));
    if is_html {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'self'; script-src 'self'; style-src 'self'"),
        );
    }
    response
}

/// GET /health: Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// GET /health/detailed: Health check with the current selection.
async fn detailed_health_check(
    State(state): State<Arc<AppState>>,
) -> axum::Json<serde_json::Value> {
    let status = state.status();

    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "data_dir": state.data_dir.display().to_string(),
        "site": status.site,
        "period": status.period,
        "page": status.page,
        "cache_entries": state.cache.len(),
        "dataset_loads": state.load_stats.loads(),
        "dataset_load_failures": state.load_stats.failures(),
    }))
}

/// GET /metrics: Prometheus-compatible metrics endpoint.
async fn prometheus_metrics(
    State(state): State<Arc<AppState>>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    use std::fmt::Write;

    let cache_entries = state.cache.len();
    let loads = state.load_stats.loads();
    let failures = state.load_stats.failures();
    let site_selected = u8::from(state.status().site.is_some());

    let mut out = String::with_capacity(1024);
    let _ = writeln!(
        out,
        "# HELP statview_cache_entries Number of cached site datasets"
    );
    let _ = writeln!(out, "# TYPE statview_cache_entries gauge");
    let _ = writeln!(out, "statview_cache_entries {cache_entries}");
    let _ = writeln!(
        out,
        "# HELP statview_data_loads_total Data files read from disk since startup"
    );
    let _ = writeln!(out, "# TYPE statview_data_loads_total counter");
    let _ = writeln!(out, "statview_data_loads_total {loads}");
    let _ = writeln!(
        out,
        "# HELP statview_data_load_failures_total Data files that could not be loaded"
    );
    let _ = writeln!(out, "# TYPE statview_data_load_failures_total counter");
    let _ = writeln!(out, "statview_data_load_failures_total {failures}");
    let _ = writeln!(
        out,
        "# HELP statview_site_selected Whether a site is currently selected"
    );
    let _ = writeln!(out, "# TYPE statview_site_selected gauge");
    let _ = writeln!(out, "statview_site_selected {site_selected}");

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache::DatasetCache;
    use crate::storage::loader::FsDataSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn make_test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sites.json"), r#"["example.com"]"#).unwrap();
        std::fs::write(
            dir.path().join("example.com.json"),
            serde_json::json!({
                "url": "http://example.com",
                "periods": ["201202", "201201"],
                "overview": {
                    "20120101": {"hits": 4, "pages": 2, "bandwidth": 1024},
                    "20120201": {"hits": 6, "pages": 3, "bandwidth": 2048}
                },
                "top10": {"201201": [{"url": "/", "pages": 2, "bandwidth": 1024}]}
            })
            .to_string(),
        )
        .unwrap();
        let source = FsDataSource::new(dir.path(), DatasetCache::new(0));
        (Arc::new(AppState::new(source)), dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, payload: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_prometheus_metrics() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("text/plain"));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("statview_cache_entries 0"));
        assert!(text.contains("statview_data_loads_total 0"));
        assert!(text.contains("statview_site_selected 0"));
    }

    #[tokio::test]
    async fn test_detailed_health_check() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/detailed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json.get("version").is_some());
        assert!(json["site"].is_null());
        assert_eq!(json["dataset_loads"], 0);
    }

    #[tokio::test]
    async fn test_view_before_selection_is_not_found() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/view").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No site is selected");
    }

    #[tokio::test]
    async fn test_restore_fragment() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/api/view/fragment",
                &serde_json::json!({"fragment": "site=example.com&period=201201&page=top10"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["site"], "example.com");
        assert_eq!(json["period"], "201201");
        assert_eq!(json["period_label"], "January 2012");
        assert_eq!(json["mode"], "month");
        assert_eq!(json["page"], "top10");
        assert_eq!(json["header_visible"], true);
        assert_eq!(json["fragment"], "site=example.com&period=201201&page=top10");
        assert_eq!(json["reports"]["top10"]["pages"][0]["bandwidth"], "1 Kb");
        assert_eq!(json["reports"]["overview"]["table"][0]["bandwidth"], "1 Kb");
        assert_eq!(json["reports"]["overview"]["ticks"].as_array().unwrap().len(), 31);
    }

    #[tokio::test]
    async fn test_select_unknown_site_reports_url() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/api/view/site",
                &serde_json::json!({"site": "missing.org"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.starts_with("Could not load \"data/missing.org.json\""));
    }

    #[tokio::test]
    async fn test_unknown_page_is_bad_request() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/api/view/page",
                &serde_json::json!({"page": "visitors"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_before_selection_is_not_kept() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/view/page",
                &serde_json::json!({"page": "top10"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(post_json(
                "/api/view/site",
                &serde_json::json!({"site": "example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["page"].is_null());
        assert_eq!(json["fragment"], "site=example.com&period=201202&page");
    }

    #[tokio::test]
    async fn test_detailed_health_reports_selection() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        app.clone()
            .oneshot(post_json(
                "/api/view/fragment",
                &serde_json::json!({"fragment": "site=example.com&page=top10"}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/detailed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["site"], "example.com");
        assert_eq!(json["period"], "201202");
        assert_eq!(json["page"], "top10");
    }

    #[tokio::test]
    async fn test_health_and_metrics_do_not_wait_for_viewer() {
        let (state, _dir) = make_test_state();
        let app = build_router(Arc::clone(&state));

        // Another thread keeps the viewer busy, as a slow dataset load would
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                let _viewer = state.viewer.lock();
                locked_tx.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(1500));
            })
        };
        locked_rx.recv().unwrap();

        let started = std::time::Instant::now();
        for uri in ["/health", "/health/detailed", "/metrics"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
        assert!(
            started.elapsed() < std::time::Duration::from_millis(1000),
            "status endpoints waited {:?}",
            started.elapsed()
        );

        holder.join().unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_index() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("content-security-policy"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (state, _dir) = make_test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent.file")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
