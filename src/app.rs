use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::persistence::SharedBackend;
use crate::routes::{index_routes, system_routes};

/// Build the complete Axum application:
/// - /api/bananas  (banana index CRUD)
/// - /system       (alive + version + health)
/// - anything else is served from `cfg.static_dir` (index.html at /)
///
/// `store` is passed in explicitly; nothing here is global.
pub fn build_app(store: SharedBackend, cfg: AppConfig) -> Router {
    let static_files = ServeDir::new(&cfg.static_dir);

    Router::new()
        // /api/bananas/*
        .nest("/api/bananas", index_routes::routes(store.clone()))

        // /system/*
        .nest("/system", system_routes::routes(cfg, store))

        // Static page
        .fallback_service(static_files)

        .layer(CorsLayer::permissive())

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::persistence::{seed_if_empty, MemoryBackend};

    fn test_config(static_dir: &str) -> AppConfig {
        AppConfig::from_json(&format!(
            r#"{{"port": 0, "log_level": "info", "server_version": "9.9.9", "static_dir": {static_dir:?}}}"#
        ))
        .unwrap()
    }

    async fn seeded_app() -> Router {
        let backend = MemoryBackend::new();
        seed_if_empty(&backend).await.unwrap();
        build_app(Arc::new(backend), test_config("public"))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn list_returns_seeded_entries() {
        let app = seeded_app().await;

        let (status, body) = send(&app, "GET", "/api/bananas", None).await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0]["country"], "Ecuador");
        assert_eq!(entries[0]["pricePerKg"], 1.2);
        assert_eq!(entries[0]["lastUpdated"], "2024-01-15");
    }

    #[tokio::test]
    async fn post_japan_creates_entry_six() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/bananas",
            Some(r#"{"country":"Japan","pricePerKg":1.3,"averageRipeness":7.0}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 6);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["lastUpdated"], Utc::now().date_naive().to_string());

        let (status, fetched) = send(&app, "GET", "/api/bananas/6", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn post_missing_fields_is_400() {
        let app = seeded_app().await;

        let (status, body) = send(&app, "POST", "/api/bananas", Some(r#"{"country":"Japan"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Country, price per kg, and average ripeness are required"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_error_body() {
        let app = seeded_app().await;

        let (status, body) = send(&app, "POST", "/api/bananas", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "POST",
            "/api/bananas",
            Some(r#"{"country":42,"pricePerKg":1,"averageRipeness":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn put_merges_fields() {
        let app = seeded_app().await;

        let (status, body) = send(&app, "PUT", "/api/bananas/2", Some(r#"{"averageRipeness":"7.1"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["country"], "Philippines");
        assert_eq!(body["pricePerKg"], 0.85);
        assert_eq!(body["averageRipeness"], 7.1);
        assert_eq!(body["lastUpdated"], Utc::now().date_naive().to_string());
    }

    #[tokio::test]
    async fn unknown_ids_are_404() {
        let app = seeded_app().await;

        for (method, body) in [
            ("GET", None),
            ("PUT", Some("{}")),
            ("PUT", Some(r#"{"pricePerKg":"abc"}"#)),
            ("DELETE", None),
        ] {
            let (status, payload) = send(&app, method, "/api/bananas/999", body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
            assert_eq!(payload, json!({ "error": "Banana not found" }));
        }

        let (status, _) = send(&app, "GET", "/api/bananas/not-a-number", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_returns_entry_and_retires_id() {
        let app = seeded_app().await;

        let (status, removed) = send(&app, "DELETE", "/api/bananas/5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed["country"], "Brazil");

        let (status, _) = send(&app, "GET", "/api/bananas/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, created) = send(
            &app,
            "POST",
            "/api/bananas",
            Some(r#"{"country":"Colombia","pricePerKg":"1.05","averageRipeness":7}"#),
        )
        .await;
        assert_eq!(created["id"], 6);
    }

    #[tokio::test]
    async fn system_routes_report_version_and_health() {
        let app = seeded_app().await;

        let (status, body) = send(&app, "GET", "/system/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "9.9.9");

        let (status, body) = send(&app, "GET", "/system/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "in-memory list");
    }

    #[tokio::test]
    async fn root_serves_index_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Banana Index</h1>").unwrap();
        let app = build_app(
            Arc::new(MemoryBackend::new()),
            test_config(dir.path().to_str().unwrap()),
        );

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Banana Index</h1>");
    }
}
