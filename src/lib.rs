// Library exports for the server binary, the seed tool and tests
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use config::{Backend, Config};
use services::announcements::AnnouncementService;
use storage::{file::JsonFileStore, postgres::PgStore, AnnouncementStore};

/// Request body cap. Far above a maximal submission (5000 four-byte
/// characters, JSON-escaped), so oversize text is truncated, not refused.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub announcements: Arc<AnnouncementService>,
}

impl AppState {
    pub fn new(store: Arc<dyn AnnouncementStore>) -> Self {
        Self {
            announcements: Arc::new(AnnouncementService::new(store)),
        }
    }
}

/// Open the backend selected by `config`, migrating the database if asked to.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn AnnouncementStore>> {
    match config.backend {
        Backend::File => {
            let store = JsonFileStore::new(&config.data_file);
            store.ensure_file()?;
            info!(path = %config.data_file.display(), "Using JSON file storage");
            Ok(Arc::new(store))
        }
        Backend::Postgres => {
            let pool = db::create_pool(config).await?;
            if config.run_migrations {
                db::run_migrations(&pool).await?;
            }
            info!(
                min = config.pool_min,
                max = config.pool_max,
                "Database connected"
            );
            Ok(Arc::new(PgStore::new(pool, config.fetch_limit)))
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::announcements::index))
        .route("/add", post(routes::announcements::add_announcement))
        .route("/healthcheck", get(routes::health::healthcheck))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> (Router, JsonFileStore) {
        let store = JsonFileStore::new(dir.path().join("announcements.json"));
        (router(AppState::new(Arc::new(store.clone()))), store)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthcheck_ok() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let response = app
            .oneshot(Request::builder().uri("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_json_submission_returns_created_item() {
        let dir = TempDir::new().unwrap();
        let (app, store) = app(&dir);

        let response = app
            .oneshot(post_json(r#"{"title": " Lunch ", "text": "Pizza on Friday"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["item"]["title"], "Lunch");
        assert_eq!(body["item"]["text"], "Pizza on Friday");
        assert_eq!(store.read_all().unwrap()[0].id, body["item"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_form_submission_redirects_home() {
        let dir = TempDir::new().unwrap();
        let (app, store) = app(&dir);

        let response = app
            .oneshot(post_form("title=Fire+drill&text=Tuesday%2C+10%3A00"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let items = store.read_all().unwrap();
        assert_eq!(items[0].title, "Fire drill");
        assert_eq!(items[0].text, "Tuesday, 10:00");
    }

    #[tokio::test]
    async fn test_invalid_submissions_are_400() {
        let dir = TempDir::new().unwrap();
        let (app, store) = app(&dir);

        for request in [
            post_json(r#"{"title": "", "text": "x"}"#),
            post_json(r#"{"title": "x", "text": 5}"#),
            post_json("{not json"),
            post_form("title=+&text=+"),
        ] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(
                body,
                json!({ "ok": false, "error": "Both 'title' and 'text' are required." })
            );
        }
        assert!(store.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_not_rejected() {
        let dir = TempDir::new().unwrap();
        let (app, store) = app(&dir);

        let body = json!({ "title": "t", "text": "a".repeat(70_000) }).to_string();
        let response = app.clone().oneshot(post_json(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["item"]["text"].as_str().unwrap().chars().count(), 5000);

        // worst case for a form: multi-byte characters, percent-encoded
        let form = format!("title=t&text={}", "%F0%9F%93%A3".repeat(6000));
        let response = app.oneshot(post_form(&form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let items = store.read_all().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|a| a.text.chars().count() == 5000));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let dir = TempDir::new().unwrap();
        let (app, store) = app(&dir);

        let body = json!({ "title": "t", "text": "a".repeat(MAX_BODY_BYTES) }).to_string();
        let response = app.oneshot(post_json(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["ok"], false);
        assert_ne!(body["error"], "Both 'title' and 'text' are required.");
        assert!(store.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_lists_newest_first() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        for title in ["first", "second"] {
            let body = format!(r#"{{"title": "{title}", "text": "body"}}"#);
            let response = app.clone().oneshot(post_json(&body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("2 item(s)"));
        assert!(html.find(">second<").unwrap() < html.find(">first<").unwrap());
    }

    #[tokio::test]
    async fn test_metrics_are_exposed() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);
        let response = app.clone().oneshot(post_json(r#"{"title": "t", "text": "x"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("announcements_created_total"));
    }
}
